//! # grid-market
//!
//! Settlement core for the GRID compute marketplace.
//!
//! This crate provides:
//!
//! - Task records and their lifecycle state machine
//! - Pricing policy (submission, payout, and platform rates)
//! - The settlement engine orchestrating submit → claim → complete → pay
//! - Read-only reporting (histories, leaderboard, platform totals)
//!
//! The engine holds payment in escrow from the moment a client submits a
//! task until the task settles, then atomically splits the escrowed cost
//! between the contributor and the platform fee pool. Aborted tasks refund
//! the client in full.
//!
//! ## Example
//!
//! ```rust,no_run
//! use grid_market::{SettlementEngine, SizeGb};
//! use grid_token::{AccountRole, Amount};
//!
//! # async fn example() -> Result<(), grid_market::MarketError> {
//! let engine = SettlementEngine::new();
//!
//! let client = engine
//!     .create_account(AccountRole::Client, Amount::tokens(70))
//!     .await?;
//! let contributor = engine
//!     .create_account(AccountRole::Contributor, Amount::tokens(50))
//!     .await?;
//!
//! let task = engine
//!     .submit_task(&client, SizeGb::try_gb(5.0)?, "AI model training file")
//!     .await?;
//! engine.claim_task(&contributor, &task.id).await?;
//! // ... the caller processes the task outside the engine ...
//! let settlement = engine.complete_task(&task.id).await?;
//! println!("earned {}", settlement.earning);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod pricing;
pub mod reporting;
pub mod task;

pub use engine::{Settlement, SettlementEngine};
pub use error::MarketError;
pub use pricing::PricingPolicy;
pub use reporting::{AccountHistory, LeaderboardRow, PlatformStats};
pub use task::{SizeGb, Task, TaskId, TaskStatus, TaskStore};
