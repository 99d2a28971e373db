//! # grid-token
//!
//! GRID token accounting for the decentralized compute marketplace.
//!
//! This crate provides the money layer that the settlement engine builds on:
//!
//! - [`Amount`] — fixed-point token amounts (integer base units, no floats
//!   in settlement math)
//! - [`AccountRegistry`] — participant accounts with roles and balances
//! - [`Ledger`] — append-only record of every balance-affecting event
//! - [`Vault`] — escrowed funds held against specific tasks
//!
//! ## Token Details
//!
//! - **Name**: GRID
//! - **Decimals**: 9 (1 GRID = `1_000_000_000` grains)
//! - **Use**: Payment for compute tasks on the grid marketplace
//!
//! ## Invariants
//!
//! The types here are designed so that fund conservation is checkable at any
//! point: every account balance equals its initial balance plus the sum of
//! its ledger deltas, no balance ever goes negative, and the vault's running
//! total always equals the sum of its live holds.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod amount;
pub mod error;
pub mod ledger;
pub mod vault;

pub use account::{Account, AccountId, AccountRegistry, AccountRole};
pub use amount::Amount;
pub use error::{Result, TokenError};
pub use ledger::{EntryDirection, EntryKind, Ledger, LedgerEntry};
pub use vault::{EscrowHold, Vault};

/// GRID token decimals.
pub const GRID_DECIMALS: u8 = 9;

/// One GRID in base units (grains).
pub const GRAINS_PER_GRID: u64 = 1_000_000_000;
