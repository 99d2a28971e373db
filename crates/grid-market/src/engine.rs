//! The settlement engine.
//!
//! Orchestrates submit → claim → complete → pay across the task store, the
//! escrow vault, the account registry, and the ledger. The engine is the
//! sole owner of that state; callers only ever hold snapshots.
//!
//! Every operation runs as a single transaction: the whole body executes
//! inside one acquisition of the state lock, so concurrent callers observe
//! either all of an operation's effects or none of them. Processing work
//! happens outside the engine, between `claim_task` and `complete_task` —
//! nothing external is awaited while the lock is held.

use crate::error::MarketError;
use crate::pricing::PricingPolicy;
use crate::reporting::{self, AccountHistory, LeaderboardRow, PlatformStats};
use crate::task::{SizeGb, Task, TaskId, TaskStatus, TaskStore};
use grid_token::{
    AccountId, AccountRegistry, AccountRole, Amount, EntryDirection, EntryKind, Ledger,
    LedgerEntry, Vault,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// The outcome of settling one completed task.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Settlement {
    /// The settled task.
    pub task: TaskId,
    /// Amount paid to the contributor.
    pub earning: Amount,
    /// Amount paid to the platform fee pool.
    pub fee: Amount,
}

/// Authoritative in-memory state, mutated only under the engine's lock.
#[derive(Debug)]
struct CoreState {
    registry: AccountRegistry,
    ledger: Ledger,
    vault: Vault,
    tasks: TaskStore,
}

/// The marketplace settlement engine.
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    state: Arc<Mutex<CoreState>>,
    pricing: PricingPolicy,
    platform: AccountId,
}

impl SettlementEngine {
    /// Create an engine with the default 10/9/1 pricing policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pricing(PricingPolicy::default())
    }

    /// Create an engine with a custom pricing policy.
    #[must_use]
    pub fn with_pricing(pricing: PricingPolicy) -> Self {
        let mut registry = AccountRegistry::new();
        let platform = registry.create(AccountRole::Platform, Amount::ZERO);
        Self {
            state: Arc::new(Mutex::new(CoreState {
                registry,
                ledger: Ledger::new(),
                vault: Vault::new(),
                tasks: TaskStore::new(),
            })),
            pricing,
            platform,
        }
    }

    /// The pricing policy this engine settles with.
    #[must_use]
    pub const fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// The platform fee pool account.
    #[must_use]
    pub const fn platform_account(&self) -> &AccountId {
        &self.platform
    }

    /// Register a new client or contributor account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidInput`] for the reserved platform role.
    pub async fn create_account(
        &self,
        role: AccountRole,
        initial_balance: Amount,
    ) -> Result<AccountId, MarketError> {
        if role == AccountRole::Platform {
            return Err(MarketError::invalid_input(
                "the platform role is reserved for the engine's fee pool",
            ));
        }
        let mut state = self.state.lock().await;
        let id = state.registry.create(role, initial_balance);
        info!(account = %id, %role, balance = %initial_balance, "account registered");
        Ok(id)
    }

    /// Submit a task, holding its full cost in escrow.
    ///
    /// The debit, the escrow hold, and the task creation are one atomic
    /// unit: on `InsufficientFunds` no task exists and no balance changed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidInput`] for a non-positive size, a
    /// non-client submitter, or a cost the vault total cannot absorb,
    /// [`MarketError::InsufficientFunds`] if the client cannot cover the
    /// cost, or [`MarketError::NoSuchAccount`].
    pub async fn submit_task(
        &self,
        client: &AccountId,
        size: SizeGb,
        name: &str,
    ) -> Result<Task, MarketError> {
        if size.is_zero() {
            return Err(MarketError::invalid_input(
                "task size must be a positive number of gigabytes",
            ));
        }

        let mut state = self.state.lock().await;
        let account = state.registry.get(client)?;
        if account.role != AccountRole::Client {
            return Err(MarketError::invalid_input(format!(
                "account {client} has role {}, only clients submit tasks",
                account.role
            )));
        }

        let cost = self.pricing.cost_of(size);
        // Reject before the debit; refused submissions must change nothing.
        if state.vault.total_held().checked_add(cost).is_none() {
            return Err(MarketError::invalid_input(format!(
                "escrow vault cannot hold {cost} on top of {} without overflowing",
                state.vault.total_held()
            )));
        }
        state.registry.debit(client, cost)?;
        let task = state.tasks.create(client.clone(), size, name);
        state.vault.hold(task.id.as_str(), cost)?;
        state.ledger.append(LedgerEntry::new(
            client.clone(),
            EntryDirection::Debit,
            cost,
            EntryKind::EscrowHold,
            Some(task.id.to_string()),
        ));

        info!(
            task_id = %task.id,
            client = %client,
            size = %size,
            cost = %cost,
            "task submitted; cost held in escrow"
        );
        Ok(task)
    }

    /// Claim a pending task for a contributor.
    ///
    /// The Pending → Claimed transition is a single check-and-set under the
    /// engine lock: of any number of concurrent claimants, exactly one wins
    /// and the rest observe [`MarketError::AlreadyClaimed`].
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AlreadyClaimed`] on a lost race,
    /// [`MarketError::NoSuchTask`], [`MarketError::NoSuchAccount`], or
    /// [`MarketError::InvalidInput`] for a non-contributor claimant.
    pub async fn claim_task(
        &self,
        contributor: &AccountId,
        task: &TaskId,
    ) -> Result<Task, MarketError> {
        let mut state = self.state.lock().await;
        let account = state.registry.get(contributor)?;
        if account.role != AccountRole::Contributor {
            return Err(MarketError::invalid_input(format!(
                "account {contributor} has role {}, only contributors claim tasks",
                account.role
            )));
        }

        let claimed = state.tasks.claim(task, contributor)?;
        info!(task_id = %task, contributor = %contributor, "task claimed");
        Ok(claimed)
    }

    /// Settle a claimed task: release the escrow hold and pay the
    /// contributor and the platform fee pool.
    ///
    /// Settlement happens exactly once per task. The earning/fee split is
    /// reconciled against the held cost before any payment; a mismatch or a
    /// short hold aborts the whole operation with
    /// [`MarketError::LedgerCorruption`] and leaves the task claimed rather
    /// than paying less than owed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidTransition`] if the task is not
    /// claimed (including a second completion attempt), or
    /// [`MarketError::LedgerCorruption`] on reconciliation failure.
    pub async fn complete_task(&self, task: &TaskId) -> Result<Settlement, MarketError> {
        let mut state = self.state.lock().await;
        let snapshot = state.tasks.get(task)?;
        if snapshot.status != TaskStatus::Claimed {
            return Err(MarketError::InvalidTransition {
                from: snapshot.status.to_string(),
                to: TaskStatus::Completed.to_string(),
            });
        }
        let contributor = snapshot.claimed_by.clone().ok_or_else(|| {
            corruption(format!("claimed task {task} has no recorded claimant"))
        })?;

        let cost = self.pricing.cost_of(snapshot.size);
        let earning = self.pricing.payout_of(snapshot.size);
        let fee = self.pricing.fee_of(snapshot.size);
        if earning.checked_add(fee) != Some(cost) {
            return Err(corruption(format!(
                "settlement split {earning} + {fee} does not reproduce cost {cost} for task {task}"
            )));
        }

        let held = state
            .vault
            .amount_for(task.as_str())
            .ok_or_else(|| corruption(format!("no escrow hold for claimed task {task}")))?;
        if held != cost {
            return Err(corruption(format!(
                "escrow hold {held} does not cover cost {cost} for task {task}"
            )));
        }

        // All checks passed; apply the settlement as one unit.
        state.vault.release(task.as_str())?;
        state.tasks.complete(task)?;
        state.registry.credit(&contributor, earning)?;
        state.ledger.append(LedgerEntry::new(
            contributor.clone(),
            EntryDirection::Credit,
            earning,
            EntryKind::Payout,
            Some(task.to_string()),
        ));
        state.registry.credit(&self.platform, fee)?;
        state.ledger.append(LedgerEntry::new(
            self.platform.clone(),
            EntryDirection::Credit,
            fee,
            EntryKind::PlatformFee,
            Some(task.to_string()),
        ));

        info!(
            task_id = %task,
            contributor = %contributor,
            earning = %earning,
            fee = %fee,
            "task settled"
        );
        Ok(Settlement {
            task: task.clone(),
            earning,
            fee,
        })
    }

    /// Abort a pending or claimed task and refund the client in full.
    ///
    /// No fee is taken on abort: the exact escrowed cost returns to the
    /// task's original payer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidTransition`] if the task is already
    /// terminal, or [`MarketError::NoSuchTask`].
    pub async fn abort_task(&self, task: &TaskId, reason: &str) -> Result<Task, MarketError> {
        let mut state = self.state.lock().await;
        let snapshot = state.tasks.get(task)?;
        if snapshot.is_terminal() {
            return Err(MarketError::InvalidTransition {
                from: snapshot.status.to_string(),
                to: TaskStatus::Failed.to_string(),
            });
        }

        let refund = state.vault.release(task.as_str())?;
        let failed = state.tasks.fail(task, reason)?;
        state.registry.credit(&snapshot.owner, refund)?;
        state.ledger.append(LedgerEntry::new(
            snapshot.owner.clone(),
            EntryDirection::Credit,
            refund,
            EntryKind::Refund,
            Some(task.to_string()),
        ));

        warn!(
            task_id = %task,
            client = %snapshot.owner,
            refund = %refund,
            reason,
            "task aborted; client refunded in full"
        );
        Ok(failed)
    }

    /// Current balance of an account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NoSuchAccount`] if the ID is unknown.
    pub async fn balance(&self, account: &AccountId) -> Result<Amount, MarketError> {
        let state = self.state.lock().await;
        Ok(state.registry.balance(account)?)
    }

    /// Snapshot of a task.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NoSuchTask`] if the ID is unknown.
    pub async fn get_task(&self, task: &TaskId) -> Result<Task, MarketError> {
        let state = self.state.lock().await;
        state.tasks.get(task)
    }

    /// Snapshot of all pending tasks, in submission order.
    pub async fn list_pending_tasks(&self) -> Vec<Task> {
        let state = self.state.lock().await;
        state.tasks.list_pending()
    }

    /// Tasks and ledger entries involving one account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NoSuchAccount`] if the ID is unknown.
    pub async fn account_history(&self, account: &AccountId) -> Result<AccountHistory, MarketError> {
        let state = self.state.lock().await;
        state.registry.get(account)?;
        Ok(reporting::account_history(
            &state.tasks,
            &state.ledger,
            account,
        ))
    }

    /// Platform-wide totals.
    pub async fn platform_stats(&self) -> PlatformStats {
        let state = self.state.lock().await;
        reporting::platform_stats(&state.tasks, &state.vault, &state.registry, &self.platform)
    }

    /// Contributor leaderboard, descending by cumulative earnings.
    pub async fn leaderboard(&self) -> Vec<LeaderboardRow> {
        let state = self.state.lock().await;
        reporting::leaderboard(&state.tasks, &state.ledger, &state.registry)
    }

    /// Verify fund conservation across the whole core: every balance
    /// matches its ledger history, the vault total matches its holds, and
    /// the vault holds exactly the cost of every non-terminal task.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::LedgerCorruption`] describing the first
    /// violated invariant.
    pub async fn audit(&self) -> Result<(), MarketError> {
        let state = self.state.lock().await;

        if let Err(e) = state.registry.verify_conservation(&state.ledger) {
            let err = MarketError::from(e);
            error!(error = %err, "audit failed: balance/ledger mismatch");
            return Err(err);
        }
        if let Err(e) = state.vault.verify_total() {
            let err = MarketError::from(e);
            error!(error = %err, "audit failed: vault total mismatch");
            return Err(err);
        }

        let mut expected = Amount::ZERO;
        for t in state.tasks.iter().filter(|t| !t.is_terminal()) {
            expected = expected.saturating_add(self.pricing.cost_of(t.size));
        }
        if expected != state.vault.total_held() {
            let err = corruption(format!(
                "escrow total {} does not match cost of live tasks {}",
                state.vault.total_held(),
                expected
            ));
            error!(error = %err, "audit failed: escrow/task mismatch");
            return Err(err);
        }
        Ok(())
    }
}

impl Default for SettlementEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Log and build a corruption error. Corruption is surfaced loudly: it
/// means fund conservation has broken.
fn corruption(message: String) -> MarketError {
    error!(%message, "ledger corruption detected");
    MarketError::LedgerCorruption(message)
}
