//! Read-only reporting over engine state.
//!
//! Pure folds over snapshots of the task store, ledger, vault, and
//! registry. Nothing here mutates; the engine calls these under a single
//! lock acquisition so every report reflects one consistent point in time.

use crate::task::{Task, TaskStatus, TaskStore};
use grid_token::{
    AccountId, AccountRegistry, AccountRole, Amount, EntryKind, Ledger, LedgerEntry, Vault,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything that happened to one account: the tasks it submitted or
/// claimed, and its ledger entries in append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHistory {
    /// The account in question.
    pub account: AccountId,
    /// Tasks the account owns or claimed, in submission order.
    pub tasks: Vec<Task>,
    /// The account's balance-affecting events, oldest first.
    pub entries: Vec<LedgerEntry>,
}

/// Platform-wide totals for the admin view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Total number of tasks ever submitted.
    pub total_tasks: usize,
    /// Tokens currently held in escrow.
    pub total_escrow: Amount,
    /// Cumulative platform fee earnings.
    pub platform_earnings: Amount,
}

/// One row of the contributor leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// The contributor.
    pub account: AccountId,
    /// Cumulative payout earnings.
    pub total_earnings: Amount,
    /// Number of tasks this contributor completed.
    pub tasks_completed: usize,
}

/// Collect the tasks and ledger entries involving one account.
#[must_use]
pub fn account_history(tasks: &TaskStore, ledger: &Ledger, account: &AccountId) -> AccountHistory {
    let involved: Vec<Task> = tasks
        .iter()
        .filter(|t| &t.owner == account || t.claimed_by.as_ref() == Some(account))
        .cloned()
        .collect();
    let entries: Vec<LedgerEntry> = ledger.entries_for(account).cloned().collect();
    AccountHistory {
        account: account.clone(),
        tasks: involved,
        entries,
    }
}

/// Compute platform-wide totals.
#[must_use]
pub fn platform_stats(
    tasks: &TaskStore,
    vault: &Vault,
    registry: &AccountRegistry,
    platform: &AccountId,
) -> PlatformStats {
    PlatformStats {
        total_tasks: tasks.len(),
        total_escrow: vault.total_held(),
        platform_earnings: registry.balance(platform).unwrap_or(Amount::ZERO),
    }
}

/// Build the contributor leaderboard: descending by cumulative earnings,
/// ties broken by account id so the ordering is stable.
///
/// Contributors with no earnings yet still appear with zero rows.
#[must_use]
pub fn leaderboard(
    tasks: &TaskStore,
    ledger: &Ledger,
    registry: &AccountRegistry,
) -> Vec<LeaderboardRow> {
    let mut earnings: HashMap<AccountId, Amount> = registry
        .iter()
        .filter(|a| a.role == AccountRole::Contributor)
        .map(|a| (a.id.clone(), Amount::ZERO))
        .collect();

    for entry in ledger.iter().filter(|e| e.kind == EntryKind::Payout) {
        let total = earnings.entry(entry.account.clone()).or_insert(Amount::ZERO);
        *total = total.saturating_add(entry.amount);
    }

    let mut completed: HashMap<AccountId, usize> = HashMap::new();
    for task in tasks.iter().filter(|t| t.status == TaskStatus::Completed) {
        if let Some(contributor) = &task.claimed_by {
            *completed.entry(contributor.clone()).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<LeaderboardRow> = earnings
        .into_iter()
        .map(|(account, total_earnings)| LeaderboardRow {
            tasks_completed: completed.get(&account).copied().unwrap_or(0),
            account,
            total_earnings,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_earnings
            .cmp(&a.total_earnings)
            .then_with(|| a.account.cmp(&b.account))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::SizeGb;
    use grid_token::{EntryDirection, Vault};

    fn gb(v: f64) -> SizeGb {
        SizeGb::try_gb(v).expect("valid size")
    }

    fn payout(account: &AccountId, tokens: u64) -> LedgerEntry {
        LedgerEntry::new(
            account.clone(),
            EntryDirection::Credit,
            Amount::tokens(tokens),
            EntryKind::Payout,
            None,
        )
    }

    #[test]
    fn test_account_history_covers_owned_and_claimed() {
        let mut store = TaskStore::new();
        let mut ledger = Ledger::new();
        let client = AccountId::new();
        let contributor = AccountId::new();

        let owned = store.create(client.clone(), gb(1.0), "owned");
        let claimed = store.create(AccountId::new(), gb(2.0), "claimed by them");
        store.claim(&claimed.id, &contributor).expect("claim");
        ledger.append(payout(&contributor, 9));

        let client_history = account_history(&store, &ledger, &client);
        assert_eq!(client_history.tasks.len(), 1);
        assert_eq!(client_history.tasks[0].id, owned.id);
        assert!(client_history.entries.is_empty());

        let contributor_history = account_history(&store, &ledger, &contributor);
        assert_eq!(contributor_history.tasks.len(), 1);
        assert_eq!(contributor_history.tasks[0].id, claimed.id);
        assert_eq!(contributor_history.entries.len(), 1);
    }

    #[test]
    fn test_platform_stats() {
        let mut store = TaskStore::new();
        let mut vault = Vault::new();
        let mut registry = AccountRegistry::new();
        let platform = registry.create(AccountRole::Platform, Amount::ZERO);

        let task = store.create(AccountId::new(), gb(5.0), "job");
        vault.hold(task.id.as_str(), Amount::tokens(50)).expect("hold");
        registry.credit(&platform, Amount::tokens(5)).expect("credit");

        let stats = platform_stats(&store, &vault, &registry, &platform);
        assert_eq!(stats.total_tasks, 1);
        assert_eq!(stats.total_escrow, Amount::tokens(50));
        assert_eq!(stats.platform_earnings, Amount::tokens(5));
    }

    #[test]
    fn test_leaderboard_sorted_descending() {
        let store = TaskStore::new();
        let mut ledger = Ledger::new();
        let mut registry = AccountRegistry::new();

        let low = registry.create(AccountRole::Contributor, Amount::ZERO);
        let high = registry.create(AccountRole::Contributor, Amount::ZERO);
        ledger.append(payout(&low, 9));
        ledger.append(payout(&high, 45));
        ledger.append(payout(&high, 18));

        let rows = leaderboard(&store, &ledger, &registry);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account, high);
        assert_eq!(rows[0].total_earnings, Amount::tokens(63));
        assert_eq!(rows[1].account, low);
        assert_eq!(rows[1].total_earnings, Amount::tokens(9));
    }

    #[test]
    fn test_leaderboard_tie_broken_by_account_id() {
        let store = TaskStore::new();
        let mut ledger = Ledger::new();
        let mut registry = AccountRegistry::new();

        let a = registry.create(AccountRole::Contributor, Amount::ZERO);
        let b = registry.create(AccountRole::Contributor, Amount::ZERO);
        ledger.append(payout(&a, 10));
        ledger.append(payout(&b, 10));

        let rows = leaderboard(&store, &ledger, &registry);
        let mut expected = vec![a, b];
        expected.sort();
        let got: Vec<_> = rows.into_iter().map(|r| r.account).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_leaderboard_includes_idle_contributors() {
        let store = TaskStore::new();
        let ledger = Ledger::new();
        let mut registry = AccountRegistry::new();
        let idle = registry.create(AccountRole::Contributor, Amount::tokens(50));
        // Clients never appear on the leaderboard.
        registry.create(AccountRole::Client, Amount::tokens(70));

        let rows = leaderboard(&store, &ledger, &registry);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account, idle);
        assert!(rows[0].total_earnings.is_zero());
        assert_eq!(rows[0].tasks_completed, 0);
    }

    #[test]
    fn test_leaderboard_counts_completed_tasks() {
        let mut store = TaskStore::new();
        let mut ledger = Ledger::new();
        let mut registry = AccountRegistry::new();
        let contributor = registry.create(AccountRole::Contributor, Amount::ZERO);

        let t1 = store.create(AccountId::new(), gb(1.0), "one");
        store.claim(&t1.id, &contributor).expect("claim");
        store.complete(&t1.id).expect("complete");
        ledger.append(payout(&contributor, 9));

        // A claimed-but-unfinished task does not count.
        let t2 = store.create(AccountId::new(), gb(1.0), "two");
        store.claim(&t2.id, &contributor).expect("claim");

        let rows = leaderboard(&store, &ledger, &registry);
        assert_eq!(rows[0].tasks_completed, 1);
    }
}
