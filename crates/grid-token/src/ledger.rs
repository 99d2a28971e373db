//! Append-only ledger of balance-affecting events.
//!
//! Every credit and debit the settlement engine performs is mirrored by a
//! [`LedgerEntry`] before the operation returns success. Entries are
//! immutable once appended; summing an account's deltas reconstructs its
//! balance relative to its initial funding.

use crate::account::AccountId;
use crate::amount::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Funds moved from a client into escrow at task submission.
    EscrowHold,
    /// Contributor earning for a completed task.
    Payout,
    /// Platform fee for a completed task.
    PlatformFee,
    /// Full refund to the client for an aborted task.
    Refund,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EscrowHold => write!(f, "escrow_hold"),
            Self::Payout => write!(f, "payout"),
            Self::PlatformFee => write!(f, "platform_fee"),
            Self::Refund => write!(f, "refund"),
        }
    }
}

/// Whether an entry increases or decreases the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    /// Balance increased.
    Credit,
    /// Balance decreased.
    Debit,
}

/// A single immutable ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Account whose balance changed.
    pub account: AccountId,

    /// Direction of the change.
    pub direction: EntryDirection,

    /// Magnitude of the change.
    pub amount: Amount,

    /// Why the balance changed.
    pub kind: EntryKind,

    /// Task this entry settles against, if any.
    pub task: Option<String>,

    /// When the entry was appended.
    pub at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(
        account: AccountId,
        direction: EntryDirection,
        amount: Amount,
        kind: EntryKind,
        task: Option<String>,
    ) -> Self {
        Self {
            account,
            direction,
            amount,
            kind,
            task,
            at: Utc::now(),
        }
    }

    /// The signed balance delta this entry represents, in grains.
    #[must_use]
    pub fn signed_delta(&self) -> i128 {
        let grains = i128::from(self.amount.grains());
        match self.direction {
            EntryDirection::Credit => grains,
            EntryDirection::Debit => -grains,
        }
    }
}

/// Append-only audit log of balance-affecting events.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are never modified or removed afterwards.
    pub fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Iterate over all entries in append order.
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    /// Iterate over the entries for one account, in append order.
    pub fn entries_for<'a>(
        &'a self,
        account: &'a AccountId,
    ) -> impl Iterator<Item = &'a LedgerEntry> {
        self.entries.iter().filter(move |e| &e.account == account)
    }

    /// Sum of signed deltas for one account, in grains.
    #[must_use]
    pub fn balance_delta(&self, account: &AccountId) -> i128 {
        self.entries_for(account).map(LedgerEntry::signed_delta).sum()
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(account: &AccountId, direction: EntryDirection, tokens: u64) -> LedgerEntry {
        LedgerEntry::new(
            account.clone(),
            direction,
            Amount::tokens(tokens),
            EntryKind::Payout,
            None,
        )
    }

    #[test]
    fn test_signed_delta() {
        let account = AccountId::new();
        let credit = entry(&account, EntryDirection::Credit, 45);
        let debit = entry(&account, EntryDirection::Debit, 50);

        assert_eq!(credit.signed_delta(), 45 * 1_000_000_000);
        assert_eq!(debit.signed_delta(), -50 * 1_000_000_000);
    }

    #[test]
    fn test_balance_delta_per_account() {
        let mut ledger = Ledger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();

        ledger.append(entry(&alice, EntryDirection::Credit, 45));
        ledger.append(entry(&alice, EntryDirection::Debit, 10));
        ledger.append(entry(&bob, EntryDirection::Credit, 5));

        assert_eq!(ledger.balance_delta(&alice), 35 * 1_000_000_000);
        assert_eq!(ledger.balance_delta(&bob), 5 * 1_000_000_000);
    }

    #[test]
    fn test_entries_for_preserves_order() {
        let mut ledger = Ledger::new();
        let account = AccountId::new();

        ledger.append(entry(&account, EntryDirection::Debit, 50));
        ledger.append(entry(&account, EntryDirection::Credit, 50));

        let directions: Vec<_> = ledger
            .entries_for(&account)
            .map(|e| e.direction)
            .collect();
        assert_eq!(
            directions,
            vec![EntryDirection::Debit, EntryDirection::Credit]
        );
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.balance_delta(&AccountId::new()), 0);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EntryKind::EscrowHold.to_string(), "escrow_hold");
        assert_eq!(EntryKind::Payout.to_string(), "payout");
        assert_eq!(EntryKind::PlatformFee.to_string(), "platform_fee");
        assert_eq!(EntryKind::Refund.to_string(), "refund");
    }

    #[test]
    fn test_entry_serialization() {
        let account = AccountId::new();
        let e = LedgerEntry::new(
            account,
            EntryDirection::Credit,
            Amount::tokens(45),
            EntryKind::Payout,
            Some("task-1".to_string()),
        );

        let json = serde_json::to_string(&e).expect("serialize");
        let parsed: LedgerEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(e.account, parsed.account);
        assert_eq!(e.amount, parsed.amount);
        assert_eq!(e.kind, parsed.kind);
    }
}
