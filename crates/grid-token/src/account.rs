//! Participant accounts and the account registry.
//!
//! Exactly one [`Account`] exists per participant. Accounts are created at
//! registration and mutated only through [`AccountRegistry::credit`] and
//! [`AccountRegistry::debit`], which the settlement engine invokes inside
//! its transactional critical section.

use crate::amount::Amount;
use crate::error::{Result, TokenError};
use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique account identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new random account ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("acct-{}", Uuid::new_v4()))
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role an account plays in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Submits tasks and pays for processing.
    Client,
    /// Claims and processes tasks for payment.
    Contributor,
    /// The platform fee pool. Owned by the engine, never registered directly.
    Platform,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Contributor => write!(f, "contributor"),
            Self::Platform => write!(f, "platform"),
        }
    }
}

/// A participant account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,

    /// Role in the marketplace.
    pub role: AccountRole,

    /// Balance the account was created with. Never changes; used together
    /// with the ledger to verify the current balance.
    pub initial_balance: Amount,

    /// Current spendable balance.
    pub balance: Amount,

    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Registry owning every participant account.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: HashMap<AccountId, Account>,
}

impl AccountRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account with the given role and starting balance.
    pub fn create(&mut self, role: AccountRole, initial_balance: Amount) -> AccountId {
        let id = AccountId::new();
        let account = Account {
            id: id.clone(),
            role,
            initial_balance,
            balance: initial_balance,
            created_at: Utc::now(),
        };
        self.accounts.insert(id.clone(), account);
        id
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NoSuchAccount`] if the ID is unknown.
    pub fn get(&self, id: &AccountId) -> Result<&Account> {
        self.accounts
            .get(id)
            .ok_or_else(|| TokenError::no_such_account(id.as_str()))
    }

    /// Get the current balance of an account.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NoSuchAccount`] if the ID is unknown.
    pub fn balance(&self, id: &AccountId) -> Result<Amount> {
        Ok(self.get(id)?.balance)
    }

    /// Credit an account.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NoSuchAccount`] if the ID is unknown.
    pub fn credit(&mut self, id: &AccountId, amount: Amount) -> Result<()> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| TokenError::no_such_account(id.as_str()))?;
        account.balance = account.balance.saturating_add(amount);
        Ok(())
    }

    /// Debit an account. The balance can never go below zero: a debit
    /// exceeding the available balance fails and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientFunds`] if the balance cannot cover
    /// the debit, or [`TokenError::NoSuchAccount`] if the ID is unknown.
    pub fn debit(&mut self, id: &AccountId, amount: Amount) -> Result<()> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| TokenError::no_such_account(id.as_str()))?;
        match account.balance.checked_sub(amount) {
            Some(remaining) => {
                account.balance = remaining;
                Ok(())
            }
            None => Err(TokenError::insufficient_funds(amount, account.balance)),
        }
    }

    /// Iterate over all accounts.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Verify that every balance equals the initial balance plus the sum of
    /// the account's ledger deltas.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Conservation`] naming the first account whose
    /// recorded balance disagrees with its ledger history.
    pub fn verify_conservation(&self, ledger: &Ledger) -> Result<()> {
        for account in self.accounts.values() {
            let expected = i128::from(account.initial_balance.grains())
                + ledger.balance_delta(&account.id);
            let actual = i128::from(account.balance.grains());
            if expected != actual {
                return Err(TokenError::conservation(format!(
                    "account {} balance {} does not match ledger-derived {}",
                    account.id, actual, expected
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{EntryDirection, EntryKind, LedgerEntry};

    #[test]
    fn test_account_id_unique() {
        let id1 = AccountId::new();
        let id2 = AccountId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("acct-"));
    }

    #[test]
    fn test_create_and_get() {
        let mut registry = AccountRegistry::new();
        let id = registry.create(AccountRole::Client, Amount::tokens(70));

        let account = registry.get(&id).expect("account exists");
        assert_eq!(account.role, AccountRole::Client);
        assert_eq!(account.balance, Amount::tokens(70));
        assert_eq!(account.initial_balance, Amount::tokens(70));
    }

    #[test]
    fn test_get_unknown_account() {
        let registry = AccountRegistry::new();
        let result = registry.get(&AccountId::from_string("acct-missing"));
        assert!(matches!(result, Err(TokenError::NoSuchAccount { .. })));
    }

    #[test]
    fn test_credit_and_debit() {
        let mut registry = AccountRegistry::new();
        let id = registry.create(AccountRole::Contributor, Amount::tokens(50));

        registry.credit(&id, Amount::tokens(45)).expect("credit");
        assert_eq!(registry.balance(&id).unwrap(), Amount::tokens(95));

        registry.debit(&id, Amount::tokens(20)).expect("debit");
        assert_eq!(registry.balance(&id).unwrap(), Amount::tokens(75));
    }

    #[test]
    fn test_debit_insufficient_changes_nothing() {
        let mut registry = AccountRegistry::new();
        let id = registry.create(AccountRole::Client, Amount::tokens(5));

        let result = registry.debit(&id, Amount::tokens(10));
        assert!(matches!(result, Err(TokenError::InsufficientFunds { .. })));
        assert_eq!(registry.balance(&id).unwrap(), Amount::tokens(5));
    }

    #[test]
    fn test_debit_exact_balance() {
        let mut registry = AccountRegistry::new();
        let id = registry.create(AccountRole::Client, Amount::tokens(10));

        registry.debit(&id, Amount::tokens(10)).expect("debit");
        assert!(registry.balance(&id).unwrap().is_zero());
    }

    #[test]
    fn test_conservation_holds() {
        let mut registry = AccountRegistry::new();
        let mut ledger = Ledger::new();
        let id = registry.create(AccountRole::Client, Amount::tokens(70));

        registry.debit(&id, Amount::tokens(50)).unwrap();
        ledger.append(LedgerEntry::new(
            id.clone(),
            EntryDirection::Debit,
            Amount::tokens(50),
            EntryKind::EscrowHold,
            Some("task-1".to_string()),
        ));

        assert!(registry.verify_conservation(&ledger).is_ok());
    }

    #[test]
    fn test_conservation_detects_drift() {
        let mut registry = AccountRegistry::new();
        let ledger = Ledger::new();
        let id = registry.create(AccountRole::Client, Amount::tokens(70));

        // Mutation without a matching ledger entry breaks conservation.
        registry.debit(&id, Amount::tokens(1)).unwrap();

        let result = registry.verify_conservation(&ledger);
        assert!(matches!(result, Err(TokenError::Conservation { .. })));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(AccountRole::Client.to_string(), "client");
        assert_eq!(AccountRole::Contributor.to_string(), "contributor");
        assert_eq!(AccountRole::Platform.to_string(), "platform");
    }

    #[test]
    fn test_account_serialization() {
        let mut registry = AccountRegistry::new();
        let id = registry.create(AccountRole::Client, Amount::tokens(70));
        let account = registry.get(&id).unwrap();

        let json = serde_json::to_string(account).expect("serialize");
        let parsed: Account = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(account.id, parsed.id);
        assert_eq!(account.balance, parsed.balance);
    }
}
