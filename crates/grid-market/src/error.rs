//! Error types for the marketplace settlement core.

use grid_token::TokenError;
use thiserror::Error;

/// Errors that can occur in settlement operations.
///
/// Every recoverable variant leaves all engine state unchanged: no partial
/// debits, no orphaned escrow holds. [`MarketError::LedgerCorruption`] is the
/// exception — it reports a broken internal invariant and always aborts the
/// operation that detected it.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Malformed input rejected before any state change.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Client cannot cover the submission cost.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount required for the operation.
        required: grid_token::Amount,
        /// Amount currently available.
        available: grid_token::Amount,
    },

    /// Lost a claim race; the task is no longer pending.
    #[error("task {task} already claimed")]
    AlreadyClaimed {
        /// The contested task.
        task: String,
    },

    /// Operation attempted on a task not in the required state.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },

    /// Referenced task is unknown.
    #[error("no such task: {0}")]
    NoSuchTask(String),

    /// Referenced account is unknown.
    #[error("no such account: {0}")]
    NoSuchAccount(String),

    /// Fund conservation broke: a balance, escrow hold, or settlement split
    /// failed reconciliation. Fatal to the operation; never silently retried
    /// or swallowed.
    #[error("ledger corruption: {0}")]
    LedgerCorruption(String),
}

impl MarketError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a ledger corruption error.
    #[must_use]
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::LedgerCorruption(message.into())
    }

    /// Whether the caller can recover by adjusting its request. Corruption
    /// errors are not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::LedgerCorruption(_))
    }
}

impl From<TokenError> for MarketError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InsufficientFunds {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            TokenError::NoSuchAccount { id } => Self::NoSuchAccount(id),
            TokenError::InvalidAmount { message } => Self::InvalidInput(message),
            // Missing or duplicated holds and conservation failures all mean
            // the books no longer balance.
            TokenError::NoSuchHold { task } => {
                Self::LedgerCorruption(format!("no escrow hold for task {task}"))
            }
            TokenError::DuplicateHold { task } => {
                Self::LedgerCorruption(format!("duplicate escrow hold for task {task}"))
            }
            TokenError::Conservation { message } => Self::LedgerCorruption(message),
        }
    }
}
