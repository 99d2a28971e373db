//! Error types for GRID token operations.

use crate::amount::Amount;
use thiserror::Error;

/// Result type alias for GRID token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur during GRID token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Insufficient funds for a debit.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount required for the operation.
        required: Amount,
        /// Amount currently available.
        available: Amount,
    },

    /// Account not found.
    #[error("no such account: {id}")]
    NoSuchAccount {
        /// Account ID.
        id: String,
    },

    /// No active escrow hold for the referenced task.
    #[error("no escrow hold for task {task}")]
    NoSuchHold {
        /// Task ID.
        task: String,
    },

    /// A second hold was attempted for a task that already has one.
    #[error("escrow hold already exists for task {task}")]
    DuplicateHold {
        /// Task ID.
        task: String,
    },

    /// Invalid amount.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// Fund conservation broken (ledger, balance, or vault total mismatch).
    #[error("conservation violation: {message}")]
    Conservation {
        /// Description of the mismatch.
        message: String,
    },
}

impl TokenError {
    /// Create an insufficient funds error.
    #[must_use]
    pub const fn insufficient_funds(required: Amount, available: Amount) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Create a no-such-account error.
    #[must_use]
    pub fn no_such_account(id: impl Into<String>) -> Self {
        Self::NoSuchAccount { id: id.into() }
    }

    /// Create a conservation violation error.
    #[must_use]
    pub fn conservation(message: impl Into<String>) -> Self {
        Self::Conservation {
            message: message.into(),
        }
    }
}
