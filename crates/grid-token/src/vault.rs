//! Escrow vault holding funds between task submission and settlement.
//!
//! The vault tracks exactly one [`EscrowHold`] per live task plus a running
//! total. The payer debit that accompanies a hold, and the credit that
//! follows a release, are performed by the settlement engine inside the same
//! critical section, so check, debit, and hold are atomic as a unit.

use crate::amount::Amount;
use crate::error::{Result, TokenError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Funds held against one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowHold {
    /// Task the funds are held for.
    pub task: String,

    /// Amount held.
    pub amount: Amount,

    /// When the hold was created.
    pub held_at: DateTime<Utc>,
}

/// The escrow vault.
#[derive(Debug, Default)]
pub struct Vault {
    holds: HashMap<String, EscrowHold>,
    total: Amount,
}

impl Vault {
    /// Create a new empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hold for a task.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::DuplicateHold`] if the task already has an
    /// active hold, or [`TokenError::InvalidAmount`] if the total would
    /// overflow.
    pub fn hold(&mut self, task: impl Into<String>, amount: Amount) -> Result<()> {
        let task = task.into();
        if self.holds.contains_key(&task) {
            return Err(TokenError::DuplicateHold { task });
        }
        let total = self.total.checked_add(amount).ok_or_else(|| {
            TokenError::InvalidAmount {
                message: "escrow total overflow".to_string(),
            }
        })?;
        self.holds.insert(
            task.clone(),
            EscrowHold {
                task,
                amount,
                held_at: Utc::now(),
            },
        );
        self.total = total;
        Ok(())
    }

    /// Remove the hold for a task and return its amount for redistribution.
    /// Each hold can be released exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NoSuchHold`] if the task has no active hold.
    /// That always signals a lifecycle bug in the caller.
    pub fn release(&mut self, task: &str) -> Result<Amount> {
        let hold = self.holds.remove(task).ok_or_else(|| TokenError::NoSuchHold {
            task: task.to_string(),
        })?;
        self.total = self.total.saturating_sub(hold.amount);
        Ok(hold.amount)
    }

    /// Total amount currently held across all tasks.
    #[must_use]
    pub const fn total_held(&self) -> Amount {
        self.total
    }

    /// Amount held for one task, if any.
    #[must_use]
    pub fn amount_for(&self, task: &str) -> Option<Amount> {
        self.holds.get(task).map(|h| h.amount)
    }

    /// Number of active holds.
    #[must_use]
    pub fn active_holds(&self) -> usize {
        self.holds.len()
    }

    /// Verify that the running total equals the sum of live holds.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Conservation`] if the totals disagree.
    pub fn verify_total(&self) -> Result<()> {
        let mut sum = Amount::ZERO;
        for hold in self.holds.values() {
            sum = sum.saturating_add(hold.amount);
        }
        if sum != self.total {
            return Err(TokenError::conservation(format!(
                "vault total {} does not match sum of holds {}",
                self.total, sum
            )));
        }
        Ok(())
    }
}
