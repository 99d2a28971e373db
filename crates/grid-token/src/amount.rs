//! Fixed-point GRID token amounts.
//!
//! Every balance, rate, and escrow hold in the marketplace is an [`Amount`]:
//! an integer count of grains, where one GRID is `10^9` grains. Settlement
//! arithmetic stays in integers end to end; there is deliberately no
//! float-based constructor, so rounding can only happen at a display
//! boundary, never inside the books.

use crate::GRAINS_PER_GRID;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantity of GRID tokens, counted in grains.
///
/// Arithmetic is exposed only through checked and saturating operations;
/// callers decide per call site whether overflow is an error or a clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount {
    grains: u64,
}

impl Amount {
    /// No tokens at all.
    pub const ZERO: Self = Self { grains: 0 };

    /// The largest representable amount.
    pub const MAX: Self = Self { grains: u64::MAX };

    /// An amount of exactly `grains` base units.
    #[must_use]
    pub const fn from_grains(grains: u64) -> Self {
        Self { grains }
    }

    /// A whole number of GRID tokens.
    #[must_use]
    pub const fn tokens(tokens: u64) -> Self {
        Self {
            grains: tokens * GRAINS_PER_GRID,
        }
    }

    /// The amount in grains.
    #[must_use]
    pub const fn grains(&self) -> u64 {
        self.grains
    }

    /// Whether this is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.grains == 0
    }

    /// Addition clamped at [`Amount::MAX`].
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self {
            grains: self.grains.saturating_add(other.grains),
        }
    }

    /// Subtraction clamped at [`Amount::ZERO`].
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self {
            grains: self.grains.saturating_sub(other.grains),
        }
    }

    /// Addition, `None` on overflow.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.grains.checked_add(other.grains) {
            Some(grains) => Some(Self { grains }),
            None => None,
        }
    }

    /// Subtraction, `None` if `other` exceeds `self`.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.grains.checked_sub(other.grains) {
            Some(grains) => Some(Self { grains }),
            None => None,
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Integer split; no float conversion even for display.
        let whole = self.grains / GRAINS_PER_GRID;
        let frac = self.grains % GRAINS_PER_GRID;
        write!(f, "{whole}.{frac:09} GRID")
    }
}
