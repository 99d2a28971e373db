//! Pricing policy for task settlement.
//!
//! All rate math is fixed-point integer arithmetic with `u128`
//! intermediates. For whole-token per-GB rates and milli-GB sizes the
//! division below is exact, so the payout/fee split reproduces the
//! submission cost to the grain. The engine re-asserts that equality on
//! every settlement rather than assuming it.

use crate::error::MarketError;
use crate::task::SizeGb;
use grid_token::Amount;
use serde::{Deserialize, Serialize};

/// Milli-GB per GB, the scale factor of [`SizeGb`].
const MILLIS_PER_GB: u128 = 1000;

/// Per-GB rates for submission cost, contributor payout, and platform fee.
///
/// The invariant `payout_rate + platform_rate == submission_rate` is
/// enforced at construction: every grain a client pays is owed to exactly
/// one of the contributor or the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    submission_rate: Amount,
    payout_rate: Amount,
    platform_rate: Amount,
}

impl PricingPolicy {
    /// Default client cost: 10 GRID per GB.
    pub const DEFAULT_SUBMISSION_RATE: Amount = Amount::tokens(10);

    /// Default contributor earning: 9 GRID per GB.
    pub const DEFAULT_PAYOUT_RATE: Amount = Amount::tokens(9);

    /// Default platform fee: 1 GRID per GB.
    pub const DEFAULT_PLATFORM_RATE: Amount = Amount::tokens(1);

    /// Create a policy, verifying that the payout and platform rates sum to
    /// the submission rate.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidInput`] if the rates do not reconcile.
    pub fn new(
        submission_rate: Amount,
        payout_rate: Amount,
        platform_rate: Amount,
    ) -> Result<Self, MarketError> {
        match payout_rate.checked_add(platform_rate) {
            Some(sum) if sum == submission_rate => Ok(Self {
                submission_rate,
                payout_rate,
                platform_rate,
            }),
            _ => Err(MarketError::invalid_input(format!(
                "payout rate {payout_rate} + platform rate {platform_rate} must equal submission rate {submission_rate}"
            ))),
        }
    }

    /// The per-GB submission rate (client cost).
    #[must_use]
    pub const fn submission_rate(&self) -> Amount {
        self.submission_rate
    }

    /// The per-GB payout rate (contributor earning).
    #[must_use]
    pub const fn payout_rate(&self) -> Amount {
        self.payout_rate
    }

    /// The per-GB platform rate (fee).
    #[must_use]
    pub const fn platform_rate(&self) -> Amount {
        self.platform_rate
    }

    /// Submission cost for a task of the given size.
    #[must_use]
    pub fn cost_of(&self, size: SizeGb) -> Amount {
        scale(self.submission_rate, size)
    }

    /// Contributor payout for a task of the given size.
    #[must_use]
    pub fn payout_of(&self, size: SizeGb) -> Amount {
        scale(self.payout_rate, size)
    }

    /// Platform fee for a task of the given size.
    #[must_use]
    pub fn fee_of(&self, size: SizeGb) -> Amount {
        scale(self.platform_rate, size)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        // 9 + 1 == 10 by construction.
        Self {
            submission_rate: Self::DEFAULT_SUBMISSION_RATE,
            payout_rate: Self::DEFAULT_PAYOUT_RATE,
            platform_rate: Self::DEFAULT_PLATFORM_RATE,
        }
    }
}

/// Multiply a per-GB rate by a size, in u128 to prevent overflow.
///
/// Saturates to `Amount::MAX` for inputs that would overflow a u64; the
/// engine's reconciliation check catches that case before any payment.
fn scale(rate: Amount, size: SizeGb) -> Amount {
    let grains = u128::from(rate.grains()) * u128::from(size.millis()) / MILLIS_PER_GB;
    if grains > u128::from(u64::MAX) {
        Amount::MAX
    } else {
        Amount::from_grains(grains as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn gb(v: f64) -> SizeGb {
        SizeGb::try_gb(v).expect("valid size")
    }

    #[test]
    fn test_default_rates() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.submission_rate(), Amount::tokens(10));
        assert_eq!(policy.payout_rate(), Amount::tokens(9));
        assert_eq!(policy.platform_rate(), Amount::tokens(1));
    }

    #[test]
    fn test_five_gb_split() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.cost_of(gb(5.0)), Amount::tokens(50));
        assert_eq!(policy.payout_of(gb(5.0)), Amount::tokens(45));
        assert_eq!(policy.fee_of(gb(5.0)), Amount::tokens(5));
    }

    #[test]
    fn test_fractional_size_exact() {
        let policy = PricingPolicy::default();
        // 2.5 GB * 10 GRID/GB = 25 GRID, exactly.
        assert_eq!(policy.cost_of(gb(2.5)), Amount::tokens(25));
        assert_eq!(
            policy.payout_of(gb(2.5)).saturating_add(policy.fee_of(gb(2.5))),
            policy.cost_of(gb(2.5))
        );
    }

    #[test_case(0.001)]
    #[test_case(1.0)]
    #[test_case(2.5)]
    #[test_case(99.999)]
    fn test_split_reconciles(size_gb: f64) {
        let policy = PricingPolicy::default();
        let size = gb(size_gb);
        let sum = policy
            .payout_of(size)
            .checked_add(policy.fee_of(size))
            .expect("no overflow");
        assert_eq!(sum, policy.cost_of(size));
    }

    #[test]
    fn test_mismatched_rates_rejected() {
        let result = PricingPolicy::new(
            Amount::tokens(10),
            Amount::tokens(8),
            Amount::tokens(1),
        );
        assert!(matches!(result, Err(MarketError::InvalidInput(_))));
    }

    #[test]
    fn test_custom_rates() {
        let policy = PricingPolicy::new(
            Amount::tokens(20),
            Amount::tokens(17),
            Amount::tokens(3),
        )
        .expect("valid policy");
        assert_eq!(policy.cost_of(gb(2.0)), Amount::tokens(40));
        assert_eq!(policy.payout_of(gb(2.0)), Amount::tokens(34));
        assert_eq!(policy.fee_of(gb(2.0)), Amount::tokens(6));
    }

    #[test]
    fn test_scale_saturates() {
        let huge = SizeGb::from_millis(u64::MAX);
        let policy = PricingPolicy::default();
        assert_eq!(policy.cost_of(huge), Amount::MAX);
    }

    #[test]
    fn test_policy_serialization() {
        let policy = PricingPolicy::default();
        let json = serde_json::to_string(&policy).expect("serialize");
        let parsed: PricingPolicy = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(policy, parsed);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Whole-token rates times milli-GB sizes divide evenly, so the
            // split must reproduce the cost grain for grain.
            #[test]
            fn split_reconciles_for_any_size(milli_gb in 1..=1_000_000_000u64) {
                let policy = PricingPolicy::default();
                let size = SizeGb::from_millis(milli_gb);
                let sum = policy
                    .payout_of(size)
                    .checked_add(policy.fee_of(size))
                    .expect("no overflow");
                prop_assert_eq!(sum, policy.cost_of(size));
            }
        }
    }
}
