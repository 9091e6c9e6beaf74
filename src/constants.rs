//! Protocol constants shared by the recharge model and the momentum schedule.
//!
//! All quantities are expressed in plasma units unless noted otherwise.  The
//! values mirror the network parameters: one fused QSR yields
//! [`PLASMA_PER_FUSION_UNIT`] plasma, and an account block costs
//! [`ACCOUNT_BLOCK_BASE_PLASMA`].

/// Fused plasma at which the recharge multiplier starts to grow (1000 QSR).
pub const THRESHOLD_PLASMA: u64 = 2_100_000;

/// Base plasma required to publish a single account block.
pub const ACCOUNT_BLOCK_BASE_PLASMA: u64 = 21_000;

/// Number of fused QSR units that cover one account block.
pub const NUM_FUSION_UNITS_FOR_BASE_PLASMA: u64 = 10;

/// Plasma granted per fused QSR unit.
pub const PLASMA_PER_FUSION_UNIT: u64 = ACCOUNT_BLOCK_BASE_PLASMA / NUM_FUSION_UNITS_FOR_BASE_PLASMA;

/// Base units in one QSR (8 decimals).
pub const FUSION_UNIT: u64 = 100_000_000;

/// Upper bound for base plasma consumed in a single momentum (200 blocks).
pub const MAX_BASE_PLASMA_IN_MOMENTUM: u64 = 200 * ACCOUNT_BLOCK_BASE_PLASMA;

/// Ratio between the maximum and the targeted base plasma per momentum.
pub const TARGET_BASE_PLASMA_ELASTICITY: u64 = 2;

/// Targeted base plasma per momentum (50% of the maximum).
pub const TARGET_BASE_PLASMA_IN_MOMENTUM: u64 =
    MAX_BASE_PLASMA_IN_MOMENTUM / TARGET_BASE_PLASMA_ELASTICITY;

/// Share of plasma (percent) expected to come from PoW once the target is met.
pub const TARGET_POW_PLASMA_PERCENT_IN_MOMENTUM: u64 = 20;

/// Highest recharge rate a momentum may carry (100 QSR per confirmation).
pub const MAX_FUSION_RECHARGE_RATE: u64 = 210_000;

/// Limits the base price movement per momentum.
pub const BASE_PRICE_CHANGE_DENOMINATOR: u64 = 8;

/// Limits the PoW difficulty-per-plasma movement per momentum.
pub const DIFFICULTY_PER_PLASMA_CHANGE_DENOMINATOR: u64 = 8;

/// The recharge rate halves or doubles at most once per momentum.
pub const PLASMA_RECHARGE_RATE_CHANGE_MULTIPLIER: u64 = 2;

/// Lowest accepted PoW difficulty per plasma.
pub const MIN_DIFFICULTY_PER_PLASMA: u64 = 500;

/// Lowest accepted plasma base price.
pub const MIN_BASE_PRICE: u64 = 1000;

/// Fixed-point denominator for the base price.
pub const BASE_PRICE_DENOMINATOR: u64 = 1000;

const _: () = assert!(THRESHOLD_PLASMA > 0, "threshold plasma must be non-zero");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_matches_thousand_qsr() {
        assert_eq!(PLASMA_PER_FUSION_UNIT, 2_100);
        assert_eq!(THRESHOLD_PLASMA, 1000 * PLASMA_PER_FUSION_UNIT);
    }

    #[test]
    fn momentum_targets_are_consistent() {
        assert_eq!(MAX_BASE_PLASMA_IN_MOMENTUM, 4_200_000);
        assert_eq!(TARGET_BASE_PLASMA_IN_MOMENTUM, 2_100_000);
    }
}
