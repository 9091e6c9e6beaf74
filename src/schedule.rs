//! Momentum-level plasma dynamics.
//!
//! Each momentum carries the plasma base price, the PoW difficulty per plasma
//! and the fused plasma recharge rate used by [`recharged_plasma`].  The next
//! momentum derives its values from how full the previous one was:
//!
//! * the base price and the PoW difficulty move towards their targets by at
//!   most `1 / change_denominator` per momentum;
//! * the recharge rate target falls exponentially with momentum fullness,
//!   from [`MAX_FUSION_RECHARGE_RATE`] when empty down to 1/10000 of it when
//!   full, and the actual rate halves or doubles towards that target.
//!
//! [`recharged_plasma`]: crate::recharged_plasma

use crate::constants::{
    BASE_PRICE_CHANGE_DENOMINATOR, DIFFICULTY_PER_PLASMA_CHANGE_DENOMINATOR,
    MAX_BASE_PLASMA_IN_MOMENTUM, MAX_FUSION_RECHARGE_RATE, MIN_BASE_PRICE,
    MIN_DIFFICULTY_PER_PLASMA, PLASMA_RECHARGE_RATE_CHANGE_MULTIPLIER,
    TARGET_BASE_PLASMA_IN_MOMENTUM, TARGET_POW_PLASMA_PERCENT_IN_MOMENTUM,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plasma accounting of a single momentum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumPlasmaStats {
    /// Minimum plasma price, fixed point over `BASE_PRICE_DENOMINATOR`.
    pub base_price: u64,
    /// Base plasma consumed by the momentum's account blocks.
    pub base_plasma: u64,
    /// Plasma actually paid, at least `base_plasma * base_price`.
    pub used_plasma: u64,
    /// Total PoW difficulty contributed.
    pub difficulty: u64,
    /// PoW difficulty required per plasma.
    pub difficulty_per_plasma: u64,
    /// Fused plasma recharged per confirmation.
    pub fusion_recharge_rate: u64,
}

/// A momentum whose plasma parameters fall outside protocol bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("base price {0} is below the minimum")]
    /// Base price under `MIN_BASE_PRICE`.
    BasePriceTooLow(u64),
    #[error("base plasma {0} exceeds the per-momentum maximum")]
    /// Base plasma above `MAX_BASE_PLASMA_IN_MOMENTUM`.
    BasePlasmaTooHigh(u64),
    #[error("difficulty per plasma {0} is below the minimum")]
    /// Difficulty per plasma under `MIN_DIFFICULTY_PER_PLASMA`.
    DifficultyPerPlasmaTooLow(u64),
    #[error("fusion recharge rate {0} exceeds the maximum")]
    /// Recharge rate above `MAX_FUSION_RECHARGE_RATE`.
    RechargeRateTooHigh(u64),
}

impl MomentumPlasmaStats {
    /// Checks the momentum against the protocol bounds.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.base_price < MIN_BASE_PRICE {
            return Err(ScheduleError::BasePriceTooLow(self.base_price));
        }
        if self.base_plasma > MAX_BASE_PLASMA_IN_MOMENTUM {
            return Err(ScheduleError::BasePlasmaTooHigh(self.base_plasma));
        }
        if self.difficulty_per_plasma < MIN_DIFFICULTY_PER_PLASMA {
            return Err(ScheduleError::DifficultyPerPlasmaTooLow(
                self.difficulty_per_plasma,
            ));
        }
        if self.fusion_recharge_rate > MAX_FUSION_RECHARGE_RATE {
            return Err(ScheduleError::RechargeRateTooHigh(self.fusion_recharge_rate));
        }
        Ok(())
    }

    /// Derives the parameters of the following momentum.
    ///
    /// `base_plasma`, `used_plasma` and `difficulty` describe the contents of
    /// the new momentum; prices and rates come from `self`.
    pub fn next(&self, base_plasma: u64, used_plasma: u64, difficulty: u64) -> Self {
        let target = fusion_recharge_rate_target(self.base_plasma);
        Self {
            base_price: next_base_price(self),
            base_plasma,
            used_plasma,
            difficulty,
            difficulty_per_plasma: next_difficulty_per_plasma(self),
            fusion_recharge_rate: next_fusion_recharge_rate(self.fusion_recharge_rate, target),
        }
    }
}

/// Moves `current` towards the target by `current * (actual - target) / (target * c)`.
///
/// Division floors towards negative infinity; the result never goes below
/// zero.  A zero target or denominator leaves `current` unchanged.
pub fn target_offset_multiplier(
    target: u64,
    actual: u64,
    current: u64,
    change_denominator: u64,
) -> u64 {
    if actual == target || target == 0 || change_denominator == 0 {
        return current;
    }
    let distance = actual as i128 - target as i128;
    let numerator = (current as i128).saturating_mul(distance);
    let denominator = (target as i128).saturating_mul(change_denominator as i128);
    let multiplier = (current as i128).saturating_add(numerator.div_euclid(denominator));
    if multiplier > 0 {
        u64::try_from(multiplier).unwrap_or(u64::MAX)
    } else {
        0
    }
}

/// Base price of the next momentum, never below [`MIN_BASE_PRICE`].
pub fn next_base_price(frontier: &MomentumPlasmaStats) -> u64 {
    target_offset_multiplier(
        TARGET_BASE_PLASMA_IN_MOMENTUM,
        frontier.base_plasma,
        frontier.base_price,
        BASE_PRICE_CHANGE_DENOMINATOR,
    )
    .max(MIN_BASE_PRICE)
}

/// PoW difficulty per plasma of the next momentum, never below
/// [`MIN_DIFFICULTY_PER_PLASMA`].
///
/// Below the base plasma target all used plasma may come from PoW; at or
/// above it only the targeted PoW share does.
pub fn next_difficulty_per_plasma(frontier: &MomentumPlasmaStats) -> u64 {
    let target_plasma = if frontier.base_plasma >= TARGET_BASE_PLASMA_IN_MOMENTUM {
        frontier
            .used_plasma
            .saturating_mul(TARGET_POW_PLASMA_PERCENT_IN_MOMENTUM)
            / 100
    } else {
        frontier.used_plasma
    };
    let pow_plasma = frontier
        .difficulty
        .checked_div(frontier.difficulty_per_plasma)
        .unwrap_or(0);
    target_offset_multiplier(
        target_plasma,
        pow_plasma,
        frontier.difficulty_per_plasma,
        DIFFICULTY_PER_PLASMA_CHANGE_DENOMINATOR,
    )
    .max(MIN_DIFFICULTY_PER_PLASMA)
}

/// Recharge rate the network steers towards after a momentum holding
/// `base_plasma`: `MAX_FUSION_RECHARGE_RATE * 10000^-fullness`.
pub fn fusion_recharge_rate_target(base_plasma: u64) -> u64 {
    let fullness = base_plasma.min(MAX_BASE_PLASMA_IN_MOMENTUM) as f64
        / MAX_BASE_PLASMA_IN_MOMENTUM as f64;
    let multiplier = 10_000f64.powf(-fullness);
    (MAX_FUSION_RECHARGE_RATE as f64 * multiplier) as u64
}

/// Steps `current` towards `target`, halving or doubling at most.
pub fn next_fusion_recharge_rate(current: u64, target: u64) -> u64 {
    if current > target {
        (current / PLASMA_RECHARGE_RATE_CHANGE_MULTIPLIER).max(target)
    } else {
        current
            .saturating_mul(PLASMA_RECHARGE_RATE_CHANGE_MULTIPLIER)
            .min(target)
    }
}
