//! Stake-tiered recharge model.
//!
//! Confined plasma is restored at a per-confirmation rate carried by the
//! momentum that confirmed the account's frontier block.  Accounts that fused
//! at least [`THRESHOLD_PLASMA`] receive a linear bonus on top of that rate:
//! an account with twice the threshold recharges twice as fast.
//!
//! The multiplier is kept as an exact ratio so the recharged amount is the
//! floor of a single rational product, identical on every node.

use crate::constants::THRESHOLD_PLASMA;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Exact recharge multiplier `numerator / denominator`, always `>= 1`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RechargeMultiplier {
    numerator: u64,
    denominator: u64,
}

impl RechargeMultiplier {
    /// The neutral multiplier granted below the threshold.
    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Numerator of the ratio.
    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    /// Denominator of the ratio (never zero).
    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Returns true when the multiplier exceeds one.
    pub fn is_bonus(&self) -> bool {
        self.numerator > self.denominator
    }

    /// Multiplies `value` by the ratio, flooring the result.
    ///
    /// Computed in 128-bit space; products that do not fit saturate, which is
    /// harmless because callers clamp against a `u64` allowance.
    pub fn apply(&self, value: u128) -> u128 {
        value.saturating_mul(self.numerator as u128) / self.denominator as u128
    }

    /// Lossy floating-point view, for display only.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl PartialEq for RechargeMultiplier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RechargeMultiplier {}

impl PartialOrd for RechargeMultiplier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RechargeMultiplier {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as u128 * other.denominator as u128;
        let rhs = other.numerator as u128 * self.denominator as u128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for RechargeMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.as_f64())
    }
}

/// Returns the recharge multiplier for an account with `fused_plasma`.
///
/// # Examples
///
/// ```
/// use fused_plasma::{recharge_rate_multiplier, RechargeMultiplier, THRESHOLD_PLASMA};
///
/// assert_eq!(recharge_rate_multiplier(1_000_000), RechargeMultiplier::ONE);
/// let double = recharge_rate_multiplier(2 * THRESHOLD_PLASMA);
/// assert_eq!(double.apply(1_000), 2_000);
/// ```
pub fn recharge_rate_multiplier(fused_plasma: u64) -> RechargeMultiplier {
    if fused_plasma >= THRESHOLD_PLASMA {
        RechargeMultiplier {
            numerator: fused_plasma,
            denominator: THRESHOLD_PLASMA,
        }
    } else {
        RechargeMultiplier::ONE
    }
}

/// Plasma restored after `confirmations` momentums at `base_recharge_rate`.
///
/// The result is not clamped to the fused allowance; that is the caller's
/// job.  Values beyond `u64::MAX` saturate.
pub fn recharged(fused_plasma: u64, confirmations: u64, base_recharge_rate: u64) -> u64 {
    let multiplier = recharge_rate_multiplier(fused_plasma);
    let raw = (confirmations as u128) * (base_recharge_rate as u128);
    u64::try_from(multiplier.apply(raw)).unwrap_or(u64::MAX)
}
