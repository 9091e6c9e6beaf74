//! Hook for limiting high-stake accounts.
//!
//! Accounts above the recharge threshold recharge faster than everybody else,
//! which would let them flood momentums.  Pairing the bonus with a per-account
//! transaction rate limit has been discussed but no policy is defined yet, so
//! only the pass-through [`Uncapped`] ships here.

use crate::accessor::Address;
use crate::error::PlasmaError;

/// Adjusts the available plasma of accounts that receive a recharge bonus.
///
/// Only consulted when [`RechargeMultiplier::is_bonus`] holds.  Must stay
/// deterministic for a fixed chain snapshot.
///
/// [`RechargeMultiplier::is_bonus`]: crate::RechargeMultiplier::is_bonus
pub trait HighStakeRateCap: Send + Sync {
    /// Returns the plasma the account may spend, at most `available`.
    fn limit(
        &self,
        address: &Address,
        frontier_height: u64,
        available: u64,
    ) -> Result<u64, PlasmaError>;
}

/// No cap: the computed available plasma is returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncapped;

impl HighStakeRateCap for Uncapped {
    fn limit(
        &self,
        _address: &Address,
        _frontier_height: u64,
        available: u64,
    ) -> Result<u64, PlasmaError> {
        Ok(available)
    }
}
