#![deny(missing_docs)]

//! # fused_plasma
//!
//! Spendable fused plasma for account chains.
//!
//! Fusing QSR grants an account a plasma allowance.  Every account block spends
//! part of it, and the spent share stays *confined* until it recharges.  The
//! recharge clock is the momentum chain: each momentum elapsed since the
//! account's frontier block was confirmed restores the confirmation momentum's
//! recharge rate, scaled up linearly for accounts that fused at least
//! [`THRESHOLD_PLASMA`].
//!
//! The crate computes the currently available plasma as a pipeline of pure
//! stages over a read-only [`PlasmaAccessor`]:
//!
//! * [`fused_plasma`]: stake converted to plasma;
//! * [`recharged_plasma`]: plasma restored since confirmation, capped at the
//!   fused allowance;
//! * [`confined_plasma`]: stored confined plasma minus the recharge;
//! * [`available_plasma`]: fused plasma not currently confined.
//!
//! All quantities are `u64` and intermediate products are computed in 128-bit
//! space, so results are identical across nodes and never wrap.
//!
//! ## Usage
//!
//! ```rust
//! use fused_plasma::{
//!     Address, AvailabilityCalculator, FusionRatio, LedgerSnapshot, MomentumReference,
//! };
//!
//! let mut ledger = LedgerSnapshot::new(FusionRatio::default());
//! ledger
//!     .push_momentum(MomentumReference { height: 1, fusion_recharge_rate: 2_100 })
//!     .unwrap();
//! let alice = Address::from("z1alice");
//! ledger.fuse(&alice, 10 * 100_000_000);
//! ledger.confine_block(&alice, 21_000).unwrap();
//!
//! let calc = AvailabilityCalculator::new(&ledger);
//! assert_eq!(calc.available_plasma(&alice).unwrap(), 0);
//! ```

pub mod accessor;
pub mod availability;
pub mod config;
pub mod constants;
mod error;
pub mod ledger;
pub mod rate_cap;
pub mod recharge;
pub mod schedule;

pub use accessor::{
    AccessError, AccountSnapshot, Address, FrontierBlock, MomentumReference, PlasmaAccessor,
};
pub use availability::{
    available_plasma, confined_plasma, confirmations, fused_plasma, recharged_plasma,
    AvailabilityCalculator, PlasmaReport,
};
pub use config::{ConfigError, FusionRatio, PlasmaConfig};
pub use constants::THRESHOLD_PLASMA;
pub use error::PlasmaError;
pub use ledger::{LedgerAccount, LedgerError, LedgerSnapshot};
pub use rate_cap::{HighStakeRateCap, Uncapped};
pub use recharge::{recharge_rate_multiplier, recharged, RechargeMultiplier};
pub use schedule::{
    fusion_recharge_rate_target, next_base_price, next_difficulty_per_plasma,
    next_fusion_recharge_rate, target_offset_multiplier, MomentumPlasmaStats, ScheduleError,
};
