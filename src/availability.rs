//! Available fused plasma for an account chain.
//!
//! The computation runs as a short pipeline of pure stages:
//!
//! 1. [`fused_plasma`] converts the account's fused stake into plasma.
//! 2. [`recharged_plasma`] measures how much of it was restored since the
//!    momentum that confirmed the account's frontier block.
//! 3. [`confined_plasma`] subtracts the recharge from the stored confined
//!    counter.
//! 4. [`available_plasma`] is what remains of the fused allowance.
//!
//! [`AvailabilityCalculator`] reads one consistent snapshot through a
//! [`PlasmaAccessor`] and feeds it through the stages.  Nothing is cached and
//! nothing is written back: lowering the stored confined counter is the
//! account store's business once the account sends its next block.

use crate::accessor::{AccountSnapshot, Address, MomentumReference, PlasmaAccessor};
use crate::error::PlasmaError;
use crate::rate_cap::{HighStakeRateCap, Uncapped};
use crate::recharge::{recharge_rate_multiplier, recharged, RechargeMultiplier};
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Full trace of one availability computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlasmaReport {
    /// Account the report belongs to.
    pub address: Address,
    /// Height of the frontier momentum the report was computed against.
    pub frontier_height: u64,
    /// Plasma derived from the fused stake.
    pub fused: u64,
    /// Momentums elapsed since the frontier block was confirmed.
    pub confirmations: u64,
    /// Recharge rate of the confirmation momentum.
    pub base_recharge_rate: u64,
    /// Stake-tiered recharge multiplier.
    pub multiplier: RechargeMultiplier,
    /// Plasma restored since confirmation, at most `fused`.
    pub recharged: u64,
    /// Plasma still confined after the recharge.
    pub confined: u64,
    /// Plasma the account may spend right now.
    pub available: u64,
}

/// Stage 1: fused stake converted to plasma.
pub fn fused_plasma<A: PlasmaAccessor + ?Sized>(accessor: &A, account: &AccountSnapshot) -> u64 {
    let fused = accessor.fused_amount_to_plasma(account.stake);
    trace!(address = %account.address, stake = account.stake, fused, "fused plasma");
    fused
}

/// Momentums elapsed between the account's confirmation momentum and `frontier`.
///
/// Fails with [`PlasmaError::InconsistentChainState`] when the frontier is
/// behind the confirmation momentum.
pub fn confirmations(
    account: &AccountSnapshot,
    frontier: &MomentumReference,
) -> Result<u64, PlasmaError> {
    let confirmation = &account.frontier_block.confirmation_momentum;
    frontier.height.checked_sub(confirmation.height).ok_or_else(|| {
        warn!(
            address = %account.address,
            confirmation_height = confirmation.height,
            frontier_height = frontier.height,
            "frontier momentum behind confirmation momentum"
        );
        PlasmaError::InconsistentChainState {
            confirmation_height: confirmation.height,
            frontier_height: frontier.height,
        }
    })
}

/// Stage 2: plasma recharged since the frontier block was confirmed,
/// clamped to `[0, fused]`.
pub fn recharged_plasma(
    account: &AccountSnapshot,
    frontier: &MomentumReference,
    fused: u64,
) -> Result<u64, PlasmaError> {
    let confirmations = confirmations(account, frontier)?;
    let rate = account
        .frontier_block
        .confirmation_momentum
        .fusion_recharge_rate;
    let restored = recharged(fused, confirmations, rate).min(fused);
    trace!(address = %account.address, confirmations, rate, restored, "recharged plasma");
    Ok(restored)
}

/// Stage 3: stored confined plasma minus the recharge, floored at zero.
pub fn confined_plasma(account: &AccountSnapshot, recharged: u64) -> u64 {
    let confined = account.confined_plasma.saturating_sub(recharged);
    trace!(address = %account.address, stored = account.confined_plasma, confined, "confined plasma");
    confined
}

/// Stage 4: fused plasma not currently confined, floored at zero.
pub fn available_plasma(fused: u64, confined: u64) -> u64 {
    fused.saturating_sub(confined)
}

/// Public entry point composing the accessor reads with the pipeline stages.
pub struct AvailabilityCalculator<A, C = Uncapped> {
    accessor: A,
    rate_cap: C,
}

impl<A: PlasmaAccessor> AvailabilityCalculator<A> {
    /// Creates a calculator without a high-stake rate cap.
    pub fn new(accessor: A) -> Self {
        Self {
            accessor,
            rate_cap: Uncapped,
        }
    }
}

impl<A: PlasmaAccessor, C: HighStakeRateCap> AvailabilityCalculator<A, C> {
    /// Replaces the high-stake rate cap.
    pub fn with_rate_cap<D: HighStakeRateCap>(self, rate_cap: D) -> AvailabilityCalculator<A, D> {
        AvailabilityCalculator {
            accessor: self.accessor,
            rate_cap,
        }
    }

    /// Borrow the underlying accessor.
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Maximum plasma `address` may spend right now.
    pub fn available_plasma(&self, address: &Address) -> Result<u64, PlasmaError> {
        self.report(address).map(|report| report.available)
    }

    /// Runs the pipeline and returns every intermediate value.
    pub fn report(&self, address: &Address) -> Result<PlasmaReport, PlasmaError> {
        let account = self.accessor.account_snapshot(address)?;
        let frontier = self.accessor.frontier_momentum()?;
        self.report_for(&account, &frontier)
    }

    /// Runs the pipeline over an already captured snapshot.
    pub fn report_for(
        &self,
        account: &AccountSnapshot,
        frontier: &MomentumReference,
    ) -> Result<PlasmaReport, PlasmaError> {
        let fused = fused_plasma(&self.accessor, account);
        let confirmations = confirmations(account, frontier)?;
        let recharged = recharged_plasma(account, frontier, fused)?;
        let confined = confined_plasma(account, recharged);
        let multiplier = recharge_rate_multiplier(fused);
        let mut available = available_plasma(fused, confined);
        if multiplier.is_bonus() {
            available = self
                .rate_cap
                .limit(&account.address, frontier.height, available)?
                .min(available);
        }
        debug!(
            address = %account.address,
            frontier_height = frontier.height,
            fused,
            recharged,
            confined,
            available,
            "available plasma"
        );
        Ok(PlasmaReport {
            address: account.address.clone(),
            frontier_height: frontier.height,
            fused,
            confirmations,
            base_recharge_rate: account
                .frontier_block
                .confirmation_momentum
                .fusion_recharge_rate,
            multiplier,
            recharged,
            confined,
            available,
        })
    }

    /// Returns true when `address` can currently spend `required` plasma.
    pub fn can_afford(&self, address: &Address, required: u64) -> Result<bool, PlasmaError> {
        Ok(self.available_plasma(address)? >= required)
    }

    /// Evaluates many accounts, in parallel where available.
    ///
    /// Results keep the order of `addresses`; one failing account does not
    /// affect the others.
    pub fn report_batch(&self, addresses: &[Address]) -> Vec<Result<PlasmaReport, PlasmaError>> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            addresses.par_iter().map(|addr| self.report(addr)).collect()
        }
        #[cfg(target_arch = "wasm32")]
        {
            addresses.iter().map(|addr| self.report(addr)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{AccessError, FrontierBlock};
    use crate::constants::THRESHOLD_PLASMA;

    /// Accessor serving a single account; stake is given directly in plasma.
    struct Fixed {
        account: AccountSnapshot,
        frontier: MomentumReference,
    }

    impl Fixed {
        fn new(fused: u64, confined: u64, confirmation: u64, frontier: u64, rate: u64) -> Self {
            Self {
                account: AccountSnapshot {
                    address: Address::from("z1test"),
                    stake: fused,
                    confined_plasma: confined,
                    frontier_block: FrontierBlock {
                        height: 1,
                        confirmation_momentum: MomentumReference {
                            height: confirmation,
                            fusion_recharge_rate: rate,
                        },
                    },
                },
                frontier: MomentumReference {
                    height: frontier,
                    fusion_recharge_rate: rate,
                },
            }
        }

        fn check(&self, address: &Address) -> Result<(), AccessError> {
            if *address == self.account.address {
                Ok(())
            } else {
                Err(AccessError::AccountNotFound(address.clone()))
            }
        }
    }

    impl PlasmaAccessor for Fixed {
        fn stake_beneficial_amount(&self, address: &Address) -> Result<u64, AccessError> {
            self.check(address)?;
            Ok(self.account.stake)
        }

        fn fused_amount_to_plasma(&self, amount: u64) -> u64 {
            amount
        }

        fn frontier_block(&self, address: &Address) -> Result<FrontierBlock, AccessError> {
            self.check(address)?;
            Ok(self.account.frontier_block)
        }

        fn frontier_momentum(&self) -> Result<MomentumReference, AccessError> {
            Ok(self.frontier)
        }

        fn confined_plasma(&self, address: &Address) -> Result<u64, AccessError> {
            self.check(address)?;
            Ok(self.account.confined_plasma)
        }
    }

    fn addr() -> Address {
        Address::from("z1test")
    }

    #[test]
    fn small_stake_recharges_at_base_rate() {
        let calc = AvailabilityCalculator::new(Fixed::new(1_000_000, 500_000, 100, 110, 1_000));
        let report = calc.report(&addr()).unwrap();
        assert_eq!(report.multiplier, RechargeMultiplier::ONE);
        assert_eq!(report.confirmations, 10);
        assert_eq!(report.recharged, 10_000);
        assert_eq!(report.confined, 490_000);
        assert_eq!(report.available, 510_000);
    }

    #[test]
    fn double_threshold_recharges_twice_as_fast() {
        let calc = AvailabilityCalculator::new(Fixed::new(
            2 * THRESHOLD_PLASMA,
            1_000_000,
            20,
            25,
            1_000,
        ));
        let report = calc.report(&addr()).unwrap();
        assert_eq!(report.multiplier.apply(1), 2);
        assert_eq!(report.recharged, 10_000);
        assert_eq!(report.confined, 990_000);
        assert_eq!(report.available, 3_210_000);
    }

    #[test]
    fn frontier_behind_confirmation_is_rejected() {
        let calc = AvailabilityCalculator::new(Fixed::new(1_000_000, 0, 11, 10, 1_000));
        let err = calc.available_plasma(&addr()).unwrap_err();
        assert_eq!(
            err,
            PlasmaError::InconsistentChainState {
                confirmation_height: 11,
                frontier_height: 10,
            }
        );
    }

    #[test]
    fn nothing_confined_means_full_allowance() {
        let calc = AvailabilityCalculator::new(Fixed::new(1_000_000, 0, 10, 10, 1_000));
        let report = calc.report(&addr()).unwrap();
        assert_eq!(report.confined, 0);
        assert_eq!(report.available, 1_000_000);
    }

    #[test]
    fn recharge_never_exceeds_fused_allowance() {
        let calc = AvailabilityCalculator::new(Fixed::new(50_000, 50_000, 0, 1_000_000, 210_000));
        let report = calc.report(&addr()).unwrap();
        assert_eq!(report.recharged, 50_000);
        assert_eq!(report.available, 50_000);
    }

    #[test]
    fn confined_above_fused_leaves_nothing_available() {
        let calc = AvailabilityCalculator::new(Fixed::new(10_000, 90_000, 5, 5, 1_000));
        assert_eq!(calc.available_plasma(&addr()).unwrap(), 0);
        assert!(!calc.can_afford(&addr(), 1).unwrap());
        assert!(calc.can_afford(&addr(), 0).unwrap());
    }

    #[test]
    fn unknown_account_propagates_read_failure() {
        let calc = AvailabilityCalculator::new(Fixed::new(1, 0, 0, 0, 0));
        let missing = Address::from("z1other");
        assert_eq!(
            calc.available_plasma(&missing).unwrap_err(),
            PlasmaError::ExternalReadFailure(AccessError::AccountNotFound(missing))
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let calc = AvailabilityCalculator::new(Fixed::new(3_000_000, 700_000, 3, 9, 2_100));
        let first = calc.report(&addr()).unwrap();
        let second = calc.report(&addr()).unwrap();
        assert_eq!(first, second);
    }

    struct Halve;

    impl HighStakeRateCap for Halve {
        fn limit(&self, _: &Address, _: u64, available: u64) -> Result<u64, PlasmaError> {
            Ok(available / 2)
        }
    }

    #[test]
    fn rate_cap_only_applies_to_bonus_accounts() {
        let small =
            AvailabilityCalculator::new(Fixed::new(1_000_000, 0, 0, 0, 0)).with_rate_cap(Halve);
        assert_eq!(small.available_plasma(&addr()).unwrap(), 1_000_000);

        let large = AvailabilityCalculator::new(Fixed::new(2 * THRESHOLD_PLASMA, 0, 0, 0, 0))
            .with_rate_cap(Halve);
        assert_eq!(large.available_plasma(&addr()).unwrap(), THRESHOLD_PLASMA);
    }

    #[test]
    fn batch_keeps_input_order_and_isolates_failures() {
        let calc = AvailabilityCalculator::new(Fixed::new(1_000_000, 500_000, 100, 110, 1_000));
        let results = calc.report_batch(&[addr(), Address::from("z1nope"), addr()]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().available, 510_000);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().available, 510_000);
    }
}
