//! In-memory account and momentum store backing [`PlasmaAccessor`].
//!
//! A node serves the availability pipeline from its stake index and account
//! store; `LedgerSnapshot` packs the same information into one JSON document
//! so the CLI and the tests have a concrete collaborator to work against.

use crate::accessor::{AccessError, Address, FrontierBlock, MomentumReference, PlasmaAccessor};
use crate::availability::AvailabilityCalculator;
use crate::config::{ConfigError, FusionRatio};
use crate::error::PlasmaError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::Path};
use thiserror::Error;
use tracing::debug;

/// Per-account record.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LedgerAccount {
    /// Fused stake in base units.
    pub stake: u64,
    /// Stored confined plasma counter.
    pub confined_plasma: u64,
    /// Latest account block, `None` for an empty account chain.
    pub frontier_block: Option<FrontierBlock>,
}

/// Accounts plus the momentum chain, keyed by address.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerSnapshot {
    #[serde(default)]
    ratio: FusionRatio,
    #[serde(default)]
    accounts: HashMap<Address, LedgerAccount>,
    #[serde(default)]
    momentums: Vec<MomentumReference>,
}

/// Errors raised while loading or updating a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger I/O error: {0}")]
    /// File-system failure.
    Io(String),
    #[error("ledger decode error: {0}")]
    /// JSON encoding or decoding failure.
    Decode(String),
    #[error("momentum height {height} does not extend frontier {frontier}")]
    /// Momentums must be appended with strictly increasing heights.
    NonMonotonicMomentum {
        /// Current frontier height.
        frontier: u64,
        /// Rejected height.
        height: u64,
    },
    #[error("insufficient plasma: required {required}, available {available}")]
    /// The block needs more plasma than the account can spend.
    InsufficientPlasma {
        /// Plasma the block requires.
        required: u64,
        /// Plasma currently available.
        available: u64,
    },
    #[error("invalid fusion ratio: {0}")]
    /// The stored stake to plasma ratio is unusable.
    InvalidRatio(#[from] ConfigError),
    #[error(transparent)]
    /// Availability computation failed.
    Plasma(#[from] PlasmaError),
    #[error(transparent)]
    /// Account or momentum lookup failed.
    Access(#[from] AccessError),
}

impl LedgerSnapshot {
    /// Creates an empty ledger using `ratio` for stake conversion.
    pub fn new(ratio: FusionRatio) -> Self {
        Self {
            ratio,
            ..Self::default()
        }
    }

    /// Load from JSON; missing file -> empty ledger.  Missing sections
    /// default to empty and the fusion ratio is validated.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(path).map_err(|e| LedgerError::Io(e.to_string()))?;
        let ledger: Self =
            serde_json::from_slice(&bytes).map_err(|e| LedgerError::Decode(e.to_string()))?;
        ledger.ratio.validate()?;
        Ok(ledger)
    }

    /// Persist to JSON.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LedgerError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_vec_pretty(self).map_err(|e| LedgerError::Decode(e.to_string()))?;
        fs::write(path, data).map_err(|e| LedgerError::Io(e.to_string()))
    }

    /// Stake conversion ratio in use.
    pub fn ratio(&self) -> FusionRatio {
        self.ratio
    }

    /// Replaces the stake conversion ratio.
    pub fn set_ratio(&mut self, ratio: FusionRatio) {
        self.ratio = ratio;
    }

    /// Get account if present.
    pub fn account(&self, address: &Address) -> Option<&LedgerAccount> {
        self.accounts.get(address)
    }

    /// All known addresses, sorted.
    pub fn addresses(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.accounts.keys().cloned().collect();
        out.sort();
        out
    }

    /// Add fused stake for `address`.
    pub fn fuse(&mut self, address: &Address, amount: u64) {
        let acct = self.accounts.entry(address.clone()).or_default();
        acct.stake = acct.stake.saturating_add(amount);
    }

    /// Append a momentum; heights must strictly increase.
    pub fn push_momentum(&mut self, momentum: MomentumReference) -> Result<(), LedgerError> {
        if let Some(last) = self.momentums.last() {
            if momentum.height <= last.height {
                return Err(LedgerError::NonMonotonicMomentum {
                    frontier: last.height,
                    height: momentum.height,
                });
            }
        }
        self.momentums.push(momentum);
        Ok(())
    }

    /// Momentum stored at `height`.
    pub fn momentum(&self, height: u64) -> Result<MomentumReference, AccessError> {
        self.momentums
            .binary_search_by_key(&height, |m| m.height)
            .map(|idx| self.momentums[idx])
            .map_err(|_| AccessError::MomentumNotFound(height))
    }

    /// Records a new account block spending `plasma`, confirmed by the
    /// current frontier momentum.
    ///
    /// The stored confined counter becomes the currently confined plasma
    /// (after recharge) plus `plasma`.  Returns the new counter.
    pub fn confine_block(&mut self, address: &Address, plasma: u64) -> Result<u64, LedgerError> {
        let frontier = self.frontier_momentum()?;
        let acct = self
            .accounts
            .get(address)
            .ok_or_else(|| AccessError::AccountNotFound(address.clone()))?;
        let (confined, available, next_height) = match acct.frontier_block {
            Some(block) => {
                let report = AvailabilityCalculator::new(&*self).report(address)?;
                (report.confined, report.available, block.height + 1)
            }
            None => {
                let confined = acct.confined_plasma;
                let available = self.ratio.to_plasma(acct.stake).saturating_sub(confined);
                (confined, available, 1)
            }
        };
        if plasma > available {
            return Err(LedgerError::InsufficientPlasma {
                required: plasma,
                available,
            });
        }
        let stored = confined.saturating_add(plasma);
        let acct = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| AccessError::AccountNotFound(address.clone()))?;
        acct.confined_plasma = stored;
        acct.frontier_block = Some(FrontierBlock {
            height: next_height,
            confirmation_momentum: frontier,
        });
        debug!(%address, plasma, stored, momentum = frontier.height, "confined block plasma");
        Ok(stored)
    }
}

impl PlasmaAccessor for LedgerSnapshot {
    fn stake_beneficial_amount(&self, address: &Address) -> Result<u64, AccessError> {
        self.accounts
            .get(address)
            .map(|acct| acct.stake)
            .ok_or_else(|| AccessError::AccountNotFound(address.clone()))
    }

    fn fused_amount_to_plasma(&self, amount: u64) -> u64 {
        self.ratio.to_plasma(amount)
    }

    fn frontier_block(&self, address: &Address) -> Result<FrontierBlock, AccessError> {
        let acct = self
            .accounts
            .get(address)
            .ok_or_else(|| AccessError::AccountNotFound(address.clone()))?;
        acct.frontier_block
            .ok_or_else(|| AccessError::FrontierBlockMissing(address.clone()))
    }

    fn frontier_momentum(&self) -> Result<MomentumReference, AccessError> {
        self.momentums
            .last()
            .copied()
            .ok_or(AccessError::MomentumNotFound(0))
    }

    fn confined_plasma(&self, address: &Address) -> Result<u64, AccessError> {
        self.accounts
            .get(address)
            .map(|acct| acct.confined_plasma)
            .ok_or_else(|| AccessError::AccountNotFound(address.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FUSION_UNIT;

    fn momentum(height: u64, rate: u64) -> MomentumReference {
        MomentumReference {
            height,
            fusion_recharge_rate: rate,
        }
    }

    fn ledger_with_chain(len: u64, rate: u64) -> LedgerSnapshot {
        let mut ledger = LedgerSnapshot::new(FusionRatio::default());
        for height in 1..=len {
            ledger.push_momentum(momentum(height, rate)).unwrap();
        }
        ledger
    }

    #[test]
    fn momentums_must_increase() {
        let mut ledger = ledger_with_chain(3, 100);
        let err = ledger.push_momentum(momentum(3, 100)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::NonMonotonicMomentum {
                frontier: 3,
                height: 3
            }
        );
        assert_eq!(ledger.momentum(2).unwrap().height, 2);
        assert_eq!(
            ledger.momentum(9).unwrap_err(),
            AccessError::MomentumNotFound(9)
        );
    }

    #[test]
    fn first_block_confines_from_full_allowance() {
        let mut ledger = ledger_with_chain(1, 2_100);
        let alice = Address::from("z1alice");
        ledger.fuse(&alice, 10 * FUSION_UNIT);
        assert_eq!(ledger.confine_block(&alice, 21_000).unwrap(), 21_000);
        let block = ledger.frontier_block(&alice).unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.confirmation_momentum.height, 1);
        let calc = AvailabilityCalculator::new(&ledger);
        assert_eq!(calc.available_plasma(&alice).unwrap(), 0);
    }

    #[test]
    fn recharge_frees_plasma_for_the_next_block() {
        let mut ledger = ledger_with_chain(1, 2_100);
        let alice = Address::from("z1alice");
        ledger.fuse(&alice, 10 * FUSION_UNIT);
        ledger.confine_block(&alice, 21_000).unwrap();
        let err = ledger.confine_block(&alice, 21_000).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientPlasma {
                required: 21_000,
                available: 0
            }
        );
        for height in 2..=6 {
            ledger.push_momentum(momentum(height, 2_100)).unwrap();
        }
        // 5 confirmations * 2100 = 10500 recharged
        let calc = AvailabilityCalculator::new(&ledger);
        assert_eq!(calc.available_plasma(&alice).unwrap(), 10_500);
        assert_eq!(ledger.confine_block(&alice, 10_000).unwrap(), 20_500);
        assert_eq!(ledger.frontier_block(&alice).unwrap().height, 2);
    }

    #[test]
    fn account_without_blocks_reports_missing_frontier() {
        let mut ledger = ledger_with_chain(1, 2_100);
        let bob = Address::from("z1bob");
        ledger.fuse(&bob, FUSION_UNIT);
        assert_eq!(
            ledger.frontier_block(&bob).unwrap_err(),
            AccessError::FrontierBlockMissing(bob.clone())
        );
        assert_eq!(
            ledger.stake_beneficial_amount(&Address::from("z1nobody")),
            Err(AccessError::AccountNotFound(Address::from("z1nobody")))
        );
    }

    #[test]
    fn empty_chain_has_no_frontier() {
        let mut ledger = LedgerSnapshot::default();
        let alice = Address::from("z1alice");
        ledger.fuse(&alice, FUSION_UNIT);
        assert_eq!(
            ledger.confine_block(&alice, 1).unwrap_err(),
            LedgerError::Access(AccessError::MomentumNotFound(0))
        );
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("{name}_{nanos}.json"));
        path
    }

    #[test]
    fn zero_fusion_unit_fails_to_load() {
        let path = temp_path("plasma_zero_ratio");
        fs::write(
            &path,
            r#"{"ratio":{"fusion_unit":0,"plasma_per_fusion_unit":2100},
                "accounts":{"z1a":{"stake":5000000000,"confined_plasma":0,"frontier_block":null}},
                "momentums":[]}"#,
        )
        .unwrap();
        let result = LedgerSnapshot::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(LedgerError::InvalidRatio(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn sections_default_to_empty() {
        let path = temp_path("plasma_sparse_ledger");
        fs::write(
            &path,
            r#"{"accounts":{"z1a":{"stake":100000000,"confined_plasma":0,"frontier_block":null}}}"#,
        )
        .unwrap();
        let ledger = LedgerSnapshot::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(ledger.addresses(), vec![Address::from("z1a")]);
        assert_eq!(ledger.ratio(), FusionRatio::default());
        assert_eq!(
            ledger.frontier_momentum().unwrap_err(),
            AccessError::MomentumNotFound(0)
        );

        let path = temp_path("plasma_momentums_only");
        fs::write(&path, r#"{"momentums":[{"height":3,"fusion_recharge_rate":10}]}"#).unwrap();
        let ledger = LedgerSnapshot::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(ledger.addresses().is_empty());
        assert_eq!(ledger.frontier_momentum().unwrap().height, 3);
    }

    #[test]
    fn first_block_respects_stored_confined_counter() {
        let mut ledger = ledger_with_chain(1, 2_100);
        let carol = Address::from("z1carol");
        ledger.fuse(&carol, 10 * FUSION_UNIT);
        ledger.accounts.get_mut(&carol).unwrap().confined_plasma = 15_000;
        assert_eq!(
            ledger.confine_block(&carol, 21_000).unwrap_err(),
            LedgerError::InsufficientPlasma {
                required: 21_000,
                available: 6_000
            }
        );
        assert_eq!(ledger.confine_block(&carol, 6_000).unwrap(), 21_000);
    }

    #[test]
    fn save_and_load_preserve_state() {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("plasma_ledger_{nanos}.json"));

        let mut ledger = ledger_with_chain(2, 500);
        let alice = Address::from("z1alice");
        ledger.fuse(&alice, 3 * FUSION_UNIT);
        ledger.confine_block(&alice, 1_000).unwrap();
        ledger.save(&path).unwrap();

        let loaded = LedgerSnapshot::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded.account(&alice), ledger.account(&alice));
        assert_eq!(loaded.frontier_momentum().unwrap().height, 2);
        assert_eq!(loaded.addresses(), vec![alice]);
    }
}
