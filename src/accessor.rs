//! Read interface over account and momentum chain state.
//!
//! The availability pipeline never touches storage directly.  Everything it
//! needs is pulled through [`PlasmaAccessor`], which the node backs with its
//! stake index, account store and momentum chain.  [`LedgerSnapshot`] is an
//! in-memory implementation used by the CLI and the tests.
//!
//! [`LedgerSnapshot`]: crate::LedgerSnapshot

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Account chain address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A momentum height together with the recharge rate it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumReference {
    /// Momentum height.
    pub height: u64,
    /// Fused plasma recharged per confirmation at this point of the chain.
    pub fusion_recharge_rate: u64,
}

/// Latest locally known block of an account chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierBlock {
    /// Account chain height of the block.
    pub height: u64,
    /// Momentum that confirmed the block.
    pub confirmation_momentum: MomentumReference,
}

/// Immutable snapshot of the account fields the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Account address.
    pub address: Address,
    /// Fused stake in base units.
    pub stake: u64,
    /// Stored confined plasma counter.
    pub confined_plasma: u64,
    /// Frontier block of the account chain.
    pub frontier_block: FrontierBlock,
}

/// Failures raised by accessor collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("account {0} not found")]
    /// The address is unknown to the stake index or account store.
    AccountNotFound(Address),
    #[error("account {0} has no frontier block")]
    /// The account chain is empty.
    FrontierBlockMissing(Address),
    #[error("momentum at height {0} not found")]
    /// A referenced momentum is missing from the chain index.
    MomentumNotFound(u64),
    #[error("storage error: {0}")]
    /// Backing store failure.
    Storage(String),
}

/// Narrow read interface consumed by the availability pipeline.
///
/// Implementations must be side-effect free; the pipeline may call them
/// concurrently from many threads.
pub trait PlasmaAccessor: Send + Sync {
    /// Stake currently fused for the benefit of `address`, in base units.
    fn stake_beneficial_amount(&self, address: &Address) -> Result<u64, AccessError>;

    /// Converts a fused stake amount into plasma.
    fn fused_amount_to_plasma(&self, amount: u64) -> u64;

    /// Frontier block of the account chain.
    fn frontier_block(&self, address: &Address) -> Result<FrontierBlock, AccessError>;

    /// Current network frontier momentum.
    fn frontier_momentum(&self) -> Result<MomentumReference, AccessError>;

    /// Stored confined plasma counter of the account.
    fn confined_plasma(&self, address: &Address) -> Result<u64, AccessError>;

    /// Reads every account field in one go.
    fn account_snapshot(&self, address: &Address) -> Result<AccountSnapshot, AccessError> {
        Ok(AccountSnapshot {
            address: address.clone(),
            stake: self.stake_beneficial_amount(address)?,
            confined_plasma: self.confined_plasma(address)?,
            frontier_block: self.frontier_block(address)?,
        })
    }
}

impl<T: PlasmaAccessor + ?Sized> PlasmaAccessor for &T {
    fn stake_beneficial_amount(&self, address: &Address) -> Result<u64, AccessError> {
        (**self).stake_beneficial_amount(address)
    }

    fn fused_amount_to_plasma(&self, amount: u64) -> u64 {
        (**self).fused_amount_to_plasma(amount)
    }

    fn frontier_block(&self, address: &Address) -> Result<FrontierBlock, AccessError> {
        (**self).frontier_block(address)
    }

    fn frontier_momentum(&self) -> Result<MomentumReference, AccessError> {
        (**self).frontier_momentum()
    }

    fn confined_plasma(&self, address: &Address) -> Result<u64, AccessError> {
        (**self).confined_plasma(address)
    }
}
