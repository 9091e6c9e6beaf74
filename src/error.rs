//! Error types surfaced by the availability pipeline.

use crate::accessor::AccessError;
use thiserror::Error;

/// Errors that abort an availability computation.
///
/// Mempool admission must treat every variant as "reject", never as zero
/// available plasma.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlasmaError {
    #[error(
        "inconsistent chain state: frontier momentum {frontier_height} is behind confirmation momentum {confirmation_height}"
    )]
    /// The frontier momentum precedes the account's confirmation momentum.
    InconsistentChainState {
        /// Height of the momentum that confirmed the account's frontier block.
        confirmation_height: u64,
        /// Height of the network frontier momentum.
        frontier_height: u64,
    },
    #[error("external read failure: {0}")]
    /// An accessor collaborator failed; passed through unchanged.
    ExternalReadFailure(#[from] AccessError),
}
