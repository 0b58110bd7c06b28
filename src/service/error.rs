use crate::core::member::GroupId;
use crate::settlement::simplifier::SettleError;
use crate::split::resolver::SplitError;
use thiserror::Error;

/// Everything that can go wrong answering a balance or settlement query.
///
/// No partial results: either the full fold succeeds and the output
/// invariants hold, or the caller gets one of these. Only `StaleSnapshot`
/// is worth retrying, with a fresh snapshot; the rest are hard failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Settlement(#[from] SettleError),
    #[error("ledger sequence {requested} for {group} superseded by {latest}")]
    StaleSnapshot {
        group: GroupId,
        requested: u64,
        latest: u64,
    },
    #[error("unknown group {0}")]
    UnknownGroup(GroupId),
}
