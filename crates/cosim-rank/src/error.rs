use cosim_core::Rank;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Allocation failure while growing a bucket or the rank table.
    /// Recoverable at model load — the caller may retry or abort the load.
    #[error("rank index allocation failed: {0}")]
    Capacity(#[from] std::collections::TryReserveError),

    #[error("rank {0} is not a valid bucket key")]
    InvalidRank(Rank),
}
