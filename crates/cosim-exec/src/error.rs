use cosim_core::{CosimError, Pass, Rank, Timestamp};
use cosim_rank::IndexError;
use thiserror::Error;

/// Terminal errors of the scheduler.
///
/// Load-time variants (`Load`, `DuplicateName`, `UnknownParent`,
/// `RankInversion`, `InitRejected`) fail `ExecBuilder::build` before the
/// thread pool or rank index exist.  Run-time variants carry the identity
/// and type of the offending object, the pass that was executing, and —
/// where applicable — the last committed timestamp; the scheduler never
/// recovers from any of them.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("model load failed: {0}")]
    Load(#[from] CosimError),

    #[error("duplicate object name '{0}'")]
    DuplicateName(String),

    #[error("parent '{parent}' of object '{object}' is not defined")]
    UnknownParent { object: String, parent: String },

    #[error("child '{object}' at {rank} does not outrank parent '{parent}' at {parent_rank}")]
    RankInversion {
        object:      String,
        rank:        Rank,
        parent:      String,
        parent_rank: Rank,
    },

    #[error("object '{object}' ({otype}) rejected configuration at init: {reason}")]
    InitRejected {
        object: String,
        otype:  String,
        reason: String,
    },

    #[error("rank index error: {0}")]
    Index(#[from] IndexError),

    #[error("thread pool rejected a job submission")]
    Submit,

    #[error("object '{object}' ({otype}) {reason} during {pass} at {at}")]
    ObjectFault {
        object:      String,
        otype:       String,
        pass:        Pass,
        at:          Timestamp,
        reason:      String,
        /// Last step that fully committed before the fault, if any.
        last_commit: Option<Timestamp>,
    },

    #[error(
        "bottom-up pass failed to converge after {iterations} sweeps at {at} \
         (non-converged: '{object}' ({otype}))"
    )]
    NonConvergence {
        at:          Timestamp,
        iterations:  usize,
        object:      String,
        otype:       String,
        /// Last step that fully committed before the failure, if any.
        last_commit: Option<Timestamp>,
    },
}

pub type ExecResult<T> = Result<T, ExecError>;
