use interlace_net::{Kind, NetError, Pair, RuleError};
use thiserror::Error;

use crate::inet::types::WorkerId;

/// Errors specific to the Interlace runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Rule for kind `{kind}` failed on {pair}: {source}")]
    RuleFailure { pair: Pair, kind: Kind, source: RuleError },

    #[error("Rule panicked on {pair}: {message}")]
    RulePanicked { pair: Pair, message: String },

    #[error("Worker {0} panicked outside of a rule")]
    WorkerPanicked(WorkerId),

    #[error("Failed to spawn worker {id}: {message}")]
    SpawnFailed { id: WorkerId, message: String },

    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Net(#[from] NetError),
}
