use std::fmt;
use std::time::Duration;

use interlace_net::Net;

use crate::error::RuntimeError;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No active pair is pending or in flight, and a final scan found none.
    Quiescent,
    /// The step budget ran out with work still pending.
    StepLimit,
    /// The deadline passed first.
    Timeout,
    /// A rule failed or panicked; see [`RunReport::failure`].
    Failed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Quiescent => "quiescent",
            StopReason::StepLimit => "step limit reached",
            StopReason::Timeout => "timed out",
            StopReason::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Outcome of a run: the net as the workers left it plus what happened to it.
#[derive(Debug)]
pub struct RunReport {
    pub net: Net,
    pub stop: StopReason,
    /// Pairs dispatched, whatever the outcome.
    pub steps: u64,
    pub rewrites: u64,
    pub declined: u64,
    pub stale: u64,
    /// The first rule failure, when `stop` is [`StopReason::Failed`].
    pub failure: Option<RuntimeError>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_quiescent(&self) -> bool {
        self.stop == StopReason::Quiescent
    }

    /// Turns a failed run into its error. Budget and deadline stops are not errors.
    pub fn into_result(mut self) -> Result<Self, RuntimeError> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
