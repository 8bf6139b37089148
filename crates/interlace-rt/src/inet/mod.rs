//! Parallel reduction of interaction nets.
//!
//! A run starts with a full scan that queues every active pair of the net. A fixed pool
//! of workers then pops pairs from the shared queue and hands each to the
//! [`Dispatcher`], which claims the pair's neighbourhood, runs the rule for the pair's
//! first agent and rescans for the active pairs the rewrite created. The
//! [`RuntimeManager`] watches the queue and stops the pool on quiescence, when the step
//! budget or the deadline runs out, or on the first rule failure.

use std::time::Duration;

use interlace_net::{Net, RuleBook};

use crate::config::RunConfig;
use crate::error::RuntimeError;

pub mod dispatch;
mod manager;
mod report;
pub mod types;
mod worker;

pub use dispatch::{Dispatched, Dispatcher};
pub use manager::{RunPhase, RuntimeManager};
pub use report::{RunReport, StopReason};

/// Reduces `net` with `rules` on a default-sized worker pool.
///
/// Shorthand for a [`RuntimeManager`] built from [`RunConfig::default`] with the given
/// deadline and step budget.
pub fn run(
    net: Net,
    rules: RuleBook,
    timeout: Duration,
    max_steps: u64,
) -> Result<RunReport, RuntimeError> {
    let config = RunConfig::default().with_timeout(timeout).with_max_steps(max_steps);
    RuntimeManager::new(config, rules).run(net)
}
