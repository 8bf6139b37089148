pub mod cut;
pub mod map;
pub mod square;

use interlace_net::{Net, RuleBook};
use interlace_rt::{RunConfig, RunReport, RuntimeManager, StopReason};

use crate::error::CliError;

/// Runs `net` to quiescence. Any other stop is an error, since the demos only print
/// fully reduced nets.
pub fn reduce(net: Net, rules: RuleBook, config: RunConfig) -> Result<RunReport, CliError> {
    let report = RuntimeManager::new(config, rules).run(net)?.into_result()?;
    log::info!(
        "{} steps: {} rewrites, {} declined, {} stale",
        report.steps,
        report.rewrites,
        report.declined,
        report.stale
    );
    match report.stop {
        StopReason::Quiescent => Ok(report),
        reason => Err(CliError::Incomplete { reason }),
    }
}
