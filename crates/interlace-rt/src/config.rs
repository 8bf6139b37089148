//! Run configuration.
//!
//! [`RunConfig`] is what the [`RuntimeManager`](crate::RuntimeManager) is built from. It
//! can be assembled in code with the builder setters or read from the `[run]` table of a
//! TOML file:
//!
//! ```toml
//! [run]
//! workers = 4
//! timeout_secs = 2.5
//! max_steps = 100000
//! scan = "touched"
//! idle_wait_ms = 5
//! ```
//!
//! Missing keys keep their defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::RuntimeError;

/// How the dispatcher looks for new active pairs after a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Rescan the whole net.
    #[default]
    Full,
    /// Rescan only the agents the rewrite wrote to or spawned.
    Touched,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Full => f.write_str("full"),
            ScanMode::Touched => f.write_str("touched"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(ScanMode::Full),
            "touched" => Ok(ScanMode::Touched),
            other => Err(format!("unknown scan mode `{other}` (expected `full` or `touched`)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Wall-clock budget for the whole run.
    #[serde(rename = "timeout_secs", deserialize_with = "secs")]
    pub timeout: Duration,
    /// Maximum number of interactions dispatched.
    pub max_steps: u64,
    pub scan: ScanMode,
    /// How long a worker blocks on an empty queue before re-checking for cancellation,
    /// and the coordinator's poll interval.
    #[serde(rename = "idle_wait_ms", deserialize_with = "millis")]
    pub idle_wait: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            timeout: Duration::from_secs(5),
            max_steps: 1000,
            scan: ScanMode::Full,
            idle_wait: Duration::from_millis(10),
        }
    }
}

impl RunConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_scan(mut self, scan: ScanMode) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Checks the values a run cannot start with.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.workers == 0 {
            return Err(RuntimeError::InvalidConfig("at least one worker is required".into()));
        }
        if self.idle_wait.is_zero() {
            return Err(RuntimeError::InvalidConfig("idle wait must be non-zero".into()));
        }
        Ok(())
    }
}

fn secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
