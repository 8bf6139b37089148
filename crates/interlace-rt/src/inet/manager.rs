use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use interlace_net::{Net, RuleBook};
use parking_lot::Mutex;

use super::dispatch::Dispatcher;
use super::report::{RunReport, StopReason};
use super::worker::Worker;
use crate::config::RunConfig;
use crate::error::RuntimeError;

/// The stages a run goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Initial full scan of the net.
    Scanning,
    /// Workers are rewriting; the coordinator watches for a stop condition.
    Draining,
    /// The queue is closed and the workers are being joined.
    ShuttingDown,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Scanning => "scanning",
            RunPhase::Draining => "draining",
            RunPhase::ShuttingDown => "shutting down",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// State shared between the coordinator and the workers of one run.
pub(crate) struct RunState<'a> {
    pub net: &'a Net,
    pub idle_wait: Duration,
    /// Steps left in the budget.
    remaining: AtomicU64,
    pub steps: AtomicU64,
    pub rewrites: AtomicU64,
    pub declined: AtomicU64,
    pub stale: AtomicU64,
    /// Raised by the first worker that finds the budget empty.
    pub budget_exhausted: AtomicBool,
    cancelled: AtomicBool,
    failure: Mutex<Option<RuntimeError>>,
}

impl<'a> RunState<'a> {
    fn new(net: &'a Net, config: &RunConfig) -> Self {
        Self {
            net,
            idle_wait: config.idle_wait,
            remaining: AtomicU64::new(config.max_steps),
            steps: AtomicU64::new(0),
            rewrites: AtomicU64::new(0),
            declined: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            budget_exhausted: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    /// Takes one step from the budget. Returns `false` once it is used up.
    pub fn reserve_step(&self) -> bool {
        let reserved = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if reserved {
            self.steps.fetch_add(1, Ordering::Relaxed);
        }
        reserved
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Stops every worker: they exit as soon as their current pair is done.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.net.pending().close();
    }

    /// Records a failure (the first one wins) and cancels the run.
    pub fn fail(&self, err: RuntimeError) {
        {
            let mut failure = self.failure.lock();
            if failure.is_none() {
                *failure = Some(err);
            } else {
                log::debug!("Run already failed, dropping: {err}");
            }
        }
        self.cancel();
    }

    fn has_failed(&self) -> bool {
        self.failure.lock().is_some()
    }
}

/// Coordinates a run: scans the net, starts the worker pool, decides when to stop and
/// collects the report.
#[derive(Debug, Clone)]
pub struct RuntimeManager {
    config: RunConfig,
    rules: RuleBook,
}

impl RuntimeManager {
    pub fn new(config: RunConfig, rules: RuleBook) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Reduces `net` until it is quiescent, the step budget or the deadline runs out, or
    /// a rule fails.
    ///
    /// Rule failures do not make this return `Err`: they stop the run and are reported in
    /// [`RunReport::failure`]. `Err` is reserved for runs that could not be carried out
    /// at all (bad configuration, a worker that could not be started).
    pub fn run(&self, net: Net) -> Result<RunReport, RuntimeError> {
        self.config.validate()?;
        let started = Instant::now();
        // A timeout too large to represent as an instant means no deadline.
        let deadline = started.checked_add(self.config.timeout);
        log::info!(
            "Starting run over {} agents: {} workers, timeout {:?}, at most {} steps, {} scan",
            net.len(),
            self.config.workers,
            self.config.timeout,
            self.config.max_steps,
            self.config.scan,
        );

        enter(RunPhase::Scanning);
        let initial = net.scan();
        log::debug!("Initial scan queued {initial} active pairs");

        let state = RunState::new(&net, &self.config);
        let dispatcher = Dispatcher::new(&net, &self.rules, self.config.scan);

        let (stop, fatal) = thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.config.workers);
            let mut fatal = None;
            for id in 0..self.config.workers {
                let worker = Worker { id, state: &state, dispatcher };
                let spawned = thread::Builder::new()
                    .name(format!("interlace-worker-{id}"))
                    .spawn_scoped(s, move || worker.run_loop());
                match spawned {
                    Ok(handle) => handles.push((id, handle)),
                    Err(err) => {
                        log::error!("Failed to spawn worker {id}: {err}");
                        fatal = Some(RuntimeError::SpawnFailed { id, message: err.to_string() });
                        break;
                    }
                }
            }

            let stop = if fatal.is_none() {
                enter(RunPhase::Draining);
                self.drain(&state, deadline)
            } else {
                StopReason::Failed
            };

            enter(RunPhase::ShuttingDown);
            state.cancel();
            for (id, handle) in handles {
                if handle.join().is_err() {
                    log::error!("Worker {id} panicked");
                    fatal.get_or_insert(RuntimeError::WorkerPanicked(id));
                }
            }
            (stop, fatal)
        });
        enter(RunPhase::Done);

        if let Some(err) = fatal {
            return Err(err);
        }

        let failure = state.failure.lock().take();
        let stop = if failure.is_some() { StopReason::Failed } else { stop };
        let steps = state.steps.load(Ordering::SeqCst);
        let rewrites = state.rewrites.load(Ordering::SeqCst);
        let declined = state.declined.load(Ordering::SeqCst);
        let stale = state.stale.load(Ordering::SeqCst);
        let elapsed = started.elapsed();
        drop(state);

        log::info!("Run {stop} after {steps} steps ({rewrites} rewrites) in {elapsed:?}");
        Ok(RunReport { net, stop, steps, rewrites, declined, stale, failure, elapsed })
    }

    /// The coordinator loop. Wakes whenever the queue changes, or every idle wait at
    /// the latest, and returns the first stop condition that holds.
    fn drain(&self, state: &RunState<'_>, deadline: Option<Instant>) -> StopReason {
        let queue = state.net.pending();
        loop {
            if state.has_failed() {
                return StopReason::Failed;
            }
            if state.budget_exhausted.load(Ordering::SeqCst) {
                log::warn!("Step budget of {} exhausted with work pending", self.config.max_steps);
                return StopReason::StepLimit;
            }
            // Idle means nothing queued and nothing in flight. The final scan catches any
            // pair a partial rescan may have missed; if it queues nothing and the queue is
            // still idle, no worker can produce more work.
            if queue.is_idle() && state.net.scan() == 0 && queue.is_idle() {
                return StopReason::Quiescent;
            }
            let mut wait = self.config.idle_wait;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    log::warn!("Deadline of {:?} passed with work pending", self.config.timeout);
                    return StopReason::Timeout;
                }
                wait = wait.min(deadline - now);
            }
            queue.wait_for_change(wait);
        }
    }
}

fn enter(phase: RunPhase) {
    log::debug!("Run phase: {phase}");
}
