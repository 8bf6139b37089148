// interlace-rt/src/inet/worker.rs

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;

use interlace_net::Pop;

use super::dispatch::{Dispatched, Dispatcher};
use super::manager::RunState;
use super::types::WorkerId;
use crate::error::RuntimeError;

/// A worker thread of the pool.
///
/// Workers share one pending queue. Each loops popping a pair, reserving a step from the
/// run's budget, dispatching the pair, and reporting it complete, until the queue is
/// closed or the run is cancelled.
pub(crate) struct Worker<'a> {
    pub id: WorkerId,
    pub state: &'a RunState<'a>,
    pub dispatcher: Dispatcher<'a>,
}

impl Worker<'_> {
    /// The main execution loop for the worker thread.
    pub fn run_loop(&self) -> Result<(), RuntimeError> {
        log::debug!("Worker {} entering run loop", self.id);
        let queue = self.state.net.pending();

        while !self.state.is_cancelled() {
            let pair = match queue.pop(self.state.idle_wait) {
                Pop::Pair(pair) => pair,
                Pop::Empty => continue,
                Pop::Closed => break,
            };

            if self.state.is_cancelled() {
                queue.requeue(pair);
                break;
            }
            if !self.state.reserve_step() {
                log::debug!("Worker {}: step budget exhausted, putting {pair} back", self.id);
                self.state.budget_exhausted.store(true, Ordering::SeqCst);
                queue.requeue(pair);
                break;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatcher.dispatch(pair)));
            let result = match outcome {
                Ok(Ok(dispatched)) => {
                    self.state.count(dispatched);
                    Ok(())
                }
                Ok(Err(err)) => Err(err),
                Err(payload) => Err(RuntimeError::RulePanicked {
                    pair,
                    message: panic_message(payload.as_ref()),
                }),
            };

            // A failure is recorded before the pair is completed, so the coordinator
            // never sees an idle queue without also seeing the failure.
            if let Err(err) = result {
                log::error!("Worker {}: {err}", self.id);
                self.state.fail(err.clone());
                queue.complete();
                return Err(err);
            }
            queue.complete();
        }

        log::debug!("Worker {} exiting run loop", self.id);
        Ok(())
    }
}

impl RunState<'_> {
    fn count(&self, dispatched: Dispatched) {
        let counter = match dispatched {
            Dispatched::Rewrote { .. } => &self.rewrites,
            Dispatched::Declined => &self.declined,
            Dispatched::Stale => &self.stale,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
