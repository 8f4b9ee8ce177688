// src/engine/runtime.rs

use std::fmt;

use tokio::sync::oneshot;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ProcessRunner;
use crate::sched::Scheduler;

use super::RuntimeOptions;

/// Drives the scheduler on a fixed cadence until shutdown is requested.
///
/// This is a thin IO shell around [`Scheduler`], which contains all the
/// scheduling semantics. The loop does exactly two things: tick the
/// scheduler every `tick_interval`, and watch the shutdown channel.
///
/// Shutdown is cooperative: the loop stops ticking, but task processes that
/// are still running are left to finish on their own.
pub struct Runtime<R: ProcessRunner> {
    scheduler: Scheduler<R>,
    shutdown: oneshot::Receiver<()>,
    options: RuntimeOptions,
}

impl<R: ProcessRunner> fmt::Debug for Runtime<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: ProcessRunner> Runtime<R> {
    pub fn new(
        scheduler: Scheduler<R>,
        shutdown: oneshot::Receiver<()>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            shutdown,
            options,
        }
    }

    /// Main loop: tick until the shutdown channel fires (or closes).
    pub async fn run(mut self) -> Result<()> {
        info!(
            tick_interval = ?self.options.tick_interval,
            poll_wait = ?self.options.poll_wait,
            "watchrun runtime started"
        );

        let mut ticker = interval(self.options.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.scheduler
                        .tick(Instant::now(), self.options.poll_wait)
                        .await;
                }
                res = &mut self.shutdown => {
                    match res {
                        Ok(()) => info!("shutdown requested; stopping runtime"),
                        Err(_) => debug!("shutdown channel closed; stopping runtime"),
                    }
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }
}
