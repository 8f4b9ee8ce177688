use std::sync::{Arc, Mutex};
use std::time::Duration;

use watchrun::report::{ReportSink, RunOutcome};

/// One observed report line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Begin {
        task: String,
    },
    Finish {
        task: String,
        exit_code: i32,
        elapsed: Duration,
    },
}

/// Shared log of report events, for assertions.
#[derive(Debug, Clone, Default)]
pub struct ReportLog {
    inner: Arc<Mutex<Vec<ReportEvent>>>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.inner.lock().unwrap().clone()
    }

    /// How many times `task` was reported as begun.
    pub fn begins_for(&self, task: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ReportEvent::Begin { task: t } if t == task))
            .count()
    }

    /// Exit codes reported for `task`, in finish order.
    pub fn finishes_for(&self, task: &str) -> Vec<i32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Finish {
                    task: t, exit_code, ..
                } if t == task => Some(exit_code),
                _ => None,
            })
            .collect()
    }
}

/// A [`ReportSink`] that records events into a shared [`ReportLog`].
pub struct MemoryReport {
    log: ReportLog,
}

impl MemoryReport {
    pub fn new(log: ReportLog) -> Self {
        Self { log }
    }
}

impl ReportSink for MemoryReport {
    fn begin(&mut self, task: &str) {
        self.log.inner.lock().unwrap().push(ReportEvent::Begin {
            task: task.to_string(),
        });
    }

    fn finish(&mut self, task: &str, outcome: &RunOutcome) {
        self.log.inner.lock().unwrap().push(ReportEvent::Finish {
            task: task.to_string(),
            exit_code: outcome.exit_code,
            elapsed: outcome.elapsed,
        });
    }
}
