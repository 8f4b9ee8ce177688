// src/sched/instance.rs

//! Scheduler instance state: one debouncing window or one live process.

use std::collections::BTreeSet;

use tokio::time::Instant;

use crate::task::TaskId;

/// A debouncing instance of one task type.
///
/// Accumulates changed paths until its window expires; every merge pushes
/// the deadline out again.
#[derive(Debug, Clone)]
pub struct PendingTask {
    pub(crate) task: TaskId,
    pub(crate) paths: BTreeSet<String>,
    pub(crate) due_at: Instant,
}

impl PendingTask {
    pub(crate) fn new(
        task: TaskId,
        paths: impl IntoIterator<Item = String>,
        due_at: Instant,
    ) -> Self {
        Self {
            task,
            paths: paths.into_iter().collect(),
            due_at,
        }
    }

    /// Add one changed path and push the window out.
    pub(crate) fn merge(&mut self, path: impl Into<String>, due_at: Instant) {
        self.paths.insert(path.into());
        self.due_at = due_at;
    }

    /// Push the window out without adding a path.
    pub(crate) fn touch(&mut self, due_at: Instant) {
        self.due_at = due_at;
    }

    pub fn due_at(&self) -> Instant {
        self.due_at
    }

    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }
}

/// A launched instance: the process handle plus what it was launched with.
///
/// `paths` is kept until the process finishes so a successful run can hand
/// its trigger set on to its continuation.
pub struct ActiveTask<H> {
    pub(crate) task: TaskId,
    pub(crate) paths: BTreeSet<String>,
    pub(crate) started_at: Instant,
    pub(crate) run: H,
}
