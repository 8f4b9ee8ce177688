// src/sched/scheduler.rs

//! Tick-driven task scheduler.
//!
//! Once per tick, in this order:
//!
//! 1. **Promote**: pending instances whose window has expired are launched,
//!    unless an instance of the same task type is still running. Promotion
//!    rescans until a full pass makes no progress.
//! 2. **Reap**: every running process is polled (with a bounded wait for
//!    output); finished ones are reported and, on success, may schedule
//!    their `on_success` continuation.
//! 3. **Dispatch**: queued change events are drained and merged into
//!    pending instances (adding the path, pushing the window out), or open
//!    new ones.
//!
//! Per task type there is at most one pending and at most one running
//! instance; merges only ever target the pending one. Draining events last
//! means an event arriving during a tick never launches within that same
//! tick; it waits out its full debounce window first.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::events::ChangeReceiver;
use crate::exec::{LaunchSpec, ProcessRunner, RunStatus, RunningTask};
use crate::report::{ReportSink, RunOutcome};
use crate::sched::instance::{ActiveTask, PendingTask};
use crate::task::{TaskId, TaskRegistry};

/// Owns all scheduling state. Driven by [`tick`](Scheduler::tick), which the
/// runtime calls on a fixed cadence; tests call it directly with crafted
/// instants.
pub struct Scheduler<R: ProcessRunner> {
    registry: TaskRegistry,
    changes: ChangeReceiver,
    runner: R,
    report: Box<dyn ReportSink>,
    pending: Vec<PendingTask>,
    running: Vec<ActiveTask<R::Run>>,
}

impl<R: ProcessRunner> fmt::Debug for Scheduler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.registry.len())
            .field("pending", &self.pending.len())
            .field("running", &self.running.len())
            .finish_non_exhaustive()
    }
}

impl<R: ProcessRunner> Scheduler<R> {
    pub fn new(
        registry: TaskRegistry,
        changes: ChangeReceiver,
        runner: R,
        report: Box<dyn ReportSink>,
    ) -> Self {
        Self {
            registry,
            changes,
            runner,
            report,
            pending: Vec::new(),
            running: Vec::new(),
        }
    }

    /// One scheduling cycle: promote, reap, dispatch.
    pub async fn tick(&mut self, now: Instant, poll_wait: Duration) {
        self.promote(now);
        self.reap(now, poll_wait).await;
        self.dispatch(now);
    }

    /// Launch every pending instance whose window has expired and whose task
    /// type is not already running.
    fn promote(&mut self, now: Instant) {
        loop {
            let due: Vec<usize> = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, p)| p.due_at <= now && !self.is_running_id(p.task))
                .map(|(idx, _)| idx)
                .collect();
            if due.is_empty() {
                return;
            }
            // Remove back to front so the collected indices stay valid.
            for idx in due.into_iter().rev() {
                let instance = self.pending.remove(idx);
                self.launch(instance, now);
            }
        }
    }

    fn launch(&mut self, instance: PendingTask, now: Instant) {
        let task = self.registry.get(instance.task);
        let name = task.name().to_string();
        let spec = LaunchSpec {
            name: name.clone(),
            argv: task.command.build_argv(&instance.paths),
            work_dir: task.work_dir.clone(),
            output_file: task.output_file.clone(),
            output_stream: task.output_stream.clone(),
        };

        info!(task = %name, paths = instance.paths.len(), "launching task");
        self.report.begin(&name);

        match self.runner.launch(spec) {
            Ok(run) => {
                self.running.push(ActiveTask {
                    task: instance.task,
                    paths: instance.paths,
                    started_at: now,
                    run,
                });
            }
            Err(err) => {
                warn!(task = %name, error = %err, "task failed to launch");
                self.report.finish(
                    &name,
                    &RunOutcome {
                        exit_code: -1,
                        elapsed: Duration::ZERO,
                    },
                );
            }
        }
    }

    /// Poll every running process; finalize the ones that exited.
    async fn reap(&mut self, now: Instant, poll_wait: Duration) {
        let mut finished: Vec<(usize, i32)> = Vec::new();
        for (idx, active) in self.running.iter_mut().enumerate() {
            match active.run.poll(poll_wait).await {
                RunStatus::Running => {}
                RunStatus::Exited(code) => finished.push((idx, code)),
            }
        }
        // Remove back to front so the collected indices stay valid.
        for (idx, code) in finished.into_iter().rev() {
            let done = self.running.remove(idx);
            self.finalize(done, code, now);
        }
    }

    fn finalize(&mut self, done: ActiveTask<R::Run>, exit_code: i32, now: Instant) {
        let task = self.registry.get(done.task);
        let name = task.name().to_string();
        let outcome = RunOutcome {
            exit_code,
            elapsed: now.duration_since(done.started_at),
        };

        info!(task = %name, exit_code, "task finished");
        self.report.finish(&name, &outcome);

        if !outcome.success() {
            return;
        }
        let Some(next) = self.registry.continuation_of(done.task) else {
            return;
        };
        self.schedule_continuation(done.task, next, done.paths, now);
    }

    /// Schedule `next` after a successful run of `finished`, unless either
    /// task type already has a pending or running instance. Finding a
    /// pending instance refreshes its window (without adding paths) instead
    /// of creating a second one.
    ///
    /// The continuation inherits the finished run's path set, so chains keep
    /// reporting what originally triggered them.
    fn schedule_continuation(
        &mut self,
        finished: TaskId,
        next: TaskId,
        paths: BTreeSet<String>,
        now: Instant,
    ) {
        if self.touch_pending(finished, now) || self.is_running_id(finished) {
            return;
        }
        if self.touch_pending(next, now) || self.is_running_id(next) {
            return;
        }

        let task = self.registry.get(next);
        debug!(task = %task.name(), "scheduling continuation");
        self.pending
            .push(PendingTask::new(next, paths, now + task.delay()));
    }

    /// Push the window of `task`'s pending instance (if any) out to now plus
    /// its delay, adding no path. Returns whether one was found.
    fn touch_pending(&mut self, task: TaskId, now: Instant) -> bool {
        let delay = self.registry.get(task).delay();
        match self.pending.iter_mut().find(|p| p.task == task) {
            Some(instance) => {
                instance.touch(now + delay);
                true
            }
            None => false,
        }
    }

    /// Drain the change queue and fold each event into the pending set.
    fn dispatch(&mut self, now: Instant) {
        let events = self.changes.drain();
        if events.is_empty() {
            return;
        }
        debug!(count = events.len(), "drained change events");

        for id in self.registry.ids() {
            let task = self.registry.get(id);
            let delay = task.delay();

            let mut matched: BTreeSet<String> = BTreeSet::new();
            for event in &events {
                if task.matches(&event.path) {
                    matched.insert(event.path.clone());
                }
            }
            if matched.is_empty() {
                continue;
            }

            match self.pending.iter_mut().find(|p| p.task == id) {
                Some(instance) => {
                    for path in matched {
                        instance.merge(path, now + delay);
                    }
                }
                None => {
                    debug!(
                        task = %task.name(),
                        paths = matched.len(),
                        "opening debounce window"
                    );
                    self.pending
                        .push(PendingTask::new(id, matched, now + delay));
                }
            }
        }
    }

    fn is_running_id(&self, task: TaskId) -> bool {
        self.running.iter().any(|a| a.task == task)
    }

    /// Number of pending (debouncing) instances.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of running instances.
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn has_pending(&self, task: &str) -> bool {
        match self.registry.id_of(task) {
            Some(id) => self.pending.iter().any(|p| p.task == id),
            None => false,
        }
    }

    pub fn is_running(&self, task: &str) -> bool {
        match self.registry.id_of(task) {
            Some(id) => self.is_running_id(id),
            None => false,
        }
    }

    /// Window deadline of the pending instance for `task`, if one exists.
    pub fn pending_due(&self, task: &str) -> Option<Instant> {
        let id = self.registry.id_of(task)?;
        self.pending.iter().find(|p| p.task == id).map(|p| p.due_at)
    }

    /// Coalesced paths of the pending instance for `task`, if one exists.
    pub fn pending_paths(&self, task: &str) -> Option<&BTreeSet<String>> {
        let id = self.registry.id_of(task)?;
        self.pending.iter().find(|p| p.task == id).map(|p| &p.paths)
    }
}
