#![allow(dead_code)]

pub use watchrun_test_utils::{init_tracing, with_timeout};

use std::time::Duration;

use watchrun::events::{self, ChangeEvent, ChangeKind, ChangeSender};
use watchrun::sched::Scheduler;
use watchrun::task::{CommandSpec, TaskDescriptor, TaskRegistry};
use watchrun_test_utils::fake_runner::{FakeRunner, FakeScript, RunLog};
use watchrun_test_utils::report::{MemoryReport, ReportLog};

/// Scheduler wired to a fake runner and a recording report sink, plus the
/// control handles tests drive it with.
pub struct Harness {
    pub scheduler: Scheduler<FakeRunner>,
    pub changes: ChangeSender,
    pub log: RunLog,
    pub script: FakeScript,
    pub report: ReportLog,
}

pub fn harness(tasks: Vec<TaskDescriptor>) -> Harness {
    let registry = TaskRegistry::new(tasks).expect("valid test registry");
    let (changes, rx) = events::channel();
    let log = RunLog::new();
    let script = FakeScript::new();
    let report = ReportLog::new();
    let scheduler = Scheduler::new(
        registry,
        rx,
        FakeRunner::new(log.clone(), script.clone()),
        Box::new(MemoryReport::new(report.clone())),
    );
    Harness {
        scheduler,
        changes,
        log,
        script,
        report,
    }
}

/// Change event for a modified path.
pub fn touched(path: &str) -> ChangeEvent {
    ChangeEvent::new(path, ChangeKind::Modified)
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Command whose argv is exactly the coalesced path set, so tests can
/// assert on what a launch saw.
pub fn paths_as_argv() -> CommandSpec {
    CommandSpec::builder(|paths| paths.iter().cloned().collect())
}
