use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use watchrun::errors::Result;
use watchrun::exec::{LaunchSpec, ProcessRunner, RunStatus, RunningTask};

/// Shared record of every launch a [`FakeRunner`] performed.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    inner: Arc<Mutex<Vec<LaunchSpec>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every launch so far, in order.
    pub fn launches(&self) -> Vec<LaunchSpec> {
        self.inner.lock().unwrap().clone()
    }

    /// Task names in launch order.
    pub fn names(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn count_for(&self, task: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == task)
            .count()
    }

    fn record(&self, spec: LaunchSpec) {
        self.inner.lock().unwrap().push(spec);
    }
}

/// Scripts how a [`FakeRunner`] behaves per task name. Clone it before
/// handing the runner to the scheduler to keep a control handle.
#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    inner: Arc<Mutex<ScriptState>>,
}

#[derive(Debug, Default)]
struct ScriptState {
    exit_codes: HashMap<String, i32>,
    held: HashSet<String>,
    released: HashMap<String, i32>,
    fail_launch: HashSet<String>,
}

impl FakeScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish launches of `task` immediately with this exit code.
    /// Unscripted tasks exit with 0.
    pub fn exit_with(&self, task: &str, code: i32) {
        self.inner
            .lock()
            .unwrap()
            .exit_codes
            .insert(task.to_string(), code);
    }

    /// Keep launches of `task` running until released.
    pub fn hold(&self, task: &str) {
        self.inner.lock().unwrap().held.insert(task.to_string());
    }

    /// Let the held instance of `task` finish with this exit code on its
    /// next poll.
    pub fn release(&self, task: &str, code: i32) {
        self.inner
            .lock()
            .unwrap()
            .released
            .insert(task.to_string(), code);
    }

    /// Make launches of `task` fail, as if the binary didn't exist.
    pub fn fail_launch(&self, task: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_launch
            .insert(task.to_string());
    }

    fn should_fail(&self, task: &str) -> bool {
        self.inner.lock().unwrap().fail_launch.contains(task)
    }

    fn poll(&self, task: &str) -> RunStatus {
        let mut state = self.inner.lock().unwrap();
        if state.held.contains(task) {
            match state.released.remove(task) {
                Some(code) => RunStatus::Exited(code),
                None => RunStatus::Running,
            }
        } else {
            RunStatus::Exited(state.exit_codes.get(task).copied().unwrap_or(0))
        }
    }
}

/// A fake process runner that records launches and completes them under
/// test control. By default every launch exits immediately with code 0.
pub struct FakeRunner {
    log: RunLog,
    script: FakeScript,
}

impl FakeRunner {
    pub fn new(log: RunLog, script: FakeScript) -> Self {
        Self { log, script }
    }
}

impl ProcessRunner for FakeRunner {
    type Run = FakeRun;

    fn launch(&mut self, spec: LaunchSpec) -> Result<FakeRun> {
        if self.script.should_fail(&spec.name) {
            return Err(anyhow::anyhow!(
                "injected launch failure for task '{}'",
                spec.name
            )
            .into());
        }
        let name = spec.name.clone();
        self.log.record(spec);
        Ok(FakeRun {
            name,
            script: self.script.clone(),
        })
    }
}

/// Handle for one fake launch.
pub struct FakeRun {
    name: String,
    script: FakeScript,
}

impl RunningTask for FakeRun {
    fn poll(
        &mut self,
        _wait: Duration,
    ) -> Pin<Box<dyn Future<Output = RunStatus> + Send + '_>> {
        let status = self.script.poll(&self.name);
        Box::pin(async move { status })
    }
}
