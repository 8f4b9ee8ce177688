// src/exec/runner.rs

//! Pluggable process runner abstraction.
//!
//! The scheduler launches and polls task processes through these traits
//! instead of touching `tokio::process` directly. This makes it easy to swap
//! in a fake runner in tests while keeping the production implementation in
//! [`process`](super::process).
//!
//! - [`ShellRunner`](super::ShellRunner) is the default implementation: it
//!   spawns real OS processes and captures their output.
//! - Tests can provide their own [`ProcessRunner`] that records launches and
//!   completes them under test control.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::Result;

/// Everything the runner needs to start one task process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Task name, for logging and error reports.
    pub name: String,
    /// Full argument vector; `argv[0]` is the program.
    pub argv: Vec<String>,
    /// Working directory for the process, if the task sets one.
    pub work_dir: Option<PathBuf>,
    /// Publish captured output here once the process finishes.
    pub output_file: Option<PathBuf>,
    /// Stream output here live, line by line.
    pub output_stream: Option<PathBuf>,
}

/// What a poll observed about a running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Still going; poll again next tick.
    Running,
    /// Exited with this code (`-1` when no code was available).
    Exited(i32),
}

/// Starts task processes.
///
/// Production code uses [`ShellRunner`](super::ShellRunner); tests can
/// provide their own implementation that doesn't spawn real processes.
pub trait ProcessRunner: Send {
    type Run: RunningTask + Send;

    /// Start one process. An error here means the process never existed;
    /// the scheduler reports the instance as failed and moves on.
    fn launch(&mut self, spec: LaunchSpec) -> Result<Self::Run>;
}

/// One live task process.
///
/// `poll` is called once per scheduler tick. Implementations should pump any
/// available output within the bounded `wait` and then report whether the
/// process has exited. A `RunStatus::Exited` must be final: the scheduler
/// drops the handle after seeing it.
pub trait RunningTask {
    fn poll(
        &mut self,
        wait: Duration,
    ) -> Pin<Box<dyn Future<Output = RunStatus> + Send + '_>>;
}
