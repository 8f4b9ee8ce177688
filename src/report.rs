// src/report.rs

//! Status reporting for task runs.
//!
//! The scheduler announces lifecycle edges through a [`ReportSink`]:
//! one line when a task process starts and one when it finishes. Production
//! uses [`ConsoleReport`], which writes to stdout and flushes eagerly so the
//! lines interleave sensibly with task output streamed elsewhere; tests swap
//! in a recording sink.

use std::io::{self, Write};
use std::time::Duration;

/// Final result of one task run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    /// Exit code of the process; `-1` when no code was available (killed by
    /// a signal, or the process could not be launched at all).
    pub exit_code: i32,
    /// Wall-clock time from launch to the tick that observed the exit.
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Where task begin/finish lines go.
pub trait ReportSink: Send {
    /// Called once when a task process has been selected for launch.
    fn begin(&mut self, task: &str);

    /// Called once when a task process has finished (or failed to launch).
    fn finish(&mut self, task: &str, outcome: &RunOutcome);
}

/// Writes one-line status reports to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReport;

impl ConsoleReport {
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for ConsoleReport {
    fn begin(&mut self, task: &str) {
        let mut out = io::stdout();
        let _ = writeln!(out, "Begin: {task}");
        let _ = out.flush();
    }

    fn finish(&mut self, task: &str, outcome: &RunOutcome) {
        let status = if outcome.success() {
            "Success.".to_string()
        } else {
            format!("Failed: {}.", outcome.exit_code)
        };
        let secs = outcome.elapsed.as_secs_f64();
        let mut out = io::stdout();
        let _ = writeln!(out, "{task} ... {status} ({secs:.2} sec)");
        let _ = out.flush();
    }
}
