// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running task commands, using
//! `tokio::process::Command`, and for exposing the seam the scheduler polls
//! them through.
//!
//! - [`runner`] provides the `ProcessRunner` / `RunningTask` traits and the
//!   `LaunchSpec` handed over by the scheduler; tests replace the runner
//!   with a fake implementation.
//! - [`process`] is the production runner: real processes, merged
//!   stdout/stderr capture, staged output publishing.

pub mod process;
pub mod runner;

pub use process::{RunningProc, ShellRunner};
pub use runner::{LaunchSpec, ProcessRunner, RunStatus, RunningTask};
