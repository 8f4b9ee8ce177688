// src/engine/mod.rs

//! Orchestration engine for watchrun.
//!
//! This module ties together:
//! - the debounce scheduler
//! - the fixed-cadence tick loop that drives it
//! - shutdown signalling (Ctrl-C)
//!
//! All scheduling and process state lives on the tick loop; the watcher
//! thread only ever touches the change queue.

use std::time::Duration;

/// Timing knobs for the tick loop, from `[config]`.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Time between scheduler ticks.
    pub tick_interval: Duration,
    /// Bounded wait used when polling each running process for output.
    pub poll_wait: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            poll_wait: Duration::from_millis(50),
        }
    }
}

pub mod runtime;

pub use runtime::Runtime;
