// src/sched/mod.rs

//! Debounce scheduling: pending windows, running instances, continuations.

pub mod instance;
pub mod scheduler;

pub use instance::{ActiveTask, PendingTask};
pub use scheduler::Scheduler;
