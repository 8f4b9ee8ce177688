// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `watch` / `exclude` glob patterns per task into a
//!   [`PathMatcher`].
//! - Wiring up a cross-platform filesystem watcher (`notify`) that feeds
//!   the change queue.
//!
//! It does **not** know about debounce windows or running processes; it
//! only turns filesystem changes into root-relative change events.

pub mod patterns;
pub mod watcher;

pub use patterns::{effective_patterns, PathMatcher};
pub use watcher::{spawn_watcher, WatcherHandle};
