// src/config/model.rs

//! TOML configuration model.
//!
//! A config file looks like:
//!
//! ```toml
//! [config]
//! tick_interval_ms = 250
//! poll_wait_ms = 50
//!
//! [default]
//! delay_ms = 2000
//! watch = ["src/**/*.py"]
//! exclude = ["src/**/*tmp.py"]
//!
//! [task.pytest]
//! cmd = "pytest -q"
//! output_file = "logs/pytest.out"
//! on_success = "lint"
//!
//! [task.lint]
//! cmd = "ruff check src"
//! watch = []
//! ```
//!
//! All sections are optional except that at least one `[task.<name>]` must
//! exist. [`RawConfigFile`] is the direct `serde` mapping; [`ConfigFile`] is
//! the validated form the rest of the application consumes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Debounce delay (ms) used when neither the task nor `[default]` sets one.
pub const DEFAULT_DELAY_MS: u64 = 5_000;

/// Top-level configuration exactly as deserialized from TOML, before
/// validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global scheduler cadence from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Fallbacks for `delay_ms`, `watch`, `exclude` from `[default]`.
    #[serde(default)]
    pub default: DefaultSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section: scheduler cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Milliseconds between scheduler ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Bounded wait (ms) when polling a running process for output.
    #[serde(default = "default_poll_wait_ms")]
    pub poll_wait_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_poll_wait_ms() -> u64 {
    50
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            poll_wait_ms: default_poll_wait_ms(),
        }
    }
}

/// `[default]` section: per-task fallbacks.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    /// Default debounce delay in milliseconds for tasks that do not set one.
    #[serde(default)]
    pub delay_ms: Option<u64>,

    /// Default `watch` patterns applied to tasks that do not override them.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Default `exclude` patterns applied to tasks that do not override them.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The command to execute, run through the platform shell.
    pub cmd: String,

    /// Debounce delay in milliseconds.
    ///
    /// If `None`, falls back to `default.delay_ms`, then to
    /// [`DEFAULT_DELAY_MS`].
    #[serde(default)]
    pub delay_ms: Option<u64>,

    /// Optional task-local watch patterns.
    ///
    /// If `None`, the task uses `default.watch` (or watches everything when
    /// that is empty too). An explicit empty list makes the task reachable
    /// only through `on_success` of another task.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Optional task-local exclude patterns.
    ///
    /// If `None`, the task uses `default.exclude`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// If true, `default.watch` is appended to `task.watch`.
    ///
    /// Otherwise, `task.watch` replaces `default.watch`.
    #[serde(default)]
    pub append_default_watch: bool,

    /// If true, `default.exclude` is appended to `task.exclude`.
    ///
    /// Otherwise, `task.exclude` replaces `default.exclude`.
    #[serde(default)]
    pub append_default_exclude: bool,

    /// If true, the coalesced changed paths are appended to the command as
    /// positional arguments (`"$@"` inside `cmd`).
    #[serde(default)]
    pub pass_paths: bool,

    /// Publish the process's combined stdout/stderr to this file once the
    /// process has finished.
    #[serde(default)]
    pub output_file: Option<PathBuf>,

    /// Stream the process's combined stdout/stderr into this file live.
    #[serde(default)]
    pub output_stream: Option<PathBuf>,

    /// Working directory for the spawned process.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Task to schedule whenever this one exits with code 0.
    #[serde(default)]
    pub on_success: Option<String>,
}

impl TaskConfig {
    /// Effective debounce delay given the `[default]` fallback.
    pub fn effective_delay(&self, default_delay_ms: Option<u64>) -> Duration {
        let ms = self
            .delay_ms
            .or(default_delay_ms)
            .unwrap_or(DEFAULT_DELAY_MS);
        Duration::from_millis(ms)
    }
}

/// A configuration that has passed validation (see `validate`).
///
/// Constructed via `ConfigFile::try_from(raw)`; the fields stay public for
/// read access but the only way in is through validation.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub default: DefaultSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            config,
            default,
            task,
        }
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}
