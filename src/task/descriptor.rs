// src/task/descriptor.rs

//! Task descriptors: the static definition of one schedulable task type.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::watch::PathMatcher;

/// Debounce delay applied when neither the task nor `[default]` sets one.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// How a descriptor turns a coalesced path set into a command line.
#[derive(Clone)]
pub enum CommandSpec {
    /// Fixed argument vector, paths ignored.
    Argv(Vec<String>),
    /// Shell one-liner run via `sh -c` (or `cmd /C` on Windows).
    ///
    /// With `pass_paths` the coalesced paths are appended as positional
    /// arguments, reachable from the template as `"$@"`.
    Shell { template: String, pass_paths: bool },
    /// Closure building the argument vector from the coalesced paths.
    Builder(Arc<dyn Fn(&BTreeSet<String>) -> Vec<String> + Send + Sync>),
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSpec::Argv(argv) => f.debug_tuple("Argv").field(argv).finish(),
            CommandSpec::Shell {
                template,
                pass_paths,
            } => f
                .debug_struct("Shell")
                .field("template", template)
                .field("pass_paths", pass_paths)
                .finish(),
            CommandSpec::Builder(_) => f.debug_struct("Builder").finish_non_exhaustive(),
        }
    }
}

impl CommandSpec {
    /// Fixed argument vector.
    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Argv(args.into_iter().map(Into::into).collect())
    }

    /// Shell one-liner; coalesced paths are not passed to the command.
    pub fn shell(template: impl Into<String>) -> Self {
        CommandSpec::Shell {
            template: template.into(),
            pass_paths: false,
        }
    }

    /// Shell one-liner with the coalesced paths appended as `"$@"`.
    pub fn shell_with_paths(template: impl Into<String>) -> Self {
        CommandSpec::Shell {
            template: template.into(),
            pass_paths: true,
        }
    }

    /// Closure building the argument vector from the coalesced paths.
    pub fn builder(
        f: impl Fn(&BTreeSet<String>) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        CommandSpec::Builder(Arc::new(f))
    }

    /// Materialize the argument vector for one launch.
    pub(crate) fn build_argv(&self, paths: &BTreeSet<String>) -> Vec<String> {
        match self {
            CommandSpec::Argv(argv) => argv.clone(),
            CommandSpec::Shell {
                template,
                pass_paths,
            } => shell_argv(template, *pass_paths, paths),
            CommandSpec::Builder(f) => f(paths),
        }
    }
}

fn shell_argv(template: &str, pass_paths: bool, paths: &BTreeSet<String>) -> Vec<String> {
    let mut argv: Vec<String> = if cfg!(windows) {
        vec!["cmd".into(), "/C".into(), template.into()]
    } else {
        vec!["sh".into(), "-c".into(), template.into()]
    };
    if pass_paths {
        if !cfg!(windows) {
            // Placeholder for $0 so the paths land in "$@".
            argv.push("sh".into());
        }
        argv.extend(paths.iter().cloned());
    }
    argv
}

/// Static definition of one task type: what to run, when, and where the
/// output goes.
///
/// Built either from the TOML config or directly in code:
///
/// ```
/// use std::time::Duration;
/// use watchrun::task::{CommandSpec, TaskDescriptor};
/// use watchrun::watch::PathMatcher;
///
/// let task = TaskDescriptor::new("unit-tests", CommandSpec::shell("cargo test"))
///     .with_delay(Duration::from_millis(500))
///     .with_filter(PathMatcher::predicate(|p| p.ends_with(".rs")))
///     .with_on_success("lint");
/// ```
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub(crate) name: String,
    pub(crate) command: CommandSpec,
    pub(crate) delay: Duration,
    pub(crate) matcher: PathMatcher,
    pub(crate) output_file: Option<PathBuf>,
    pub(crate) output_stream: Option<PathBuf>,
    pub(crate) work_dir: Option<PathBuf>,
    pub(crate) on_success: Option<String>,
}

impl TaskDescriptor {
    /// New descriptor with the default debounce delay and an accept-all
    /// path filter.
    pub fn new(name: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            command,
            delay: DEFAULT_DELAY,
            matcher: PathMatcher::AcceptAll,
            output_file: None,
            output_stream: None,
            work_dir: None,
            on_success: None,
        }
    }

    /// Set the debounce delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the path filter.
    pub fn with_filter(mut self, matcher: PathMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Capture combined stdout/stderr and publish it to this file when the
    /// process finishes.
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Stream combined stdout/stderr into this file live, line by line.
    pub fn with_output_stream(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_stream = Some(path.into());
        self
    }

    /// Working directory for the spawned process.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Name of the task to schedule whenever this one exits successfully.
    pub fn with_on_success(mut self, task: impl Into<String>) -> Self {
        self.on_success = Some(task.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn on_success(&self) -> Option<&str> {
        self.on_success.as_deref()
    }

    /// Whether this task cares about the given root-relative path.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.matches(rel_path)
    }
}
