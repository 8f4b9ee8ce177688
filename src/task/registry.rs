// src/task/registry.rs

//! The validated set of task descriptors the scheduler works with.

use std::collections::HashMap;

use crate::config::model::ConfigFile;
use crate::errors::{Result, WatchrunError};
use crate::task::descriptor::{CommandSpec, TaskDescriptor};
use crate::watch::{effective_patterns, PathMatcher};

/// Opaque handle identifying one descriptor inside a [`TaskRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

/// Immutable collection of task descriptors, validated on construction:
/// names are unique and every `on_success` reference resolves.
///
/// `on_success` may point at the task itself; such a task reschedules
/// itself for as long as it keeps succeeding.
#[derive(Debug)]
pub struct TaskRegistry {
    tasks: Vec<TaskDescriptor>,
    by_name: HashMap<String, TaskId>,
    continuations: Vec<Option<TaskId>>,
}

impl TaskRegistry {
    /// Build a registry from descriptors, rejecting duplicate names and
    /// dangling `on_success` references.
    pub fn new(tasks: Vec<TaskDescriptor>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(WatchrunError::ConfigError(
                "no tasks defined".to_string(),
            ));
        }

        let mut by_name = HashMap::with_capacity(tasks.len());
        for (idx, task) in tasks.iter().enumerate() {
            if by_name.insert(task.name.clone(), TaskId(idx)).is_some() {
                return Err(WatchrunError::ConfigError(format!(
                    "duplicate task name: {}",
                    task.name
                )));
            }
        }

        let mut continuations = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let next = match task.on_success.as_deref() {
                None => None,
                Some(name) => match by_name.get(name) {
                    Some(id) => Some(*id),
                    None => {
                        return Err(WatchrunError::TaskNotFound(format!(
                            "on_success of task {} refers to unknown task {name}",
                            task.name
                        )));
                    }
                },
            };
            continuations.push(next);
        }

        Ok(Self {
            tasks,
            by_name,
            continuations,
        })
    }

    /// Build descriptors from a validated config file.
    ///
    /// Task order follows the config's (sorted) task table; delays and
    /// watch/exclude lists fall back to `[default]` where the task leaves
    /// them unset.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let default = cfg.default_section();
        let mut tasks = Vec::with_capacity(cfg.tasks().len());

        for (name, task_cfg) in cfg.tasks() {
            let watch = effective_patterns(
                task_cfg.watch.as_ref(),
                &default.watch,
                task_cfg.append_default_watch,
            );
            let exclude = effective_patterns(
                task_cfg.exclude.as_ref(),
                &default.exclude,
                task_cfg.append_default_exclude,
            );
            let matcher =
                PathMatcher::from_patterns(watch.as_deref(), exclude.as_deref())
                    .map_err(|err| {
                        WatchrunError::ConfigError(format!(
                            "task {name}: {err:#}"
                        ))
                    })?;

            let command = if task_cfg.pass_paths {
                CommandSpec::shell_with_paths(&task_cfg.cmd)
            } else {
                CommandSpec::shell(&task_cfg.cmd)
            };

            let mut task = TaskDescriptor::new(name.clone(), command)
                .with_delay(task_cfg.effective_delay(default.delay_ms))
                .with_filter(matcher);
            if let Some(path) = &task_cfg.output_file {
                task = task.with_output_file(path);
            }
            if let Some(path) = &task_cfg.output_stream {
                task = task.with_output_stream(path);
            }
            if let Some(dir) = &task_cfg.cwd {
                task = task.with_work_dir(dir);
            }
            if let Some(next) = &task_cfg.on_success {
                task = task.with_on_success(next);
            }
            tasks.push(task);
        }

        Self::new(tasks)
    }

    pub fn get(&self, id: TaskId) -> &TaskDescriptor {
        &self.tasks[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.by_name.get(name).copied()
    }

    /// Resolved `on_success` target for this task, if any.
    pub fn continuation_of(&self, id: TaskId) -> Option<TaskId> {
        self.continuations[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..self.tasks.len()).map(TaskId)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
