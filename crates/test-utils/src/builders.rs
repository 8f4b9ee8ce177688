#![allow(dead_code)]

use std::collections::BTreeMap;
use watchrun::config::{
    ConfigFile, ConfigSection, DefaultSection, RawConfigFile, TaskConfig,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                default: DefaultSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_global_watch(mut self, pattern: &str) -> Self {
        self.config.default.watch.push(pattern.to_string());
        self
    }

    pub fn with_global_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn with_default_delay_ms(mut self, ms: u64) -> Self {
        self.config.default.delay_ms = Some(ms);
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.config.config.tick_interval_ms = ms;
        self
    }

    pub fn with_poll_wait_ms(mut self, ms: u64) -> Self {
        self.config.config.poll_wait_ms = ms;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                delay_ms: None,
                watch: None,
                exclude: None,
                append_default_watch: false,
                append_default_exclude: false,
                pass_paths: false,
                output_file: None,
                output_stream: None,
                cwd: None,
                on_success: None,
            },
        }
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.task.delay_ms = Some(ms);
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        let watches = self.task.watch.get_or_insert(vec![]);
        watches.push(pattern.to_string());
        self
    }

    /// Explicit empty watch list: the task only runs via `on_success`.
    pub fn watch_nothing(mut self) -> Self {
        self.task.watch = Some(vec![]);
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        let excludes = self.task.exclude.get_or_insert(vec![]);
        excludes.push(pattern.to_string());
        self
    }

    pub fn append_default_watch(mut self, val: bool) -> Self {
        self.task.append_default_watch = val;
        self
    }

    pub fn append_default_exclude(mut self, val: bool) -> Self {
        self.task.append_default_exclude = val;
        self
    }

    pub fn pass_paths(mut self, val: bool) -> Self {
        self.task.pass_paths = val;
        self
    }

    pub fn output_file(mut self, path: &str) -> Self {
        self.task.output_file = Some(path.into());
        self
    }

    pub fn output_stream(mut self, path: &str) -> Self {
        self.task.output_stream = Some(path.into());
        self
    }

    pub fn cwd(mut self, dir: &str) -> Self {
        self.task.cwd = Some(dir.into());
        self
    }

    pub fn on_success(mut self, next: &str) -> Self {
        self.task.on_success = Some(next.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
