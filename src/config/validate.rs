// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchrunError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.default, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_commands(cfg)?;
    validate_continuations(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(WatchrunError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.tick_interval_ms == 0 {
        return Err(WatchrunError::ConfigError(
            "[config].tick_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_commands(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(WatchrunError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

/// Every `on_success` must name a defined task.
///
/// A task may name itself; that is a deliberate repeat-while-successful
/// loop, throttled by the debounce delay.
fn validate_continuations(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if let Some(next) = task.on_success.as_deref() {
            if !cfg.task.contains_key(next) {
                return Err(WatchrunError::ConfigError(format!(
                    "task '{}' has unknown task '{}' in `on_success`",
                    name, next
                )));
            }
        }
    }
    Ok(())
}
