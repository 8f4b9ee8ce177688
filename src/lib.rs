// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod report;
pub mod sched;
pub mod task;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeOptions};
use crate::exec::ShellRunner;
use crate::report::ConsoleReport;
use crate::sched::Scheduler;
use crate::task::TaskRegistry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task registry
/// - the change queue + file watcher
/// - the tick-loop runtime with the real process runner
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    // Task descriptors from [task.*] + [default].
    let registry = TaskRegistry::from_config(&cfg)?;
    info!(tasks = registry.len(), "task registry built");

    let options = RuntimeOptions {
        tick_interval: Duration::from_millis(cfg.config.tick_interval_ms),
        poll_wait: Duration::from_millis(cfg.config.poll_wait_ms),
    };

    // Change queue: watcher callback in, scheduler out.
    let (change_tx, change_rx) = events::channel();

    let root_dir = config_root_dir(&config_path);
    let watcher = watch::spawn_watcher(root_dir, change_tx)?;

    // Ctrl-C → graceful shutdown.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(());
    });

    let scheduler = Scheduler::new(
        registry,
        change_rx,
        ShellRunner::new(),
        Box::new(ConsoleReport::new()),
    );
    let runtime = Runtime::new(scheduler, shutdown_rx, options);
    let result = runtime.run().await;

    drop(watcher);
    debug!("file watcher stopped");

    result.map_err(Into::into)
}

/// Figure out a sensible root directory for watching.
///
/// - If the config path has a non-empty parent (e.g. "configs/Watchrun.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Watchrun.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print tasks, delays and commands.
fn print_dry_run(cfg: &ConfigFile) {
    println!("watchrun dry-run");
    println!("  config.tick_interval_ms = {}", cfg.config.tick_interval_ms);
    println!("  config.poll_wait_ms = {}", cfg.config.poll_wait_ms);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        println!(
            "      delay: {:?}",
            task.effective_delay(cfg.default.delay_ms)
        );
        if let Some(ref watch) = task.watch {
            println!("      watch: {:?}", watch);
        }
        if let Some(ref exclude) = task.exclude {
            println!("      exclude: {:?}", exclude);
        }
        if task.pass_paths {
            println!("      pass_paths: true");
        }
        if let Some(ref path) = task.output_file {
            println!("      output_file: {}", path.display());
        }
        if let Some(ref path) = task.output_stream {
            println!("      output_stream: {}", path.display());
        }
        if let Some(ref dir) = task.cwd {
            println!("      cwd: {}", dir.display());
        }
        if let Some(ref next) = task.on_success {
            println!("      on_success: {next}");
        }
    }

    debug!("dry-run complete (no execution)");
}
