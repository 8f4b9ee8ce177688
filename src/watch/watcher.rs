// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use tracing::info;

use crate::events::{ChangeEvent, ChangeKind, ChangeSender};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching; events
/// already queued still reach the scheduler.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes the given `root` directory
/// recursively and pushes a [`ChangeEvent`] for every created or modified
/// path.
///
/// The notify callback runs on the watcher's own thread and does nothing
/// but convert the path and push it onto the change queue; all matching and
/// debouncing happens on the scheduler side.
///
/// Failing to start the watcher (e.g. the root does not exist) is a fatal
/// error.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    changes: ChangeSender,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let callback_root = root.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let Some(kind) = change_kind(&event.kind) else {
                    return;
                };
                for path in event.paths {
                    let rel = relative_str(&callback_root, &path)
                        .unwrap_or_else(|| {
                            path.to_string_lossy().replace('\\', "/")
                        });
                    changes.push(ChangeEvent::new(rel, kind));
                }
            }
            Err(err) => {
                // We can't log via tracing here easily, so fall back to stderr.
                eprintln!("watchrun: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    Ok(WatcherHandle { _inner: watcher })
}

/// Map a notify event kind onto [`ChangeKind`].
///
/// Deletions and renames are dropped: tasks react to content appearing or
/// changing. Backends that only report a generic event are treated as
/// modifications.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Any => Some(ChangeKind::Modified),
        _ => None,
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Event paths sometimes arrive with a different absolute prefix than the
/// watch root (symlinks, `/private/var/...` on macOS), so if a direct
/// `strip_prefix` fails we canonicalize both sides and try again.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
