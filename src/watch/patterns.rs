// src/watch/patterns.rs

//! Path matching for task descriptors.
//!
//! Each task carries a [`PathMatcher`] deciding which changed paths feed its
//! debounce window. Matchers see paths relative to the watch root, with
//! forward slashes (e.g. `"src/foo/bar.py"`).
//!
//! Three forms exist:
//! - `AcceptAll`: the default when no patterns are configured.
//! - `Globs`: include/exclude glob sets compiled from config. An *empty*
//!   include list matches nothing, which is how continuation-only tasks are
//!   expressed (`watch = []`).
//! - `Predicate`: an arbitrary closure, for library users building
//!   descriptors in code.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Decides whether a task cares about a changed path.
#[derive(Clone)]
pub enum PathMatcher {
    /// Every path matches.
    AcceptAll,
    /// Compiled include/exclude glob sets.
    Globs {
        include: GlobSet,
        exclude: Option<GlobSet>,
    },
    /// Custom predicate over the relative path.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMatcher::AcceptAll => f.debug_struct("AcceptAll").finish(),
            PathMatcher::Globs { .. } => f.debug_struct("Globs").finish_non_exhaustive(),
            PathMatcher::Predicate(_) => f.debug_struct("Predicate").finish_non_exhaustive(),
        }
    }
}

impl Default for PathMatcher {
    fn default() -> Self {
        PathMatcher::AcceptAll
    }
}

impl PathMatcher {
    /// Matcher that accepts every path.
    pub fn accept_all() -> Self {
        PathMatcher::AcceptAll
    }

    /// Matcher backed by a closure.
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        PathMatcher::Predicate(Arc::new(f))
    }

    /// Compile glob lists into a matcher.
    ///
    /// - `include = None` means "no opinion": accept everything (unless an
    ///   exclude list narrows it down).
    /// - `include = Some([])` matches nothing.
    /// - Empty or absent `exclude` excludes nothing.
    pub fn from_patterns(
        include: Option<&[String]>,
        exclude: Option<&[String]>,
    ) -> Result<Self> {
        let exclude_set = match exclude {
            Some(patterns) if !patterns.is_empty() => Some(
                build_globset(patterns).context("building exclude globset")?,
            ),
            _ => None,
        };

        match include {
            None => match exclude_set {
                None => Ok(PathMatcher::AcceptAll),
                Some(exclude) => {
                    // Accept-all with holes: include everything explicitly.
                    let include = build_globset(&["**".to_string()])?;
                    Ok(PathMatcher::Globs {
                        include,
                        exclude: Some(exclude),
                    })
                }
            },
            Some(patterns) => {
                let include =
                    build_globset(patterns).context("building watch globset")?;
                Ok(PathMatcher::Globs {
                    include,
                    exclude: exclude_set,
                })
            }
        }
    }

    /// Returns true if this matcher is interested in the given path
    /// (relative to the watch root).
    pub fn matches(&self, rel_path: &str) -> bool {
        match self {
            PathMatcher::AcceptAll => true,
            PathMatcher::Globs { include, exclude } => {
                if !include.is_match(rel_path) {
                    return false;
                }
                if let Some(exclude) = exclude {
                    if exclude.is_match(rel_path) {
                        return false;
                    }
                }
                true
            }
            PathMatcher::Predicate(f) => f(rel_path),
        }
    }
}

/// Decide the effective pattern list for one dimension (watch or exclude).
///
/// - If the task sets a list and asks to append, the result is
///   `task list + default list`.
/// - If the task sets a list without appending, only that list counts.
/// - If the task sets nothing, the default list applies; an empty default
///   means "no patterns configured" and yields `None`.
pub fn effective_patterns(
    task_list: Option<&Vec<String>>,
    default_list: &[String],
    append_default: bool,
) -> Option<Vec<String>> {
    match (task_list, append_default) {
        (Some(list), true) => {
            let mut combined = list.clone();
            combined.extend(default_list.iter().cloned());
            Some(combined)
        }
        (Some(list), false) => Some(list.clone()),
        (None, _) => {
            if default_list.is_empty() {
                None
            } else {
                Some(default_list.to_vec())
            }
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
