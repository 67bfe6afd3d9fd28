//! Dependency checks: are a stack's executables on `PATH`?
//!
//! Resolution goes through [`ExecutableLookup`] so the checks never spawn a
//! process and can be exercised without touching the real search path.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::stack::Registry;

/// Resolves executable names to paths.
pub trait ExecutableLookup {
    /// Return the resolved path, or `None` if `name` is not an executable
    /// on the search path.
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Whether `name` resolves at all.
    fn is_available(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// Lookup against the process's inherited `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLookup;

impl ExecutableLookup for PathLookup {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Result of checking a dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "dependency")]
pub enum DependencyStatus {
    /// Every name resolved.
    Satisfied,
    /// The first name that failed to resolve.
    Missing(String),
}

impl DependencyStatus {
    /// `true` when every dependency resolved.
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Check `names` in order, stopping at the first one that does not resolve.
#[instrument(skip(lookup))]
pub fn check_dependencies<L>(names: &[&str], lookup: &L) -> DependencyStatus
where
    L: ExecutableLookup + ?Sized,
{
    for name in names {
        if !lookup.is_available(name) {
            debug!(dependency = name, "dependency missing");
            return DependencyStatus::Missing((*name).to_string());
        }
    }
    debug!(count = names.len(), "all dependencies resolved");
    DependencyStatus::Satisfied
}

/// One dependency and where it resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    /// Executable name.
    pub name: String,
    /// Resolved path, if found.
    pub path: Option<PathBuf>,
}

/// Availability of one stack's dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct StackStatus {
    /// Stack id.
    pub id: String,
    /// Stack title.
    pub title: String,
    /// Every dependency, probed individually.
    pub tools: Vec<ToolStatus>,
    /// Whether all of them resolved.
    pub ready: bool,
}

/// Probe every dependency of every registered stack.
///
/// Unlike [`check_dependencies`] this does not short-circuit; it is meant
/// for diagnostics where the full picture matters.
#[instrument(skip_all)]
pub fn stack_report<L>(registry: &Registry, lookup: &L) -> Vec<StackStatus>
where
    L: ExecutableLookup + ?Sized,
{
    registry
        .list_all()
        .iter()
        .map(|stack| {
            let tools: Vec<ToolStatus> = stack
                .dependencies
                .iter()
                .map(|name| ToolStatus {
                    name: (*name).to_string(),
                    path: lookup.resolve(name),
                })
                .collect();
            let ready = tools.iter().all(|tool| tool.path.is_some());
            StackStatus {
                id: stack.id.to_string(),
                title: stack.title.to_string(),
                tools,
                ready,
            }
        })
        .collect()
}
