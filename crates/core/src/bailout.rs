//! Early check that decides whether resolve/fetch/link can be skipped.

use crate::error::Result;
use crate::lockfile::LockfileCache;
use crate::traits::IntegrityChecker;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::instrument;

/// Install flags that participate in the integrity comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallFlags {
    /// Only production dependencies are installed.
    #[serde(default)]
    pub production: bool,
    /// Optional dependencies are skipped.
    #[serde(default)]
    pub ignore_optional: bool,
    /// Install without lockfile updates.
    #[serde(default)]
    pub frozen_lockfile: bool,
}

impl InstallFlags {
    /// Flag names as recorded in the integrity file, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        [
            (self.frozen_lockfile, "frozenLockfile"),
            (self.ignore_optional, "ignoreOptional"),
            (self.production, "production"),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| name.to_string())
        .collect()
    }
}

/// Where the project and its installed tree live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Directory the command runs in.
    pub cwd: PathBuf,
    /// Workspace root, if the project is part of a workspace.
    pub workspace_root: Option<PathBuf>,
    /// Directory holding the lockfile.
    pub lockfile_dir: PathBuf,
    /// Installed-modules directory.
    pub modules_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Layout for a standalone project rooted at `cwd`.
    #[must_use]
    pub fn standalone(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        Self {
            lockfile_dir: cwd.clone(),
            modules_dir: cwd.join("node_modules"),
            workspace_root: None,
            cwd,
        }
    }

    /// Returns `true` if the command runs at the workspace root itself.
    #[must_use]
    pub fn is_workspace_root(&self) -> bool {
        self.workspace_root.as_deref() == Some(self.cwd.as_path())
    }
}

/// Result of comparing a request with the integrity record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityCheck {
    /// No integrity record exists.
    pub integrity_file_missing: bool,
    /// The record matches the request, lockfile and flags.
    pub integrity_matches: bool,
    /// Request patterns absent from the record.
    pub missing_patterns: Vec<String>,
}

/// What the gate decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BailoutDecision {
    /// Skip the resolve/fetch/link pipeline. Always `false` for `add`.
    pub bailout: bool,
    /// Re-run lifecycle scripts for every package.
    pub force_scripts: bool,
}

/// Runs the bailout gate for an `add` invocation.
///
/// `add` must always persist manifests, so the gate never bails out. It
/// still consults the integrity checker: a missing integrity record next to
/// an existing lockfile means the installed tree cannot be trusted, and
/// lifecycle scripts are forced.
///
/// # Errors
///
/// Propagates integrity checker failures.
#[instrument(skip_all, fields(patterns = patterns.len(), has_lockfile_cache = lockfile.is_some()))]
pub fn should_bailout(
    patterns: &[String],
    lockfile: Option<&LockfileCache>,
    flags: &InstallFlags,
    layout: &WorkspaceLayout,
    checker: &impl IntegrityChecker,
    lockfile_on_disk: bool,
) -> Result<BailoutDecision> {
    let Some(lockfile) = lockfile else {
        tracing::debug!("No lockfile cache, running full pipeline");
        return Ok(BailoutDecision::default());
    };

    let check = checker.check(patterns, lockfile, flags, layout)?;
    let force_scripts = check.integrity_file_missing && lockfile_on_disk;
    if force_scripts {
        tracing::info!("Integrity file missing, forcing lifecycle scripts");
    }
    tracing::debug!(
        integrity_matches = check.integrity_matches,
        missing = check.missing_patterns.len(),
        "Integrity check finished"
    );

    Ok(BailoutDecision {
        bailout: false,
        force_scripts,
    })
}
