//! Boundaries to the collaborators the add pipeline consumes.

use crate::bailout::{InstallFlags, IntegrityCheck, WorkspaceLayout};
use crate::error::Result;
use crate::lockfile::LockfileCache;
use crate::manifest::RootManifests;
use crate::types::ResolvedPackage;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;

/// Read-only view of the resolution stage.
///
/// Patterns are looked up by exact string. Implementations only need to
/// provide [`ResolverView::resolved_pattern`]; deduplication has a default
/// based on package identity.
pub trait ResolverView {
    /// Returns the package a pattern resolved to, if any.
    fn resolved_pattern(&self, pattern: &str) -> Option<&ResolvedPackage>;

    /// Collapses patterns that resolved to the same package, keeping the
    /// first pattern of each group in input order.
    ///
    /// All unresolved patterns fall into one group, so only the first of
    /// them survives.
    fn dedupe_patterns(&self, patterns: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        patterns
            .iter()
            .filter(|pattern| seen.insert(self.resolved_pattern(pattern).map(ResolvedPackage::key)))
            .cloned()
            .collect()
    }
}

/// Loads and persists the root manifests of a project.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Loads one document per registry. Missing files yield empty documents.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing manifest cannot be read or parsed.
    async fn load(&self) -> Result<RootManifests>;

    /// Persists every modified document and returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns an error if any document cannot be written. In that case no
    /// target file has been replaced.
    async fn save(&self, manifests: &mut RootManifests) -> Result<Vec<PathBuf>>;
}

/// Compares the current request against the record of the last install.
pub trait IntegrityChecker {
    /// Checks the request patterns against the recorded integrity state.
    ///
    /// # Errors
    ///
    /// Returns an error if the integrity record exists but cannot be read.
    fn check(
        &self,
        patterns: &[String],
        lockfile: &LockfileCache,
        flags: &InstallFlags,
        layout: &WorkspaceLayout,
    ) -> Result<IntegrityCheck>;
}
