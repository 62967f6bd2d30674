//! Merges added packages into the root manifests.

use crate::error::{Error, Result};
use crate::manifest::{PatternOriginIndex, RootManifests};
use crate::rewrite::CanonicalPatterns;
use crate::traits::ResolverView;
use crate::types::{DependencyOrigin, Registry};
use crate::version_spec::{SaveOptions, resolve_version_spec};
use serde::Serialize;
use std::collections::HashSet;
use tracing::instrument;

/// A dependency written to a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedDependency {
    /// Package name.
    pub name: String,
    /// Registry whose manifest received the entry.
    pub registry: Registry,
    /// Section the entry was written to.
    pub origin: DependencyOrigin,
    /// Version spec written.
    pub spec: String,
}

/// A package that already lived in a different section than requested.
///
/// The existing section is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginConflict {
    /// Package name.
    pub name: String,
    /// Section the package was found in and written to.
    pub existing: DependencyOrigin,
    /// Section requested on the command line.
    pub requested: DependencyOrigin,
}

/// What [`merge_added_packages`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Entries written, in canonical pattern order.
    pub recorded: Vec<RecordedDependency>,
    /// Packages whose requested section was overridden, once per name.
    pub conflicts: Vec<OriginConflict>,
}

/// Records every added package in the manifest of its registry.
///
/// The version spec is recomputed from the original user pattern, which yields the
/// same string the rewriter produced. A package that is already listed in
/// some section stays there, whatever `target` says. Documents are only
/// changed in memory.
///
/// # Errors
///
/// Returns [`Error::InvariantViolation`] if a canonical pattern has no
/// original, the original has no resolved package, the package has no
/// registry, or no manifest exists for that registry. Returns a
/// configuration error if an existing dependency section is not an object.
#[instrument(skip_all, fields(added = added.len(), requested = %target))]
pub fn merge_added_packages(
    added: &CanonicalPatterns,
    resolver: &impl ResolverView,
    origins: &PatternOriginIndex,
    target: DependencyOrigin,
    options: &SaveOptions,
    manifests: &mut RootManifests,
) -> Result<MergeReport> {
    let mut report = MergeReport::default();
    let mut warned = HashSet::new();

    for (original, canonical) in added.iter() {
        let pkg = resolver.resolved_pattern(original).ok_or_else(|| {
            Error::invariant(format!(
                "Couldn't find package for '{canonical}' (from '{original}')"
            ))
        })?;
        let spec = resolve_version_spec(original, pkg, options);
        let effective = origins.origin_for(&pkg.name).unwrap_or(target);

        let registry = pkg
            .registry
            .ok_or_else(|| Error::invariant(format!("Package '{}' has no registry", pkg.name)))?;
        let manifest = manifests.get_mut(&registry).ok_or_else(|| {
            Error::invariant(format!("No {registry} manifest loaded for '{}'", pkg.name))
        })?;

        manifest.set_dependency(effective, &pkg.name, &spec)?;
        tracing::debug!(name = %pkg.name, %spec, origin = %effective, %registry, "Recorded dependency");

        if effective != target && warned.insert(pkg.name.clone()) {
            tracing::warn!(
                name = %pkg.name,
                existing = %effective,
                requested = %target,
                "{} is already in {effective}. Please remove existing entry first before adding it to {target}.",
                pkg.name
            );
            report.conflicts.push(OriginConflict {
                name: pkg.name.clone(),
                existing: effective,
                requested: target,
            });
        }

        report.recorded.push(RecordedDependency {
            name: pkg.name.clone(),
            registry,
            origin: effective,
            spec,
        });
    }

    Ok(report)
}
