//! Rewrites user patterns into canonical `name@versionSpec` form.

use crate::error::{Error, Result};
use crate::traits::ResolverView;
use crate::version_spec::{SaveOptions, resolve_version_spec};
use tracing::instrument;

/// Ordered mapping from user patterns to the canonical patterns that
/// replace them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalPatterns {
    pairs: Vec<(String, String)>,
}

impl CanonicalPatterns {
    /// Records that `original` is persisted as `canonical`.
    pub fn push(&mut self, original: impl Into<String>, canonical: impl Into<String>) {
        self.pairs.push((original.into(), canonical.into()));
    }

    /// Canonical patterns in rewrite order.
    #[must_use]
    pub fn added(&self) -> Vec<String> {
        self.pairs.iter().map(|(_, canonical)| canonical.clone()).collect()
    }

    /// The user pattern a canonical pattern was derived from.
    #[must_use]
    pub fn original_of(&self, canonical: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(_, c)| c == canonical)
            .map(|(original, _)| original.as_str())
    }

    /// The canonical pattern a user pattern was rewritten to.
    #[must_use]
    pub fn canonical_of(&self, original: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(o, _)| o == original)
            .map(|(_, canonical)| canonical.as_str())
    }

    /// `(original, canonical)` pairs in rewrite order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(o, c)| (o.as_str(), c.as_str()))
    }

    /// Number of rewritten patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if nothing was rewritten.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Result of [`rewrite_patterns`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The user patterns followed by every canonical pattern.
    pub patterns: Vec<String>,
    /// Mapping for the patterns that were added.
    pub added: CanonicalPatterns,
}

/// Rewrites each deduplicated user pattern to `name@versionSpec`.
///
/// The resolver view is only read. Callers that need the canonical form of
/// a pattern look it up in [`RewriteOutcome::added`].
///
/// # Errors
///
/// Returns [`Error::InvariantViolation`] if a pattern that survived
/// deduplication has no resolved package.
#[instrument(skip_all, fields(patterns = user_patterns.len()))]
pub fn rewrite_patterns(
    user_patterns: &[String],
    resolver: &impl ResolverView,
    options: &SaveOptions,
) -> Result<RewriteOutcome> {
    let mut added = CanonicalPatterns::default();

    for pattern in resolver.dedupe_patterns(user_patterns) {
        let pkg = resolver.resolved_pattern(&pattern).ok_or_else(|| {
            Error::invariant(format!("Couldn't find package for pattern '{pattern}'"))
        })?;
        let spec = resolve_version_spec(&pattern, pkg, options);
        let canonical = format!("{}@{spec}", pkg.name);
        tracing::debug!(%pattern, %canonical, "Rewrote pattern");
        added.push(pattern, canonical);
    }

    let patterns = user_patterns
        .iter()
        .cloned()
        .chain(added.added())
        .collect();
    Ok(RewriteOutcome { patterns, added })
}
