//! Chooses the version constraint persisted for a newly added package.

use crate::exotic::is_exotic;
use crate::pattern::normalize_pattern;
use crate::range::satisfies_version;
use crate::types::ResolvedPackage;
use serde::{Deserialize, Serialize};

/// Prefix policy inputs for [`resolve_version_spec`].
///
/// `tilde` and `exact` come from the command line, `save_exact` and
/// `save_prefix` from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SaveOptions {
    /// `--tilde`: record `~<version>`.
    #[serde(default)]
    pub tilde: bool,
    /// `--exact`: record the bare version.
    #[serde(default)]
    pub exact: bool,
    /// Configured `save-exact` policy.
    #[serde(default)]
    pub save_exact: bool,
    /// Configured `save-prefix`. `None` means unset (defaults to `^`);
    /// `Some("")` requests exact versions.
    #[serde(default)]
    pub save_prefix: Option<String>,
}

impl SaveOptions {
    /// The prefix synthesized in front of a concrete version.
    ///
    /// Tilde is checked before any exact policy, so `tilde` wins if both
    /// are set.
    #[must_use]
    pub fn prefix(&self) -> &str {
        if self.tilde {
            return "~";
        }
        match self.save_prefix.as_deref() {
            _ if self.exact || self.save_exact => "",
            Some(prefix) => prefix,
            None => "^",
        }
    }
}

/// Computes the version spec to persist for `pattern`, which resolved to `pkg`.
///
/// 1. Exotic patterns are returned unchanged.
/// 2. A user range is echoed verbatim if the resolved version satisfies it
///    or the range itself is exotic.
/// 3. Otherwise the configured prefix is prepended to the resolved version.
///
/// The function is pure, so recomputing it always yields the same string.
///
/// # Example
///
/// ```
/// use pkgadd_core::{resolve_version_spec, Registry, ResolvedPackage, SaveOptions};
///
/// let pkg = ResolvedPackage::new("lodash", semver::Version::new(4, 17, 21), Registry::Npm);
/// let options = SaveOptions::default();
/// assert_eq!(resolve_version_spec("lodash", &pkg, &options), "^4.17.21");
/// ```
#[must_use]
pub fn resolve_version_spec(pattern: &str, pkg: &ResolvedPackage, options: &SaveOptions) -> String {
    if is_exotic(pattern) {
        return pattern.to_string();
    }

    let parts = normalize_pattern(pattern);
    if parts.has_version
        && !parts.range.is_empty()
        && (satisfies_version(&pkg.version, &parts.range) || is_exotic(&parts.range))
    {
        return parts.range;
    }

    format!("{}{}", options.prefix(), pkg.version)
}
