//! Core types shared by the rewrite, merge and bailout stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies the manifest family a package belongs to.
///
/// Each registry owns exactly one root manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    /// npm registry, recorded in `package.json`.
    Npm,
    /// Bower registry, recorded in `bower.json`.
    Bower,
}

impl Registry {
    /// All registries, in lookup order.
    pub const ALL: [Self; 2] = [Self::Npm, Self::Bower];

    /// Returns the root manifest file name for this registry.
    ///
    /// # Example
    ///
    /// ```
    /// use pkgadd_core::Registry;
    ///
    /// assert_eq!(Registry::Npm.manifest_name(), "package.json");
    /// assert_eq!(Registry::Bower.manifest_name(), "bower.json");
    /// ```
    #[must_use]
    pub const fn manifest_name(self) -> &'static str {
        match self {
            Self::Npm => "package.json",
            Self::Bower => "bower.json",
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::Bower => write!(f, "bower"),
        }
    }
}

/// The manifest section a dependency is recorded under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DependencyOrigin {
    /// `dependencies`
    #[default]
    #[serde(rename = "dependencies")]
    Dependencies,
    /// `devDependencies`
    #[serde(rename = "devDependencies")]
    DevDependencies,
    /// `optionalDependencies`
    #[serde(rename = "optionalDependencies")]
    OptionalDependencies,
    /// `peerDependencies`
    #[serde(rename = "peerDependencies")]
    PeerDependencies,
}

impl DependencyOrigin {
    /// All origins, in manifest scan order.
    pub const ALL: [Self; 4] = [
        Self::Dependencies,
        Self::DevDependencies,
        Self::OptionalDependencies,
        Self::PeerDependencies,
    ];

    /// Returns the manifest key for this section.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::OptionalDependencies => "optionalDependencies",
            Self::PeerDependencies => "peerDependencies",
        }
    }

    /// Collapses the mutually exclusive `--dev` / `--peer` / `--optional`
    /// flags into a single origin.
    ///
    /// Callers are expected to enforce exclusivity; if several flags are
    /// set anyway, dev beats optional beats peer.
    #[must_use]
    pub const fn from_flags(dev: bool, peer: bool, optional: bool) -> Self {
        if dev {
            Self::DevDependencies
        } else if optional {
            Self::OptionalDependencies
        } else if peer {
            Self::PeerDependencies
        } else {
            Self::Dependencies
        }
    }
}

impl fmt::Display for DependencyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DependencyOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|origin| origin.key() == s)
            .ok_or_else(|| format!("Unknown dependency type: {s}"))
    }
}

/// The outcome of resolving a pattern.
///
/// Owned by the resolution stage; the add pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Package name, including any `@scope/` prefix.
    pub name: String,
    /// Concrete resolved version.
    pub version: semver::Version,
    /// Registry the package was resolved from.
    ///
    /// `None` only if resolution is broken; merging such a package is an
    /// invariant violation.
    pub registry: Option<Registry>,
}

impl ResolvedPackage {
    /// Creates a resolved package attached to a registry.
    #[must_use]
    pub fn new(name: impl Into<String>, version: semver::Version, registry: Registry) -> Self {
        Self {
            name: name.into(),
            version,
            registry: Some(registry),
        }
    }

    /// Identity used for pattern deduplication.
    #[must_use]
    pub fn key(&self) -> PackageKey {
        PackageKey {
            registry: self.registry,
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

/// Identity of a resolved package: two patterns resolving to equal keys
/// refer to the same package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageKey {
    /// Registry of the package.
    pub registry: Option<Registry>,
    /// Package name.
    pub name: String,
    /// Concrete version.
    pub version: semver::Version,
}
