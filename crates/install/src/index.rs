//! Resolves patterns against a local package index.
//!
//! The index is a JSON document listing the published versions and
//! dist-tags of each package per registry:
//!
//! ```json
//! {
//!   "npm": {
//!     "lodash": { "versions": ["4.17.20", "4.17.21"], "dist-tags": { "latest": "4.17.21" } }
//!   },
//!   "bower": {}
//! }
//! ```
//!
//! Local directories (`file:`, `link:` and plain paths) are resolved by
//! reading their `package.json`.

use pkgadd_core::{
    Error, ExoticKind, Registry, ResolvedPackage, ResolverView, Result, classify,
    normalize_pattern, parse_version, satisfies_version,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Versions and dist-tags of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IndexEntry {
    /// Every published version.
    #[serde(default)]
    pub versions: Vec<String>,
    /// Named aliases such as `latest` or `next`.
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: BTreeMap<String, String>,
}

/// Packages known to each registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageIndex {
    #[serde(default)]
    npm: BTreeMap<String, IndexEntry>,
    #[serde(default)]
    bower: BTreeMap<String, IndexEntry>,
}

impl PackageIndex {
    /// Reads an index file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading package index"))?;
        serde_json::from_str(&contents).map_err(|e| Error::json(e, path))
    }

    /// Packages of one registry.
    #[must_use]
    pub const fn packages(&self, registry: Registry) -> &BTreeMap<String, IndexEntry> {
        match registry {
            Registry::Npm => &self.npm,
            Registry::Bower => &self.bower,
        }
    }

    /// Adds or replaces a package entry.
    pub fn insert(&mut self, registry: Registry, name: impl Into<String>, entry: IndexEntry) {
        let packages = match registry {
            Registry::Npm => &mut self.npm,
            Registry::Bower => &mut self.bower,
        };
        packages.insert(name.into(), entry);
    }
}

/// Patterns mapped to the packages they resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    packages: HashMap<String, ResolvedPackage>,
}

impl Resolution {
    /// Number of resolved patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns `true` if nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl ResolverView for Resolution {
    fn resolved_pattern(&self, pattern: &str) -> Option<&ResolvedPackage> {
        self.packages.get(pattern)
    }
}

/// Offline resolver backed by a [`PackageIndex`].
#[derive(Debug, Clone)]
pub struct IndexResolver {
    index: PackageIndex,
    cwd: PathBuf,
}

impl IndexResolver {
    /// Creates a resolver. Relative local paths are resolved against `cwd`.
    #[must_use]
    pub fn new(index: PackageIndex, cwd: impl Into<PathBuf>) -> Self {
        Self {
            index,
            cwd: cwd.into(),
        }
    }

    /// Resolves every pattern.
    ///
    /// # Errors
    ///
    /// Fails on the first pattern that cannot be resolved.
    #[instrument(skip_all, fields(patterns = patterns.len()))]
    pub fn resolve(&self, patterns: &[String]) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        for pattern in patterns {
            let pkg = self.resolve_pattern(pattern)?;
            tracing::debug!(%pattern, name = %pkg.name, version = %pkg.version, "Resolved pattern");
            resolution.packages.insert(pattern.clone(), pkg);
        }
        Ok(resolution)
    }

    /// Resolves a single pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PackageNotFound`] for unknown names,
    /// [`Error::NoMatchingVersion`] when no version satisfies the range and
    /// [`Error::UnsupportedSpecifier`] for remote exotic specifiers.
    pub fn resolve_pattern(&self, pattern: &str) -> Result<ResolvedPackage> {
        if let Some(kind) = classify(pattern) {
            return self.resolve_exotic(pattern, pattern, kind);
        }

        let parts = normalize_pattern(pattern);
        if let Some(kind) = classify(&parts.range) {
            return self.resolve_exotic(pattern, &parts.range, kind);
        }

        let (registry, entry) = Registry::ALL
            .into_iter()
            .find_map(|registry| {
                self.index
                    .packages(registry)
                    .get(&parts.name)
                    .map(|entry| (registry, entry))
            })
            .ok_or_else(|| Error::PackageNotFound {
                name: parts.name.clone(),
            })?;

        let version = pick_version(entry, &parts.range).ok_or_else(|| Error::NoMatchingVersion {
            name: parts.name.clone(),
            range: parts.range.clone(),
        })?;
        Ok(ResolvedPackage::new(parts.name, version, registry))
    }

    fn resolve_exotic(&self, pattern: &str, specifier: &str, kind: ExoticKind) -> Result<ResolvedPackage> {
        if !matches!(kind, ExoticKind::File | ExoticKind::Link) {
            return Err(Error::UnsupportedSpecifier {
                pattern: pattern.to_string(),
            });
        }

        let relative = specifier
            .strip_prefix("file:")
            .or_else(|| specifier.strip_prefix("link:"))
            .unwrap_or(specifier);
        let manifest_path = self.cwd.join(relative).join("package.json");
        let contents = fs::read_to_string(&manifest_path)
            .map_err(|e| Error::io(e, &manifest_path, "reading local package manifest"))?;
        let manifest: LocalManifest =
            serde_json::from_str(&contents).map_err(|e| Error::json(e, &manifest_path))?;

        let (Some(name), Some(version)) = (manifest.name, manifest.version) else {
            return Err(Error::config(
                format!("{} needs both a name and a version", manifest_path.display()),
                "Local packages must declare \"name\" and \"version\" in their package.json",
            ));
        };
        let version = parse_version(&version).map_err(|e| {
            Error::config(
                format!("Invalid version '{version}' in {}: {e}", manifest_path.display()),
                "Use a semantic version such as 1.0.0",
            )
        })?;

        Ok(ResolvedPackage::new(name, version, Registry::Npm))
    }
}

#[derive(Debug, Deserialize)]
struct LocalManifest {
    name: Option<String>,
    version: Option<String>,
}

/// Dist-tags win over ranges; `latest` without a tag means the highest
/// release.
fn pick_version(entry: &IndexEntry, range: &str) -> Option<semver::Version> {
    if let Some(tagged) = entry.dist_tags.get(range) {
        return parse_version(tagged).ok();
    }

    let range = if range == "latest" { "*" } else { range };
    entry
        .versions
        .iter()
        .filter_map(|v| parse_version(v).ok())
        .filter(|v| satisfies_version(v, range))
        .max()
}
