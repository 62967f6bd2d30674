//! Loads the lockfile cache from an npm `package-lock.json`.

use pkgadd_core::{Error, LockedPackage, LockfileCache, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::instrument;

/// File name of the lockfile read by [`load_lockfile`].
pub const LOCKFILE_NAME: &str = "package-lock.json";

/// Parser for npm `package-lock.json` files (lockfileVersion 3).
#[derive(Debug, Default, Clone, Copy)]
pub struct NpmLockfileParser;

impl NpmLockfileParser {
    /// Parses the lockfile at `lockfile_path` into a cache of installed
    /// packages. The root project and workspace members are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, has a
    /// lockfileVersion other than 3, or lists a package without a version.
    pub fn parse(&self, lockfile_path: &Path) -> Result<LockfileCache> {
        let contents = fs::read_to_string(lockfile_path)
            .map_err(|source| Error::io(source, lockfile_path, "reading package-lock.json"))?;
        self.parse_str(lockfile_path, &contents)
    }

    /// Parses lockfile contents. `lockfile_path` is only used in errors.
    ///
    /// # Errors
    ///
    /// See [`NpmLockfileParser::parse`].
    pub fn parse_str(&self, lockfile_path: &Path, contents: &str) -> Result<LockfileCache> {
        let lockfile: PackageLockV3 = serde_json::from_str(contents)
            .map_err(|source| Error::lockfile_parse(lockfile_path, source.to_string()))?;

        if lockfile.lockfile_version != 3 {
            return Err(Error::lockfile_parse(
                lockfile_path,
                format!(
                    "Unsupported lockfileVersion {}, only v3 is supported",
                    lockfile.lockfile_version
                ),
            ));
        }

        let mut cache = LockfileCache::new();
        for (pkg_path, pkg_entry) in lockfile.packages.unwrap_or_default() {
            if is_workspace_member(&pkg_path) {
                continue;
            }
            // file: and link: dependencies are symlinks without a version.
            if pkg_entry.link {
                tracing::trace!(path = %pkg_path, "Skipping linked package");
                continue;
            }
            let version = pkg_entry.version.clone().ok_or_else(|| {
                Error::lockfile_parse(
                    lockfile_path,
                    format!("Missing version for package entry '{pkg_path}'"),
                )
            })?;
            cache.insert(LockedPackage {
                name: infer_package_name(&pkg_path, &pkg_entry),
                version,
                resolved: pkg_entry.resolved,
                integrity: pkg_entry.integrity,
            });
        }

        Ok(cache)
    }
}

/// Loads `package-lock.json` from `dir`, or `None` if there is none.
///
/// # Errors
///
/// Returns an error if the lockfile exists but cannot be parsed.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_lockfile(dir: &Path) -> Result<Option<LockfileCache>> {
    let path = dir.join(LOCKFILE_NAME);
    if !path.is_file() {
        tracing::debug!("No lockfile found");
        return Ok(None);
    }
    let cache = NpmLockfileParser.parse(&path)?;
    tracing::debug!(packages = cache.len(), "Loaded lockfile");
    Ok(Some(cache))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageLockV3 {
    #[serde(default)]
    lockfile_version: u32,
    #[serde(default)]
    packages: Option<BTreeMap<String, PackageEntry>>,
}

#[derive(Debug, Deserialize, Default)]
struct PackageEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    resolved: Option<String>,
    #[serde(default)]
    integrity: Option<String>,
    #[serde(default)]
    link: bool,
}

// "" is the root; other paths without node_modules are workspace members.
fn is_workspace_member(pkg_path: &str) -> bool {
    pkg_path.is_empty() || (!pkg_path.starts_with("node_modules/") && !pkg_path.contains("/node_modules/"))
}

fn infer_package_name(pkg_path: &str, pkg_entry: &PackageEntry) -> String {
    if let Some(name) = &pkg_entry.name {
        return name.clone();
    }
    pkg_path
        .rsplit_once("node_modules/")
        .map_or(pkg_path, |(_, name)| name)
        .to_string()
}
