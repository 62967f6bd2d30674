//! In-memory view of a previously written lockfile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A package pinned by the lockfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedPackage {
    /// Package name.
    pub name: String,
    /// Locked version.
    pub version: String,
    /// Where the package tarball was fetched from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    /// Integrity hash recorded for the tarball.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
}

/// Lockfile entries keyed by `name@version`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockfileCache {
    entries: BTreeMap<String, LockedPackage>,
}

impl LockfileCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a locked package, replacing an earlier entry with the same key.
    pub fn insert(&mut self, package: LockedPackage) {
        let key = format!("{}@{}", package.name, package.version);
        self.entries.insert(key, package);
    }

    /// Looks up a package by `name@version`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LockedPackage> {
        self.entries.get(key)
    }

    /// Sorted `name@version` keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of locked packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is locked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<LockedPackage> for LockfileCache {
    fn from_iter<I: IntoIterator<Item = LockedPackage>>(iter: I) -> Self {
        let mut cache = Self::new();
        for package in iter {
            cache.insert(package);
        }
        cache
    }
}
