//! Compares a request with the record of the last completed install.

use pkgadd_core::{
    Error, InstallFlags, IntegrityCheck, IntegrityChecker, LockfileCache, Result, WorkspaceLayout,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;

/// File name of the integrity record inside the modules directory.
pub const INTEGRITY_FILENAME: &str = ".pkgadd-integrity";

/// What the last install recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityRecord {
    /// Install flags in effect.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Patterns requested at the top level.
    #[serde(default)]
    pub top_level_patterns: Vec<String>,
    /// `name@version` keys of the lockfile used.
    #[serde(default)]
    pub lockfile_entries: Vec<String>,
}

/// Reads the integrity record from the layout's modules directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegrityFileChecker;

impl IntegrityChecker for IntegrityFileChecker {
    fn check(
        &self,
        patterns: &[String],
        lockfile: &LockfileCache,
        flags: &InstallFlags,
        layout: &WorkspaceLayout,
    ) -> Result<IntegrityCheck> {
        let path = layout.modules_dir.join(INTEGRITY_FILENAME);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(IntegrityCheck {
                    integrity_file_missing: true,
                    integrity_matches: false,
                    missing_patterns: patterns.to_vec(),
                });
            }
            Err(e) => return Err(Error::io(e, &path, "reading integrity file")),
        };
        let record: IntegrityRecord =
            serde_json::from_str(&contents).map_err(|e| Error::json(e, &path))?;

        let recorded: BTreeSet<&str> = record.top_level_patterns.iter().map(String::as_str).collect();
        let requested: BTreeSet<&str> = patterns.iter().map(String::as_str).collect();
        let missing_patterns = patterns
            .iter()
            .filter(|pattern| !recorded.contains(pattern.as_str()))
            .cloned()
            .collect();

        let recorded_flags: BTreeSet<&str> = record.flags.iter().map(String::as_str).collect();
        let current_flags = flags.names();
        let current_flags: BTreeSet<&str> = current_flags.iter().map(String::as_str).collect();

        let recorded_entries: BTreeSet<&str> =
            record.lockfile_entries.iter().map(String::as_str).collect();
        let current_entries: BTreeSet<&str> = lockfile.keys().collect();

        Ok(IntegrityCheck {
            integrity_file_missing: false,
            integrity_matches: recorded_flags == current_flags
                && recorded == requested
                && recorded_entries == current_entries,
            missing_patterns,
        })
    }
}
