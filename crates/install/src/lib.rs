//! Offline collaborators for `pkgadd add`.
//!
//! - [`IndexResolver`] resolves patterns against a local package index and
//!   produces a [`Resolution`] the add pipeline reads through
//!   [`pkgadd_core::ResolverView`].
//! - [`NpmLockfileParser`] turns `package-lock.json` into the lockfile cache.
//! - [`IntegrityFileChecker`] compares a request with the last install record.
//! - [`discover_layout`] finds the workspace root and install directories.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod discovery;
pub mod index;
pub mod integrity;
pub mod lockfile;

pub use discovery::{discover_layout, find_workspace_root, read_json_file};
pub use index::{IndexEntry, IndexResolver, PackageIndex, Resolution};
pub use integrity::{INTEGRITY_FILENAME, IntegrityFileChecker, IntegrityRecord};
pub use lockfile::{LOCKFILE_NAME, NpmLockfileParser, load_lockfile};
