//! Core of the `pkgadd add` command.
//!
//! Adding a dependency runs in four steps once the requested patterns have
//! been resolved to concrete packages:
//!
//! 1. [`resolve_version_spec`] picks the constraint to persist for each
//!    package (the user's own range, an exotic specifier, or a prefixed
//!    version).
//! 2. [`rewrite_patterns`] turns every user pattern into its canonical
//!    `name@versionSpec` form and returns the mapping explicitly.
//! 3. [`merge_added_packages`] writes the canonical entries into the root
//!    manifest of each package's registry. A package that is already listed
//!    keeps its section.
//! 4. A [`ManifestStore`] persists every modified document in one batch.
//!
//! [`should_bailout`] runs before resolution and never skips an `add`; it
//! only decides whether lifecycle scripts must be forced.
//!
//! # Collaborators
//!
//! Resolution, lockfile loading and the integrity record sit behind the
//! [`ResolverView`], [`ManifestStore`] and [`IntegrityChecker`] traits. The
//! `pkgadd-install` crate provides offline implementations.
//!
//! # Example
//!
//! ```
//! use pkgadd_core::{
//!     DependencyOrigin, PatternOriginIndex, Registry, ResolvedPackage,
//!     ResolverView, RootManifest, RootManifests, SaveOptions, merge_added_packages,
//!     rewrite_patterns,
//! };
//! use std::collections::HashMap;
//!
//! struct Resolved(HashMap<String, ResolvedPackage>);
//!
//! impl ResolverView for Resolved {
//!     fn resolved_pattern(&self, pattern: &str) -> Option<&ResolvedPackage> {
//!         self.0.get(pattern)
//!     }
//! }
//!
//! let lodash = ResolvedPackage::new("lodash", semver::Version::new(4, 17, 21), Registry::Npm);
//! let resolver = Resolved(HashMap::from([("lodash".to_string(), lodash)]));
//! let mut manifests = RootManifests::from([(
//!     Registry::Npm,
//!     RootManifest::parse("package.json", r#"{"name": "app"}"#)?,
//! )]);
//!
//! let options = SaveOptions::default();
//! let origins = PatternOriginIndex::from_manifests(&manifests);
//! let outcome = rewrite_patterns(&["lodash".to_string()], &resolver, &options)?;
//! merge_added_packages(
//!     &outcome.added,
//!     &resolver,
//!     &origins,
//!     DependencyOrigin::Dependencies,
//!     &options,
//!     &mut manifests,
//! )?;
//!
//! let npm = &manifests[&Registry::Npm];
//! assert_eq!(npm.dependency(DependencyOrigin::Dependencies, "lodash"), Some("^4.17.21"));
//! # Ok::<(), pkgadd_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod bailout;
pub mod error;
pub mod exotic;
pub mod lockfile;
pub mod manifest;
pub mod merge;
pub mod pattern;
pub mod range;
pub mod rewrite;
pub mod traits;
pub mod types;
pub mod version_spec;

pub use bailout::{BailoutDecision, InstallFlags, IntegrityCheck, WorkspaceLayout, should_bailout};
pub use error::{Error, Result};
pub use exotic::{ExoticKind, classify, is_exotic};
pub use lockfile::{LockedPackage, LockfileCache};
pub use manifest::{JsonManifestStore, LineEnding, PatternOriginIndex, RootManifest, RootManifests};
pub use merge::{MergeReport, OriginConflict, RecordedDependency, merge_added_packages};
pub use pattern::{PatternParts, normalize_pattern};
pub use range::{parse_version, satisfies, satisfies_version};
pub use rewrite::{CanonicalPatterns, RewriteOutcome, rewrite_patterns};
pub use traits::{IntegrityChecker, ManifestStore, ResolverView};
pub use types::{DependencyOrigin, PackageKey, Registry, ResolvedPackage};
pub use version_spec::{SaveOptions, resolve_version_spec};
