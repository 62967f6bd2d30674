//! Integration tests wiring the offline collaborators into the add pipeline.

use pkgadd_core::{
    DependencyOrigin, InstallFlags, PatternOriginIndex, Registry, RootManifest, RootManifests,
    SaveOptions, merge_added_packages, rewrite_patterns, should_bailout,
};
use pkgadd_install::{
    IndexResolver, IntegrityFileChecker, LOCKFILE_NAME, PackageIndex, discover_layout,
    load_lockfile,
};
use std::fs;
use tempfile::TempDir;

const INDEX: &str = r#"{
  "npm": {
    "lodash": { "versions": ["4.17.20", "4.17.21"], "dist-tags": { "latest": "4.17.21" } },
    "left-pad": { "versions": ["1.1.3", "1.3.0"] }
  },
  "bower": {
    "jquery": { "versions": ["3.6.0", "3.7.1"], "dist-tags": { "latest": "3.7.1" } }
  }
}"#;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap();
    fs::write(dir.path().join("index.json"), INDEX).unwrap();
    dir
}

fn to_patterns(items: &[&str]) -> Vec<String> {
    items.iter().map(|p| (*p).to_string()).collect()
}

#[test]
fn resolves_and_merges_across_registries() {
    let dir = project();
    let index = PackageIndex::load(&dir.path().join("index.json")).unwrap();
    let resolver = IndexResolver::new(index, dir.path());
    let patterns = to_patterns(&["lodash", "jquery@^3.6.0", "left-pad@1.1.3"]);

    let resolution = resolver.resolve(&patterns).unwrap();
    let mut manifests = RootManifests::from([
        (
            Registry::Npm,
            RootManifest::parse(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap(),
        ),
        (Registry::Bower, RootManifest::empty(dir.path().join("bower.json"))),
    ]);
    let origins = PatternOriginIndex::from_manifests(&manifests);
    let options = SaveOptions::default();

    let outcome = rewrite_patterns(&patterns, &resolution, &options).unwrap();
    assert_eq!(
        outcome.added.added(),
        vec!["lodash@^4.17.21", "jquery@^3.6.0", "left-pad@1.1.3"]
    );

    merge_added_packages(
        &outcome.added,
        &resolution,
        &origins,
        DependencyOrigin::Dependencies,
        &options,
        &mut manifests,
    )
    .unwrap();

    let npm = &manifests[&Registry::Npm];
    let bower = &manifests[&Registry::Bower];
    assert_eq!(npm.dependency(DependencyOrigin::Dependencies, "lodash"), Some("^4.17.21"));
    assert_eq!(npm.dependency(DependencyOrigin::Dependencies, "left-pad"), Some("1.1.3"));
    assert_eq!(bower.dependency(DependencyOrigin::Dependencies, "jquery"), Some("^3.6.0"));
}

#[test]
fn bailout_gate_forces_scripts_without_integrity_record() {
    let dir = project();
    fs::write(
        dir.path().join(LOCKFILE_NAME),
        r#"{"lockfileVersion": 3, "packages": {"node_modules/lodash": {"version": "4.17.21"}}}"#,
    )
    .unwrap();

    let layout = discover_layout(dir.path()).unwrap();
    let lockfile = load_lockfile(&layout.lockfile_dir).unwrap();
    let decision = should_bailout(
        &to_patterns(&["lodash"]),
        lockfile.as_ref(),
        &InstallFlags::default(),
        &layout,
        &IntegrityFileChecker,
        true,
    )
    .unwrap();

    assert!(!decision.bailout);
    assert!(decision.force_scripts);
}

#[test]
fn bailout_gate_without_lockfile_is_a_no_op() {
    let dir = project();
    let layout = discover_layout(dir.path()).unwrap();
    let lockfile = load_lockfile(&layout.lockfile_dir).unwrap();
    assert!(lockfile.is_none());

    let decision = should_bailout(
        &to_patterns(&["lodash"]),
        lockfile.as_ref(),
        &InstallFlags::default(),
        &layout,
        &IntegrityFileChecker,
        false,
    )
    .unwrap();

    assert!(!decision.bailout);
    assert!(!decision.force_scripts);
}
