//! `pkgadd add`: resolve the requested packages and record them in the
//! root manifests.

use crate::cli::AddArgs;
use crate::config::AddConfig;
use pkgadd_core::{
    Error, InstallFlags, JsonManifestStore, ManifestStore, MergeReport, PatternOriginIndex, Result,
    merge_added_packages, rewrite_patterns, should_bailout,
};
use pkgadd_install::{IndexResolver, IntegrityFileChecker, PackageIndex, discover_layout, load_lockfile};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::instrument;

/// What an `add` run did.
#[derive(Debug, Clone, Default)]
pub struct AddReport {
    /// Entries written and section conflicts.
    pub merge: MergeReport,
    /// Manifest files written.
    pub written: Vec<PathBuf>,
    /// Requested patterns that resolved to a package already requested.
    pub duplicates: Vec<String>,
    /// Lifecycle scripts must be re-run for every package.
    pub force_scripts: bool,
}

impl AddReport {
    /// Human-readable summary for stdout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let count = self.merge.recorded.len();
        let noun = if count == 1 { "dependency" } else { "dependencies" };
        let _ = writeln!(out, "success Saved {count} new {noun}.");
        for (index, dep) in self.merge.recorded.iter().enumerate() {
            let branch = if index + 1 == count { "└─" } else { "├─" };
            let _ = writeln!(out, "{branch} {}@{} ({})", dep.name, dep.spec, dep.origin);
        }
        for conflict in &self.merge.conflicts {
            let _ = writeln!(
                out,
                "warning {} is already in {}, left it there instead of {}",
                conflict.name, conflict.existing, conflict.requested
            );
        }
        for pattern in &self.duplicates {
            let _ = writeln!(out, "info {pattern} resolves to an already requested package, skipped");
        }
        for path in &self.written {
            let _ = writeln!(out, "info Updated {}", path.display());
        }
        if self.force_scripts {
            let _ = writeln!(out, "info Integrity record missing, lifecycle scripts will run");
        }
        out
    }
}

/// Runs the add pipeline.
#[instrument(skip_all, fields(patterns = args.patterns.len(), origin = %args.origin()))]
pub async fn execute(args: &AddArgs) -> Result<AddReport> {
    if args.patterns.is_empty() {
        return Err(Error::MissingPatterns);
    }

    let cwd = std::path::absolute(&args.cwd)
        .map_err(|e| Error::io(e, &args.cwd, "resolving project directory"))?;
    let config = AddConfig::load(&cwd)?;
    let options = config.save_options(args);
    let target = args.origin();

    let layout = discover_layout(&cwd)?;
    if layout.is_workspace_root() && !args.ignore_workspace_root_check {
        return Err(Error::WorkspaceRootCheck { root: cwd });
    }

    let store = JsonManifestStore::new(&cwd);
    let mut manifests = store.load().await?;
    let origins = PatternOriginIndex::from_manifests(&manifests);

    let lockfile = load_lockfile(&layout.lockfile_dir)?;
    let flags = InstallFlags {
        production: args.production,
        ignore_optional: args.ignore_optional,
        frozen_lockfile: false,
    };
    let decision = should_bailout(
        &args.patterns,
        lockfile.as_ref(),
        &flags,
        &layout,
        &IntegrityFileChecker,
        lockfile.is_some(),
    )?;

    let index = PackageIndex::load(&cwd.join(&args.index))?;
    let resolution = IndexResolver::new(index, &cwd).resolve(&args.patterns)?;

    let outcome = rewrite_patterns(&args.patterns, &resolution, &options)?;
    let merge = merge_added_packages(
        &outcome.added,
        &resolution,
        &origins,
        target,
        &options,
        &mut manifests,
    )?;
    let written = store.save(&mut manifests).await?;
    let duplicates = args
        .patterns
        .iter()
        .filter(|pattern| outcome.added.canonical_of(pattern).is_none())
        .cloned()
        .collect();
    tracing::info!(
        added = ?outcome.added.added(),
        written = written.len(),
        "Add finished"
    );

    Ok(AddReport {
        merge,
        written,
        duplicates,
        force_scripts: decision.force_scripts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use pkgadd_core::{DependencyOrigin, OriginConflict, RecordedDependency, Registry};
    use std::fs;
    use tempfile::TempDir;

    const INDEX: &str = r#"{
  "npm": {
    "lodash": { "versions": ["4.17.21"], "dist-tags": { "latest": "4.17.21" } },
    "left-pad": { "versions": ["1.3.0"] }
  }
}"#;

    fn project(package_json: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), package_json).unwrap();
        fs::create_dir(dir.path().join(".pkgadd")).unwrap();
        fs::write(dir.path().join(".pkgadd/index.json"), INDEX).unwrap();
        dir
    }

    fn args(dir: &TempDir, extra: &[&str]) -> AddArgs {
        let cwd = dir.path().to_string_lossy().into_owned();
        let mut argv = vec!["pkgadd", "add", "--cwd", cwd.as_str()];
        argv.extend_from_slice(extra);
        let Commands::Add(add) = Cli::try_parse_from(argv).unwrap().command;
        add
    }

    fn read(dir: &TempDir) -> String {
        fs::read_to_string(dir.path().join("package.json")).unwrap()
    }

    #[tokio::test]
    async fn test_adds_with_caret() {
        let dir = project(r#"{"name": "app"}"#);
        let report = execute(&args(&dir, &["lodash"])).await.unwrap();

        assert_eq!(report.merge.recorded.len(), 1);
        assert_eq!(report.merge.recorded[0].spec, "^4.17.21");
        assert_eq!(report.written, vec![dir.path().join("package.json")]);
        assert!(read(&dir).contains("\"lodash\": \"^4.17.21\""));
    }

    #[tokio::test]
    async fn test_dev_exact() {
        let dir = project(r#"{"name": "app"}"#);
        execute(&args(&dir, &["-D", "-E", "left-pad"])).await.unwrap();

        let saved = read(&dir);
        assert!(saved.contains("\"devDependencies\""));
        assert!(saved.contains("\"left-pad\": \"1.3.0\""));
    }

    #[tokio::test]
    async fn test_missing_patterns() {
        let dir = project("{}");
        let err = execute(&args(&dir, &[])).await.unwrap_err();
        assert!(matches!(err, Error::MissingPatterns));
    }

    #[tokio::test]
    async fn test_workspace_root_check() {
        let dir = project(r#"{"workspaces": ["packages/*"]}"#);

        let err = execute(&args(&dir, &["lodash"])).await.unwrap_err();
        assert!(matches!(err, Error::WorkspaceRootCheck { .. }));
        assert_eq!(read(&dir), r#"{"workspaces": ["packages/*"]}"#);

        execute(&args(&dir, &["-W", "lodash"])).await.unwrap();
        assert!(read(&dir).contains("lodash"));
    }

    #[tokio::test]
    async fn test_unknown_package_leaves_manifest_untouched() {
        let dir = project(r#"{"name": "app"}"#);
        let err = execute(&args(&dir, &["lodash", "nope"])).await.unwrap_err();

        assert!(matches!(err, Error::PackageNotFound { .. }));
        assert_eq!(read(&dir), r#"{"name": "app"}"#);
    }

    #[tokio::test]
    async fn test_duplicate_patterns_are_reported() {
        let dir = project(r#"{"name": "app"}"#);
        let report = execute(&args(&dir, &["lodash", "lodash@^4.17.0"])).await.unwrap();

        assert_eq!(report.merge.recorded.len(), 1);
        assert_eq!(report.merge.recorded[0].spec, "^4.17.21");
        assert_eq!(report.duplicates, vec!["lodash@^4.17.0"]);
    }

    #[tokio::test]
    async fn test_config_file_prefix() {
        let dir = project(r#"{"name": "app"}"#);
        fs::write(dir.path().join("pkgadd.toml"), "save-prefix = \"~\"\n").unwrap();

        execute(&args(&dir, &["lodash"])).await.unwrap();
        assert!(read(&dir).contains("\"lodash\": \"~4.17.21\""));
    }

    #[test]
    fn test_render() {
        let report = AddReport {
            merge: MergeReport {
                recorded: vec![RecordedDependency {
                    name: "react".to_string(),
                    registry: Registry::Npm,
                    origin: DependencyOrigin::DevDependencies,
                    spec: "^18.2.0".to_string(),
                }],
                conflicts: vec![OriginConflict {
                    name: "react".to_string(),
                    existing: DependencyOrigin::DevDependencies,
                    requested: DependencyOrigin::Dependencies,
                }],
            },
            written: Vec::new(),
            duplicates: vec!["react@^18".to_string()],
            force_scripts: true,
        };

        let text = report.render();
        assert!(text.starts_with("success Saved 1 new dependency."));
        assert!(text.contains("└─ react@^18.2.0 (devDependencies)"));
        assert!(text.contains("warning react is already in devDependencies"));
        assert!(text.contains("info react@^18 resolves to an already requested package"));
        assert!(text.contains("lifecycle scripts"));
    }
}
