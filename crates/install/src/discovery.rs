//! Locates the workspace a project directory belongs to.

use glob::Pattern;
use pkgadd_core::{Error, Result, WorkspaceLayout};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    workspaces: Option<WorkspacesField>,
}

/// `workspaces` is either a list of globs or `{ "packages": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Array(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl WorkspacesField {
    fn patterns(&self) -> &[String] {
        match self {
            Self::Array(patterns) | Self::Object { packages: patterns } => patterns,
        }
    }
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed as valid JSON.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading json file"))?;
    serde_json::from_str(&content).map_err(|e| Error::json(e, path))
}

/// Walks up from `cwd` to the nearest `package.json` that declares
/// workspaces. Returns that directory if it is `cwd` itself or one of its
/// workspace globs covers `cwd`, and `None` otherwise.
///
/// # Errors
///
/// Returns an error if a `package.json` on the way cannot be read or parsed.
#[instrument(skip_all, fields(cwd = %cwd.display()))]
pub fn find_workspace_root(cwd: &Path) -> Result<Option<PathBuf>> {
    for dir in cwd.ancestors() {
        let manifest_path = dir.join("package.json");
        if !manifest_path.is_file() {
            continue;
        }
        let manifest: PackageJson = read_json_file(&manifest_path)?;
        let Some(workspaces) = manifest.workspaces else {
            continue;
        };

        if dir == cwd {
            return Ok(Some(dir.to_path_buf()));
        }
        let Ok(relative) = cwd.strip_prefix(dir) else {
            return Ok(None);
        };
        let covered = workspaces
            .patterns()
            .iter()
            .filter(|p| !p.starts_with('!'))
            .filter_map(|p| Pattern::new(p.trim_end_matches('/')).ok())
            .any(|p| p.matches_path(relative));

        tracing::debug!(root = %dir.display(), covered, "Found workspace manifest");
        return Ok(covered.then(|| dir.to_path_buf()));
    }
    Ok(None)
}

/// Builds the layout for `cwd`. Inside a workspace, the lockfile and
/// installed modules live at the workspace root.
///
/// # Errors
///
/// See [`find_workspace_root`].
pub fn discover_layout(cwd: &Path) -> Result<WorkspaceLayout> {
    let workspace_root = find_workspace_root(cwd)?;
    let base = workspace_root.clone().unwrap_or_else(|| cwd.to_path_buf());
    Ok(WorkspaceLayout {
        cwd: cwd.to_path_buf(),
        lockfile_dir: base.clone(),
        modules_dir: base.join("node_modules"),
        workspace_root,
    })
}
