//! Root manifest documents, the origin index built from them, and their
//! on-disk store.
//!
//! A [`RootManifest`] keeps the parsed JSON object together with the
//! formatting it was read with (indentation and line endings), so that a
//! save only changes what the add pipeline touched. Dependency sections are
//! written sorted by name; every other key keeps its original position.

use crate::error::{Error, Result};
use crate::traits::ManifestStore;
use crate::types::{DependencyOrigin, Registry};
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::instrument;

const DEFAULT_INDENT: &str = "  ";

/// One manifest document per registry.
pub type RootManifests = BTreeMap<Registry, RootManifest>;

/// Line ending used when a manifest is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    fn detect(contents: &str) -> Self {
        if contents.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }
}

/// A root manifest (`package.json`, `bower.json`) held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct RootManifest {
    path: PathBuf,
    exists: bool,
    object: Map<String, Value>,
    indent: String,
    line_ending: LineEnding,
    dirty: bool,
}

impl RootManifest {
    /// An empty document for a manifest file that does not exist yet.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exists: false,
            object: Map::new(),
            indent: DEFAULT_INDENT.to_string(),
            line_ending: LineEnding::Lf,
            dirty: false,
        }
    }

    /// Parses an existing manifest file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the contents are not a JSON object.
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self> {
        let path = path.into();
        let value: Value =
            serde_json::from_str(contents).map_err(|e| Error::json(e, path.clone()))?;
        let Value::Object(object) = value else {
            return Err(Error::config(
                format!("{} does not contain a JSON object", path.display()),
                "A manifest must be a JSON object such as {\"name\": \"my-app\"}",
            ));
        };

        Ok(Self {
            indent: detect_indent(contents),
            line_ending: LineEnding::detect(contents),
            exists: true,
            dirty: false,
            object,
            path,
        })
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed when loaded (or has been written since).
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Whether the document changed since it was loaded or last saved.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the document has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object.is_empty()
    }

    /// Detected indentation unit.
    #[must_use]
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Detected line ending.
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// The raw JSON object.
    #[must_use]
    pub const fn object(&self) -> &Map<String, Value> {
        &self.object
    }

    /// The version spec recorded for `name` in `origin`'s section.
    #[must_use]
    pub fn dependency(&self, origin: DependencyOrigin, name: &str) -> Option<&str> {
        self.object
            .get(origin.key())
            .and_then(|section| section.get(name))
            .and_then(Value::as_str)
    }

    /// All `(name, spec)` entries of `origin`'s section in document order.
    ///
    /// Entries whose spec is not a string are skipped.
    pub fn dependencies(&self, origin: DependencyOrigin) -> impl Iterator<Item = (&str, &str)> {
        self.object
            .get(origin.key())
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|section| {
                section
                    .iter()
                    .filter_map(|(name, spec)| Some((name.as_str(), spec.as_str()?)))
            })
    }

    /// Records `name: spec` in `origin`'s section, creating the section if
    /// needed. Returns `true` if the document changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the section exists but is not a JSON object.
    pub fn set_dependency(&mut self, origin: DependencyOrigin, name: &str, spec: &str) -> Result<bool> {
        let section = self
            .object
            .entry(origin.key())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(section) = section else {
            return Err(Error::config(
                format!("'{}' in {} is not an object", origin.key(), self.path.display()),
                "Fix the manifest so every dependency section maps names to version specs",
            ));
        };

        if section.get(name).and_then(Value::as_str) == Some(spec) {
            return Ok(false);
        }
        section.insert(name.to_string(), Value::String(spec.to_string()));
        self.dirty = true;
        Ok(true)
    }

    /// Serializes the document with dependency sections sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        let mut object = self.object.clone();
        for origin in DependencyOrigin::ALL {
            if let Some(Value::Object(section)) = object.get_mut(origin.key()) {
                let mut entries: Vec<_> = std::mem::take(section).into_iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                section.extend(entries);
            }
        }

        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        object
            .serialize(&mut serializer)
            .map_err(|e| Error::json(e, self.path.clone()))?;

        let mut text = String::from_utf8_lossy(&buffer).into_owned();
        text.push('\n');
        if self.line_ending == LineEnding::CrLf {
            text = text.replace('\n', "\r\n");
        }
        Ok(text)
    }

    fn mark_saved(&mut self) {
        self.exists = true;
        self.dirty = false;
    }
}

/// Uses the leading whitespace of the first indented line.
fn detect_indent(contents: &str) -> String {
    contents
        .lines()
        .skip(1)
        .map(|line| {
            let trimmed = line.trim_start_matches([' ', '\t']);
            &line[..line.len() - trimmed.len()]
        })
        .find(|indent| !indent.is_empty())
        .unwrap_or(DEFAULT_INDENT)
        .to_string()
}

/// Existing classification of every dependency in the root manifests.
///
/// Keys are `name@spec` in the order they were read: registries in enum
/// order, then sections in [`DependencyOrigin::ALL`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternOriginIndex {
    entries: IndexMap<String, DependencyOrigin>,
}

impl PatternOriginIndex {
    /// Builds the index from the manifests as loaded, before any addition.
    #[must_use]
    pub fn from_manifests(manifests: &RootManifests) -> Self {
        let mut index = Self::default();
        for manifest in manifests.values() {
            for origin in DependencyOrigin::ALL {
                for (name, spec) in manifest.dependencies(origin) {
                    index.insert(format!("{name}@{spec}"), origin);
                }
            }
        }
        index
    }

    /// Records the origin of a `name@spec` pattern.
    pub fn insert(&mut self, pattern: impl Into<String>, origin: DependencyOrigin) {
        self.entries.insert(pattern.into(), origin);
    }

    /// Origin of the last entry whose pattern belongs to `name`.
    #[must_use]
    pub fn origin_for(&self, name: &str) -> Option<DependencyOrigin> {
        let prefix = format!("{name}@");
        self.entries
            .iter()
            .rev()
            .find(|(pattern, _)| pattern.starts_with(&prefix))
            .map(|(_, origin)| *origin)
    }

    /// Number of indexed patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no dependency is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads and writes the root manifests of a project directory.
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    root: PathBuf,
}

impl JsonManifestStore {
    /// Creates a store for the manifests in `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn temp_path(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(".{name}.pkgadd-tmp"))
    }
}

struct PendingWrite {
    registry: Registry,
    target: PathBuf,
    temp: PathBuf,
    contents: String,
}

async fn remove_temps(pending: &[PendingWrite]) {
    for write in pending {
        if let Err(e) = tokio::fs::remove_file(&write.temp).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::debug!(path = %write.temp.display(), error = %e, "Failed to remove temp file");
        }
    }
}

#[async_trait]
impl ManifestStore for JsonManifestStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn load(&self) -> Result<RootManifests> {
        let mut manifests = RootManifests::new();
        for registry in Registry::ALL {
            let path = self.root.join(registry.manifest_name());
            let manifest = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => RootManifest::parse(&path, &contents)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => RootManifest::empty(&path),
                Err(e) => return Err(Error::io(e, &path, "reading manifest")),
            };
            tracing::debug!(
                %registry,
                path = %path.display(),
                exists = manifest.exists(),
                "Loaded root manifest"
            );
            manifests.insert(registry, manifest);
        }
        Ok(manifests)
    }

    #[instrument(skip_all, fields(root = %self.root.display()))]
    async fn save(&self, manifests: &mut RootManifests) -> Result<Vec<PathBuf>> {
        let mut pending = Vec::new();
        for (registry, manifest) in manifests.iter() {
            if !manifest.is_dirty() || (!manifest.exists() && manifest.is_empty()) {
                continue;
            }
            pending.push(PendingWrite {
                registry: *registry,
                target: manifest.path().to_path_buf(),
                temp: Self::temp_path(manifest.path()),
                contents: manifest.to_json_string()?,
            });
        }

        if pending.is_empty() {
            tracing::debug!("No manifest changes to save");
            return Ok(Vec::new());
        }

        let writes = pending.iter().map(|write| async move {
            tokio::fs::write(&write.temp, &write.contents)
                .await
                .map_err(|e| Error::io(e, &write.temp, "writing manifest"))
        });
        // Every write is awaited before checking, so no temp file appears
        // after cleanup.
        let results: Result<Vec<()>> = join_all(writes).await.into_iter().collect();
        if let Err(e) = results {
            remove_temps(&pending).await;
            return Err(e);
        }

        let mut written = Vec::with_capacity(pending.len());
        for (index, write) in pending.iter().enumerate() {
            if let Err(e) = tokio::fs::rename(&write.temp, &write.target).await {
                remove_temps(&pending[index..]).await;
                return Err(Error::io(e, &write.target, "replacing manifest"));
            }
            if let Some(manifest) = manifests.get_mut(&write.registry) {
                manifest.mark_saved();
            }
            tracing::info!(path = %write.target.display(), "Saved manifest");
            written.push(write.target.clone());
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(contents: &str) -> RootManifest {
        RootManifest::parse("/project/package.json", contents).unwrap()
    }

    #[test]
    fn test_parse_detects_formatting() {
        let doc = manifest("{\r\n    \"name\": \"app\"\r\n}\r\n");
        assert_eq!(doc.indent(), "    ");
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert!(doc.exists());
        assert!(!doc.is_dirty());

        let doc = manifest("{\n\t\"name\": \"app\"\n}\n");
        assert_eq!(doc.indent(), "\t");
        assert_eq!(doc.line_ending(), LineEnding::Lf);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(RootManifest::parse("/project/package.json", "[1, 2]").is_err());
        assert!(RootManifest::parse("/project/package.json", "{ nope").is_err());
    }

    #[test]
    fn test_set_dependency_creates_section_and_marks_dirty() {
        let mut doc = manifest(r#"{"name": "app"}"#);
        let changed = doc
            .set_dependency(DependencyOrigin::DevDependencies, "jest", "^29.7.0")
            .unwrap();

        assert!(changed);
        assert!(doc.is_dirty());
        assert_eq!(
            doc.dependency(DependencyOrigin::DevDependencies, "jest"),
            Some("^29.7.0")
        );
    }

    #[test]
    fn test_set_same_dependency_is_clean() {
        let mut doc = manifest(r#"{"dependencies": {"lodash": "^4.17.21"}}"#);
        let changed = doc
            .set_dependency(DependencyOrigin::Dependencies, "lodash", "^4.17.21")
            .unwrap();

        assert!(!changed);
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_set_dependency_rejects_non_object_section() {
        let mut doc = manifest(r#"{"dependencies": "oops"}"#);
        assert!(
            doc.set_dependency(DependencyOrigin::Dependencies, "a", "1.0.0")
                .is_err()
        );
    }

    #[test]
    fn test_serialization_sorts_dependency_sections_only() {
        let mut doc = manifest(
            r#"{
  "name": "app",
  "scripts": {"z": "1", "a": "2"},
  "dependencies": {"react": "^18.2.0"}
}"#,
        );
        doc.set_dependency(DependencyOrigin::Dependencies, "lodash", "^4.17.21")
            .unwrap();

        let text = doc.to_json_string().unwrap();
        let expected = r#"{
  "name": "app",
  "scripts": {
    "z": "1",
    "a": "2"
  },
  "dependencies": {
    "lodash": "^4.17.21",
    "react": "^18.2.0"
  }
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_serialization_keeps_crlf_and_indent() {
        let mut doc = manifest("{\r\n    \"name\": \"app\"\r\n}\r\n");
        doc.set_dependency(DependencyOrigin::Dependencies, "a", "1.0.0")
            .unwrap();

        let text = doc.to_json_string().unwrap();
        assert_eq!(
            text,
            "{\r\n    \"name\": \"app\",\r\n    \"dependencies\": {\r\n        \"a\": \"1.0.0\"\r\n    }\r\n}\r\n"
        );
    }

    #[test]
    fn test_origin_index_last_entry_wins() {
        let mut manifests = RootManifests::new();
        manifests.insert(
            Registry::Npm,
            manifest(
                r#"{
  "dependencies": {"react": "^18.0.0"},
  "devDependencies": {"react": "^17.0.0", "jest": "^29.0.0"},
  "peerDependencies": {"typescript": ">=5"}
}"#,
            ),
        );

        let index = PatternOriginIndex::from_manifests(&manifests);
        assert_eq!(index.len(), 4);
        assert_eq!(index.origin_for("react"), Some(DependencyOrigin::DevDependencies));
        assert_eq!(index.origin_for("jest"), Some(DependencyOrigin::DevDependencies));
        assert_eq!(
            index.origin_for("typescript"),
            Some(DependencyOrigin::PeerDependencies)
        );
        assert_eq!(index.origin_for("lodash"), None);
    }

    #[test]
    fn test_origin_index_does_not_match_name_prefixes() {
        let mut index = PatternOriginIndex::default();
        index.insert("lodash.merge@^4.6.2", DependencyOrigin::DevDependencies);
        index.insert("@types/node@^20", DependencyOrigin::DevDependencies);

        assert_eq!(index.origin_for("lodash"), None);
        assert_eq!(index.origin_for("@types/node"), Some(DependencyOrigin::DevDependencies));
    }

    #[tokio::test]
    async fn test_load_missing_files_gives_empty_documents() {
        let dir = TempDir::new().unwrap();
        let store = JsonManifestStore::new(dir.path());

        let manifests = store.load().await.unwrap();
        assert_eq!(manifests.len(), 2);
        assert!(manifests.values().all(|doc| !doc.exists() && doc.is_empty()));
    }

    #[tokio::test]
    async fn test_save_writes_only_dirty_documents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{\n  \"name\": \"app\"\n}\n").unwrap();
        let store = JsonManifestStore::new(dir.path());

        let mut manifests = store.load().await.unwrap();
        manifests
            .get_mut(&Registry::Npm)
            .unwrap()
            .set_dependency(DependencyOrigin::Dependencies, "lodash", "^4.17.21")
            .unwrap();

        let written = store.save(&mut manifests).await.unwrap();
        assert_eq!(written, vec![dir.path().join("package.json")]);
        assert!(!dir.path().join("bower.json").exists());
        assert!(manifests.values().all(|doc| !doc.is_dirty()));

        let saved = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert!(saved.contains("\"lodash\": \"^4.17.21\""));
        assert!(!dir.path().join(".package.json.pkgadd-tmp").exists());

        let again = store.save(&mut manifests).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_targets_untouched() {
        let dir = TempDir::new().unwrap();
        let original = "{\n  \"name\": \"app\"\n}\n";
        std::fs::write(dir.path().join("package.json"), original).unwrap();
        // A directory where bower's temp file should go makes that write fail.
        std::fs::create_dir(dir.path().join(".bower.json.pkgadd-tmp")).unwrap();
        let store = JsonManifestStore::new(dir.path());

        let mut manifests = store.load().await.unwrap();
        for manifest in manifests.values_mut() {
            manifest
                .set_dependency(DependencyOrigin::Dependencies, "jquery", "^3.7.1")
                .unwrap();
        }

        assert!(store.save(&mut manifests).await.is_err());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("package.json")).unwrap(),
            original
        );
        assert!(!dir.path().join("bower.json").exists());
        assert!(!dir.path().join(".package.json.pkgadd-tmp").exists());
        assert!(manifests.values().all(RootManifest::is_dirty));
    }
}
