//! Core domain types for bundle builds.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Directory under the public root that receives stylesheet outputs.
pub const CSS_DIR: &str = "css";

/// Directory under the public root that receives script outputs.
pub const JS_DIR: &str = "js";

// ---------------------------------------------------------------------------
// BundleTarget
// ---------------------------------------------------------------------------

/// Which builder a target is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Css,
    Js,
}

impl BundleKind {
    /// Output directory name under the public root.
    pub fn dir(&self) -> &'static str {
        match self {
            Self::Css => CSS_DIR,
            Self::Js => JS_DIR,
        }
    }
}

impl std::fmt::Display for BundleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir())
    }
}

/// A named group of sources compiled into one logical asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleTarget {
    /// Target name, e.g. `main.css` or `app.js`.
    pub name: String,
    /// Literal paths or globs, in declaration order.
    pub sources: Vec<String>,
}

impl BundleTarget {
    pub fn new(name: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }

    /// Classify the target by name. `.css` wins over `.js` when both appear.
    pub fn kind(&self) -> Option<BundleKind> {
        if self.name.contains(".css") {
            Some(BundleKind::Css)
        } else if self.name.contains(".js") {
            Some(BundleKind::Js)
        } else {
            None
        }
    }

    /// Target name without its trailing extension (`main.css` → `main`).
    pub fn basename(&self) -> &str {
        split_extension(&self.name).0
    }

    /// Trailing extension including the dot (`main.css` → `.css`).
    pub fn extension(&self) -> &str {
        split_extension(&self.name).1
    }
}

/// Split a file name at its last `.` into `(stem, extension)`.
///
/// A leading dot does not count as an extension separator, so `.hidden`
/// yields `(".hidden", "")`.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) if name[idx..].contains('/') => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// All declared targets, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleConfig {
    pub targets: Vec<BundleTarget>,
}

impl BundleConfig {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

// ---------------------------------------------------------------------------
// CompiledUnit
// ---------------------------------------------------------------------------

/// One source's preprocessed output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Preprocessed text. Empty when only dependencies were requested.
    pub text: String,
    /// Source-map payload (a `data:` URI for embedded CSS maps).
    pub source_map: Option<String>,
    /// Files whose change should trigger a rebuild.
    pub dependencies: Vec<PathBuf>,
}

impl CompiledUnit {
    /// A unit that carries only its dependency set.
    pub fn dependencies_only(dependencies: Vec<PathBuf>) -> Self {
        Self {
            dependencies,
            ..Self::default()
        }
    }
}

/// Per-source dependency sets keyed by `${sourceIndex}${target}`.
pub type WatchMap = IndexMap<String, Vec<PathBuf>>;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// A root-relative emitted file path such as `/css/main_<hash>.css`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputDescriptor(String);

impl OutputDescriptor {
    /// Descriptor for `file` inside the output directory of `kind`.
    pub fn new(kind: BundleKind, file: &str) -> Self {
        Self(format!("/{}/{file}", kind.dir()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the descriptor to its on-disk location under `public_dir`.
    ///
    /// Returns `None` for descriptors that are empty or would escape
    /// `public_dir` through `..` components.
    pub fn public_path(&self, public_dir: &Path) -> Option<PathBuf> {
        let mut path = public_dir.to_path_buf();
        let mut pushed = false;
        for part in self.0.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => return None,
                p if p.contains(':') => return None,
                p => {
                    path.push(p);
                    pushed = true;
                }
            }
        }
        pushed.then_some(path)
    }
}

impl From<&str> for OutputDescriptor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for OutputDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The recorded outputs of one target.
///
/// Serialized untagged: production entries are a JSON string, development
/// entries a JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    /// Single concatenated, content-addressed output.
    Production(OutputDescriptor),
    /// One output per source index.
    Development(Vec<OutputDescriptor>),
}

impl ManifestEntry {
    /// Every output referenced by this entry.
    pub fn outputs(&self) -> &[OutputDescriptor] {
        match self {
            Self::Production(output) => std::slice::from_ref(output),
            Self::Development(outputs) => outputs,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development(_))
    }
}

/// Persisted mapping from target name to its emitted outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(IndexMap<String, ManifestEntry>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &str) -> Option<&ManifestEntry> {
        self.0.get(target)
    }

    /// Record (or replace) a target's entry, keeping its original position.
    pub fn insert(&mut self, target: impl Into<String>, entry: ManifestEntry) -> Option<ManifestEntry> {
        self.0.insert(target.into(), entry)
    }

    /// Drop a target's entry, keeping the order of the others.
    pub fn remove(&mut self, target: &str) -> Option<ManifestEntry> {
        self.0.shift_remove(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
