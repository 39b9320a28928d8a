//! Project configuration for koaton.
//!
//! Project config lives at `<project>/koaton.toml` and is optional.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KoatonError, Result};
use crate::types::{CSS_DIR, JS_DIR};

/// Project config file name, looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "koaton.toml";

/// Manifest file name written at the project root.
pub const MANIFEST_FILE_NAME: &str = ".koaton_bundle";

/// Bundle definitions, relative to the project root.
pub const DEFAULT_BUNDLES_FILE: &str = "config/bundles.js";

// ---------------------------------------------------------------------------
// Config structs (matching koaton.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Where inputs and outputs live.
    #[serde(default)]
    pub paths: PathsConfig,

    /// External compiler commands.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// `[paths]` section. Relative paths resolve against the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Public asset root receiving `css/` and `js/`.
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Persisted bundle manifest.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Bundle definitions used when no file is given on the command line.
    #[serde(default = "default_bundles_file")]
    pub bundles_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            manifest_file: default_manifest_file(),
            bundles_file: default_bundles_file(),
        }
    }
}

fn default_public_dir() -> String {
    "public".into()
}
fn default_manifest_file() -> String {
    MANIFEST_FILE_NAME.into()
}
fn default_bundles_file() -> String {
    DEFAULT_BUNDLES_FILE.into()
}

/// `[tools]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// LESS compiler executable.
    #[serde(default = "default_lessc")]
    pub lessc: String,

    /// JS minifier executable (uglify-js compatible CLI).
    #[serde(default = "default_uglifyjs")]
    pub uglifyjs: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            lessc: default_lessc(),
            uglifyjs: default_uglifyjs(),
        }
    }
}

fn default_lessc() -> String {
    "lessc".into()
}
fn default_uglifyjs() -> String {
    "uglifyjs".into()
}

// ---------------------------------------------------------------------------
// Resolved project paths (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Absolute locations used by a build invocation.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Project root; source patterns resolve against it.
    pub root: PathBuf,
    /// Public asset root.
    pub public_dir: PathBuf,
    /// Persisted manifest file.
    pub manifest_file: PathBuf,
    /// Default bundle definitions file.
    pub bundles_file: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>, config: &PathsConfig) -> Self {
        let root = root.into();
        Self {
            public_dir: root.join(&config.public_dir),
            manifest_file: root.join(&config.manifest_file),
            bundles_file: root.join(&config.bundles_file),
            root,
        }
    }

    /// `public/css`.
    pub fn css_dir(&self) -> PathBuf {
        self.public_dir.join(CSS_DIR)
    }

    /// `public/js`.
    pub fn js_dir(&self) -> PathBuf {
        self.public_dir.join(JS_DIR)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the config file for a project root.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the project config. Returns defaults if the file does not exist.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "project config not found, using defaults");
        return Ok(ProjectConfig::default());
    }

    load_project_config_from(&path)
}

/// Load the project config from a specific file path.
pub fn load_project_config_from(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KoatonError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| KoatonError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file at the project root.
/// Returns the path to the created file.
pub fn init_project_config(root: &Path) -> Result<PathBuf> {
    let path = config_file_path(root);
    if path.exists() {
        return Err(KoatonError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&ProjectConfig::default())
        .map_err(|e| KoatonError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KoatonError::io(&path, e))?;
    tracing::info!(?path, "created default project config");

    Ok(path)
}
