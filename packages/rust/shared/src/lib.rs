//! Shared types, error model, and configuration for koaton.
//!
//! This crate is the foundation depended on by all other koaton crates.
//! It provides:
//! - [`KoatonError`], the unified error type
//! - Domain types ([`BundleTarget`], [`CompiledUnit`], [`Manifest`], [`ManifestEntry`])
//! - Configuration ([`ProjectConfig`], [`ProjectPaths`], bundle definition loading)

pub mod bundles;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use bundles::load_bundle_config;
pub use config::{
    CONFIG_FILE_NAME, DEFAULT_BUNDLES_FILE, MANIFEST_FILE_NAME, PathsConfig, ProjectConfig,
    ProjectPaths, ToolsConfig, config_file_path, init_project_config, load_project_config,
    load_project_config_from,
};
pub use error::{KoatonError, Result};
pub use types::{
    BundleConfig, BundleKind, BundleTarget, CSS_DIR, CompiledUnit, JS_DIR, Manifest,
    ManifestEntry, OutputDescriptor, WatchMap, split_extension,
};
