//! Everything a build needs besides the manifest itself.

use std::path::{Path, PathBuf};

use koaton_preprocess::Toolchain;
use koaton_shared::{ProjectConfig, ProjectPaths};
use koaton_storage::ManifestStore;

/// Resolved paths, compilers, and the manifest store for one project.
#[derive(Debug)]
pub struct BuildContext {
    pub paths: ProjectPaths,
    pub toolchain: Toolchain,
    pub store: ManifestStore,
}

impl BuildContext {
    pub fn new(paths: ProjectPaths, toolchain: Toolchain) -> Self {
        let store = ManifestStore::new(paths.manifest_file.clone());
        Self {
            paths,
            toolchain,
            store,
        }
    }

    /// Context for the project at `root` using its loaded config.
    pub fn from_config(root: impl Into<PathBuf>, config: &ProjectConfig) -> Self {
        Self::new(
            ProjectPaths::new(root, &config.paths),
            Toolchain::from_config(&config.tools),
        )
    }

    /// Bundle definitions to use: `explicit` relative to the project root,
    /// or the configured default.
    pub fn bundles_file(&self, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => self.paths.root.join(path),
            None => self.paths.bundles_file.clone(),
        }
    }
}
