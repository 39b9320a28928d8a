//! Persisted bundle manifest (`.koaton_bundle`).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use koaton_artifacts::write_output;
use koaton_shared::{KoatonError, Manifest, Result};
use tracing::{debug, warn};

/// Loads and persists the manifest file at the project root.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the previous run's manifest.
    ///
    /// A missing, unreadable or unparsable file yields an empty manifest;
    /// this never fails.
    pub async fn load(&self) -> Manifest {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no previous manifest");
                return Manifest::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "manifest unreadable, starting empty");
                return Manifest::new();
            }
        };

        match serde_json::from_str::<Manifest>(&content) {
            Ok(manifest) => {
                debug!(path = %self.path.display(), entries = manifest.len(), "loaded manifest");
                manifest
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "manifest corrupt, starting empty");
                Manifest::new()
            }
        }
    }

    /// Write the manifest as a JSON object, replacing the previous file.
    pub async fn persist(&self, manifest: &Manifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| KoatonError::Manifest(format!("serialization failed: {e}")))?;
        write_output(&self.path, json).await?;
        debug!(path = %self.path.display(), entries = manifest.len(), "persisted manifest");
        Ok(())
    }
}
