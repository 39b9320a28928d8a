//! Removal of the previous run's outputs.
//!
//! Cleanup runs once per build invocation, before any target is rebuilt, so a
//! target switching between development and production never leaves files
//! from its previous mode behind.

use std::path::{Path, PathBuf};

use koaton_artifacts::{Removal, remove_output};
use koaton_shared::{BundleKind, BundleTarget, Manifest, ManifestEntry, OutputDescriptor};
use tracing::{debug, info, instrument, warn};

/// Paths scheduled for deletion.
#[derive(Debug, Clone, Default)]
pub struct CleanupPlan {
    paths: Vec<PathBuf>,
    refused: Vec<String>,
}

/// Outcome counts of an executed plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files or directories deleted.
    pub removed: usize,
    /// Scheduled paths that did not exist.
    pub missing: usize,
    /// Deletions that failed for another reason (logged, not fatal).
    pub failed: usize,
    /// Manifest paths pointing outside the public directory.
    pub refused: usize,
}

impl CleanupPlan {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn refused(&self) -> &[String] {
        &self.refused
    }

    /// Delete every scheduled path. Missing files and failed deletions are
    /// counted, never returned as errors.
    pub async fn execute(self) -> CleanupReport {
        let mut report = CleanupReport {
            refused: self.refused.len(),
            ..CleanupReport::default()
        };

        for path in &self.paths {
            match remove_output(path).await {
                Ok(Removal::Removed) => report.removed += 1,
                Ok(Removal::Missing) => report.missing += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not remove previous output");
                    report.failed += 1;
                }
            }
        }

        info!(
            removed = report.removed,
            missing = report.missing,
            failed = report.failed,
            refused = report.refused,
            "cleanup complete"
        );
        report
    }
}

/// Schedule every output recorded in `manifest` for deletion.
///
/// Development entries contribute each listed file. Production entries
/// contribute their file plus the source-map sibling of the target:
/// `css/<target with .css → .css.map>` for stylesheets, `js/<target>.map`
/// for scripts.
#[instrument(skip_all, fields(entries = manifest.len()))]
pub fn plan_cleanup(manifest: &Manifest, public_dir: &Path) -> CleanupPlan {
    let mut plan = CleanupPlan::default();

    for (target, entry) in manifest.iter() {
        for output in entry.outputs() {
            plan.schedule(output, public_dir);
        }

        if let ManifestEntry::Production(_) = entry {
            if let Some(sibling) = map_sibling(target) {
                plan.schedule(&sibling, public_dir);
            }
        }
    }

    debug!(paths = plan.paths.len(), refused = plan.refused.len(), "cleanup planned");
    plan
}

impl CleanupPlan {
    fn schedule(&mut self, output: &OutputDescriptor, public_dir: &Path) {
        match output.public_path(public_dir) {
            Some(path) => self.paths.push(path),
            None => {
                warn!(output = %output, "refusing to delete path outside the public directory");
                self.refused.push(output.to_string());
            }
        }
    }
}

fn map_sibling(target: &str) -> Option<OutputDescriptor> {
    match BundleTarget::new(target, Vec::new()).kind()? {
        BundleKind::Css => Some(OutputDescriptor::new(
            BundleKind::Css,
            &target.replacen(".css", ".css.map", 1),
        )),
        BundleKind::Js => Some(OutputDescriptor::new(BundleKind::Js, &format!("{target}.map"))),
    }
}
