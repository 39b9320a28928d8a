//! End-to-end `build`: bundle definitions → cleanup → per-target builds.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, instrument, warn};

use koaton_shared::{
    BundleKind, BundleTarget, KoatonError, Manifest, ManifestEntry, Result, WatchMap,
    load_bundle_config,
};
use koaton_storage::{CleanupReport, plan_cleanup};

use crate::context::BuildContext;

/// Options for one `build` invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Bundle definitions; defaults to the project's configured file.
    pub config_file: Option<PathBuf>,
    /// Production mode (single minified, content-addressed output per target).
    pub production: bool,
}

/// What happened to one declared target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub name: String,
    pub kind: BundleKind,
    /// Recorded manifest entry; `None` when the target produced no output.
    pub entry: Option<ManifestEntry>,
}

/// Result of a build that had targets to compile.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub config_file: PathBuf,
    pub targets: Vec<TargetReport>,
    /// Targets whose name is neither CSS nor JS.
    pub skipped: Vec<String>,
    pub cleanup: CleanupReport,
    pub elapsed: Duration,
}

/// Result of [`build`].
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// The bundle definitions were empty; nothing was touched.
    Empty { config_file: PathBuf },
    Built(BuildReport),
}

/// Resolved inputs of one target, as reported by [`collect_paths`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TargetPaths {
    /// Dependency sets per source index.
    Css(WatchMap),
    /// Matched script files in declaration order.
    Js(Vec<PathBuf>),
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a target is built.
    fn target_started(&self, target: &BundleTarget, current: usize, total: usize);
    /// Called after a target is built.
    fn target_finished(&self, report: &TargetReport);
    /// Called when the build completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn target_started(&self, _target: &BundleTarget, _current: usize, _total: usize) {}
    fn target_finished(&self, _report: &TargetReport) {}
    fn done(&self, _report: &BuildReport) {}
}

/// Run the full `build` pipeline.
///
/// 1. Load bundle definitions (empty ⇒ no-op)
/// 2. Load the previous manifest and delete the outputs it records
/// 3. Build every target in declaration order, persisting the manifest
///    after each one
///
/// A failing target aborts the run; targets built before it keep their
/// persisted entries.
#[instrument(skip_all, fields(production = options.production))]
pub async fn build(
    ctx: &BuildContext,
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildOutcome> {
    let start = Instant::now();
    let config_file = ctx.bundles_file(options.config_file.as_deref());

    // --- Phase 1: Bundle definitions ---
    progress.phase("Loading bundle definitions");
    let config = load_bundle_config(&config_file)?;
    if config.is_empty() {
        info!("Nothing to compile on: {}", config_file.display());
        return Ok(BuildOutcome::Empty { config_file });
    }

    let js_dir = ctx.paths.js_dir();
    tokio::fs::create_dir_all(&js_dir)
        .await
        .map_err(|e| KoatonError::io(&js_dir, e))?;

    // --- Phase 2: Cleanup ---
    progress.phase("Removing previous outputs");
    let mut manifest = ctx.store.load().await;
    let cleanup = plan_cleanup(&manifest, &ctx.paths.public_dir).execute().await;

    // --- Phase 3: Targets ---
    progress.phase("Building bundles");
    let development = !options.production;
    let total = config.len();
    let mut targets = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (i, target) in config.targets.iter().enumerate() {
        let Some(kind) = target.kind() else {
            warn!(target = %target.name, "target is neither css nor js, skipping");
            skipped.push(target.name.clone());
            continue;
        };

        progress.target_started(target, i + 1, total);
        let produced = match kind {
            BundleKind::Css => {
                ctx.build_css(&mut manifest, target, development, false).await?;
                true
            }
            BundleKind::Js => !ctx
                .build_js(&mut manifest, target, development, false)
                .await?
                .is_empty(),
        };

        let report = TargetReport {
            name: target.name.clone(),
            kind,
            entry: produced
                .then(|| manifest.get(&target.name).cloned())
                .flatten(),
        };
        progress.target_finished(&report);
        targets.push(report);
    }

    let report = BuildReport {
        config_file,
        targets,
        skipped,
        cleanup,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        targets = report.targets.len(),
        skipped = report.skipped.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "build complete"
    );

    Ok(BuildOutcome::Built(report))
}

/// Resolve every target's inputs without writing anything.
///
/// CSS targets report their watch maps (LESS and SASS entries are still
/// compiled to learn their imports); JS targets report matched files.
#[instrument(skip_all)]
pub async fn collect_paths(
    ctx: &BuildContext,
    config_file: Option<&Path>,
) -> Result<IndexMap<String, TargetPaths>> {
    let config_file = ctx.bundles_file(config_file);
    let config = load_bundle_config(&config_file)?;

    let mut scratch = Manifest::new();
    let mut paths = IndexMap::new();
    for target in &config.targets {
        let resolved = match target.kind() {
            Some(BundleKind::Css) => {
                TargetPaths::Css(ctx.build_css(&mut scratch, target, true, true).await?)
            }
            Some(BundleKind::Js) => {
                TargetPaths::Js(ctx.build_js(&mut scratch, target, true, true).await?)
            }
            None => {
                warn!(target = %target.name, "target is neither css nor js, skipping");
                continue;
            }
        };
        paths.insert(target.name.clone(), resolved);
    }

    Ok(paths)
}
