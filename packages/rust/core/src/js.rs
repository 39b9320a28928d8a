//! Script bundles: every matched file minified together into one
//! content-addressed output.

use std::path::PathBuf;

use koaton_artifacts::{name_for, write_output};
use koaton_preprocess::{MinifyOptions, SourceMapOptions};
use koaton_shared::{
    BundleKind, BundleTarget, JS_DIR, Manifest, ManifestEntry, OutputDescriptor, Result,
};
use tracing::{debug, info, instrument, warn};

use crate::context::BuildContext;

impl BuildContext {
    /// Build one JS target and return the files it resolved to, in
    /// declaration order.
    ///
    /// Development builds also write `js/<target>.map`, referenced from the
    /// minified code. A target matching no files writes nothing and drops
    /// any entry left from a previous run.
    #[instrument(skip_all, fields(target = %target.name, development = development, paths_only = paths_only))]
    pub async fn build_js(
        &self,
        manifest: &mut Manifest,
        target: &BundleTarget,
        development: bool,
        paths_only: bool,
    ) -> Result<Vec<PathBuf>> {
        let files = koaton_discovery::expand_all(&self.paths.root, &target.sources)?;
        if paths_only {
            return Ok(files);
        }
        if files.is_empty() {
            warn!(target = %target.name, "no source files matched, skipping");
            if manifest.remove(&target.name).is_some() {
                self.store.persist(manifest).await?;
            }
            return Ok(files);
        }

        let map_name = format!("{}.map", target.name);
        let options = MinifyOptions {
            source_map: development.then(|| SourceMapOptions {
                root: format!("/{}", target.name),
                url: format!("/{JS_DIR}/{map_name}"),
            }),
        };
        let minified = self.toolchain.script.minify(&files, &options).await?;

        let js_dir = self.paths.js_dir();
        let file = name_for(target.basename(), ".js", minified.code.as_bytes());
        write_output(&js_dir.join(&file), &minified.code).await?;
        debug!(%file, sources = files.len(), "wrote script bundle");

        if let Some(map) = &minified.source_map {
            write_output(&js_dir.join(&map_name), map).await?;
            debug!(file = %map_name, "wrote source map");
        }

        info!(%file, "js target built");
        manifest.insert(
            target.name.as_str(),
            ManifestEntry::Production(OutputDescriptor::new(BundleKind::Js, &file)),
        );
        self.store.persist(manifest).await?;

        Ok(files)
    }
}
