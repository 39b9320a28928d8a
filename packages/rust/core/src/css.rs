//! Stylesheet bundles.
//!
//! Each source of a CSS target is one unit: a LESS or SASS entry compiled by
//! the toolchain, or a literal/glob set of plain CSS files read as-is.
//! Development writes one file per unit (`css/<index><target>`); production
//! writes a single content-addressed concatenation.

use std::path::Path;

use koaton_artifacts::{Removal, name_for, remove_output, write_output};
use koaton_preprocess::StyleOptions;
use koaton_shared::{
    BundleKind, BundleTarget, CompiledUnit, KoatonError, Manifest, ManifestEntry,
    OutputDescriptor, Result, WatchMap,
};
use tracing::{debug, info, instrument, warn};

use crate::context::BuildContext;

impl BuildContext {
    /// Build one CSS target and return its watch map.
    ///
    /// With `paths_only` nothing is written and the manifest is untouched.
    /// Otherwise the target's entry is replaced and the manifest persisted.
    #[instrument(skip_all, fields(target = %target.name, development = development, paths_only = paths_only))]
    pub async fn build_css(
        &self,
        manifest: &mut Manifest,
        target: &BundleTarget,
        development: bool,
        paths_only: bool,
    ) -> Result<WatchMap> {
        let css_dir = self.paths.css_dir();
        let options = StyleOptions {
            embed_source_map: development,
        };

        let mut watch = WatchMap::new();
        let mut dev_outputs = Vec::new();
        let mut bundle = Vec::new();

        for (index, pattern) in target.sources.iter().enumerate() {
            let key = format!("{index}{}", target.name);

            if !development && !paths_only {
                remove_stale(&css_dir.join(&key)).await;
            }

            let unit = self.compile_source(pattern, &options, paths_only).await?;
            watch.insert(key.clone(), unit.dependencies);
            if paths_only {
                continue;
            }

            if development {
                let mut text = unit.text;
                if let Some(map) = unit.source_map {
                    text.push_str(&format!("\n/*# sourceMappingURL={map} */"));
                }
                write_output(&css_dir.join(&key), text).await?;
                debug!(file = %key, "wrote development stylesheet");
                dev_outputs.push(OutputDescriptor::new(BundleKind::Css, &key));
            } else {
                bundle.push(unit.text);
            }
        }

        if paths_only {
            return Ok(watch);
        }

        let entry = if development {
            ManifestEntry::Development(dev_outputs)
        } else {
            let content = bundle.join("\n");
            let file = name_for(target.basename(), target.extension(), content.as_bytes());
            write_output(&css_dir.join(&file), &content).await?;
            debug!(%file, bytes = content.len(), "wrote production stylesheet");
            ManifestEntry::Production(OutputDescriptor::new(BundleKind::Css, &file))
        };

        info!(outputs = entry.outputs().len(), "css target built");
        manifest.insert(target.name.as_str(), entry);
        self.store.persist(manifest).await?;

        Ok(watch)
    }

    /// Compile (or only resolve) one source pattern of a CSS target.
    async fn compile_source(
        &self,
        pattern: &str,
        options: &StyleOptions,
        paths_only: bool,
    ) -> Result<CompiledUnit> {
        let source = self.paths.root.join(pattern);
        match self.toolchain.style_for(&source) {
            Some(compiler) if paths_only => compiler
                .dependencies(&source)
                .await
                .map(CompiledUnit::dependencies_only),
            Some(compiler) => compiler.compile(&source, options).await,
            None => plain_css(&self.paths.root, pattern, paths_only).await,
        }
    }
}

/// Literal or globbed CSS files, concatenated in match order.
async fn plain_css(root: &Path, pattern: &str, paths_only: bool) -> Result<CompiledUnit> {
    let files = koaton_discovery::expand(root, pattern)?;
    if paths_only {
        return Ok(CompiledUnit::dependencies_only(files));
    }

    let mut parts = Vec::with_capacity(files.len());
    for file in &files {
        let text = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| KoatonError::io(file, e))?;
        parts.push(text);
    }

    Ok(CompiledUnit {
        text: parts.join("\n"),
        source_map: None,
        dependencies: files,
    })
}

/// Best-effort removal of a development file left behind by a previous run.
async fn remove_stale(path: &Path) {
    match remove_output(path).await {
        Ok(Removal::Removed) => debug!(path = %path.display(), "removed stale development file"),
        Ok(Removal::Missing) => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove stale development file"),
    }
}
