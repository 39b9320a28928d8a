//! Fake toolchain and project fixtures shared by the builder tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use koaton_preprocess::{
    MinifiedScript, MinifyOptions, SassCompiler, ScriptMinifier, StyleCompiler, StyleOptions,
    Toolchain,
};
use koaton_shared::{CompiledUnit, KoatonError, PathsConfig, ProjectPaths, Result};

use crate::context::BuildContext;

/// Map payload the fake LESS compiler attaches in development.
pub(crate) const FAKE_LESS_MAP: &str = "data:application/json;base64,e30=";

/// Map JSON the fake minifier returns when asked for one.
pub(crate) const FAKE_JS_MAP: &str = r#"{"version":3,"sources":[]}"#;

/// Returns the trimmed source text; its only dependency is the source.
pub(crate) struct FakeLess;

#[async_trait]
impl StyleCompiler for FakeLess {
    async fn compile(&self, source: &Path, options: &StyleOptions) -> Result<CompiledUnit> {
        let text = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| KoatonError::compile(source, e.to_string()))?;
        Ok(CompiledUnit {
            text: text.trim().to_string(),
            source_map: options.embed_source_map.then(|| FAKE_LESS_MAP.to_string()),
            dependencies: vec![source.to_path_buf()],
        })
    }

    async fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>> {
        Ok(vec![source.to_path_buf()])
    }
}

/// Joins trimmed file contents with `\n`.
pub(crate) struct FakeMinifier;

#[async_trait]
impl ScriptMinifier for FakeMinifier {
    async fn minify(&self, files: &[PathBuf], options: &MinifyOptions) -> Result<MinifiedScript> {
        let mut parts = Vec::new();
        for file in files {
            let text = tokio::fs::read_to_string(file)
                .await
                .map_err(|e| KoatonError::compile(file, e.to_string()))?;
            parts.push(text.trim().to_string());
        }
        let mut code = parts.join("\n");
        let source_map = options.source_map.as_ref().map(|map| {
            code.push_str(&format!("\n//# sourceMappingURL={}", map.url));
            FAKE_JS_MAP.to_string()
        });
        Ok(MinifiedScript { code, source_map })
    }
}

/// Always fails, like a minifier rejecting a syntax error.
pub(crate) struct FailingMinifier;

#[async_trait]
impl ScriptMinifier for FailingMinifier {
    async fn minify(&self, files: &[PathBuf], _options: &MinifyOptions) -> Result<MinifiedScript> {
        let first = files.first().cloned().unwrap_or_default();
        Err(KoatonError::compile(first, "Unexpected token: eof"))
    }
}

/// A temporary project containing `files`.
pub(crate) fn project(files: &[(&str, &str)]) -> PathBuf {
    let root = std::env::temp_dir().join(format!("koaton-core-test-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&root).unwrap();
    for (name, content) in files {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
    }
    root
}

/// A context with the fake LESS compiler, real SASS, and the fake minifier.
pub(crate) fn context(root: &Path) -> BuildContext {
    context_with(root, Box::new(FakeMinifier))
}

pub(crate) fn context_with(root: &Path, script: Box<dyn ScriptMinifier>) -> BuildContext {
    BuildContext::new(
        ProjectPaths::new(root, &PathsConfig::default()),
        Toolchain::new(Box::new(FakeLess), Box::new(SassCompiler), script),
    )
}

/// Sorted file names in `dir`; empty when it does not exist.
pub(crate) fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
