//! SASS/SCSS compiled in-process with `grass`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use koaton_shared::{CompiledUnit, KoatonError, Result};
use tracing::{debug, instrument};

use crate::{StyleCompiler, StyleOptions};

/// Compiles `.scss` and `.sass` sources to compressed CSS. Extensionless
/// imports also resolve to plain `.css` files, which are inlined.
///
/// `grass` does not emit source maps, so development units carry none.
#[derive(Debug, Clone, Copy, Default)]
pub struct SassCompiler;

#[async_trait]
impl StyleCompiler for SassCompiler {
    #[instrument(skip_all, fields(source = %source.display()))]
    async fn compile(&self, source: &Path, _options: &StyleOptions) -> Result<CompiledUnit> {
        let unit = compile_sass(source)?;
        debug!(bytes = unit.text.len(), deps = unit.dependencies.len(), "sass compiled");
        Ok(unit)
    }

    async fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>> {
        compile_sass(source).map(|unit| unit.dependencies)
    }
}

fn compile_sass(source: &Path) -> Result<CompiledUnit> {
    let fs = RecordingFs::default();
    let mut options = grass::Options::default()
        .style(grass::OutputStyle::Compressed)
        .fs(&fs);
    if let Some(dir) = source.parent() {
        options = options.load_path(dir);
    }

    let text = grass::from_path(source, &options)
        .map_err(|e| KoatonError::compile(source, e.to_string()))?;

    Ok(CompiledUnit {
        text,
        source_map: None,
        dependencies: fs.included(source),
    })
}

// ---------------------------------------------------------------------------
// Filesystem hook
// ---------------------------------------------------------------------------

/// Real filesystem access that remembers every file the compiler read.
#[derive(Debug, Default)]
struct RecordingFs {
    read: Mutex<Vec<PathBuf>>,
}

impl RecordingFs {
    /// Files read during compilation, entry first, without duplicates.
    fn included(&self, entry: &Path) -> Vec<PathBuf> {
        let mut files = vec![entry.to_path_buf()];
        let read = self.read.lock().map(|r| r.clone()).unwrap_or_default();
        for path in read {
            if path != entry && !files.contains(&path) {
                files.push(path);
            }
        }
        files
    }
}

impl grass::Fs for RecordingFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        let bytes = std::fs::read(path)?;
        if let Ok(mut read) = self.read.lock() {
            read.push(path.to_path_buf());
        }
        Ok(bytes)
    }
}
