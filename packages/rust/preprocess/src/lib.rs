//! Preprocessor and minifier adapters.
//!
//! The builders talk to three capabilities through traits so the toolchain
//! can be swapped (or faked in tests):
//! - [`StyleCompiler`] for LESS ([`LessCompiler`], runs `lessc`) and
//!   SASS/SCSS ([`SassCompiler`], in-process via `grass`)
//! - [`ScriptMinifier`] for JS ([`UglifyMinifier`], runs `uglifyjs`)

mod less;
mod process;
mod sass;
mod script;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use koaton_shared::{CompiledUnit, Result, ToolsConfig};

pub use less::LessCompiler;
pub use sass::SassCompiler;
pub use script::UglifyMinifier;

// ---------------------------------------------------------------------------
// Stylesheets
// ---------------------------------------------------------------------------

/// Options for compiling one stylesheet source.
#[derive(Debug, Clone, Default)]
pub struct StyleOptions {
    /// Request a source map embedded as a `data:` URI (development builds).
    pub embed_source_map: bool,
}

/// A CSS-family preprocessor.
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    /// Compile `source` to minified CSS, reporting the files it pulled in.
    async fn compile(&self, source: &Path, options: &StyleOptions) -> Result<CompiledUnit>;

    /// Only resolve the import graph of `source` (the source itself first).
    async fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>>;
}

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

/// Source-map settings for a minified script.
#[derive(Debug, Clone)]
pub struct SourceMapOptions {
    /// `sourceRoot` recorded in the map.
    pub root: String,
    /// URL the minified code points at through its `sourceMappingURL` trailer.
    pub url: String,
}

/// Options for one minification pass.
#[derive(Debug, Clone, Default)]
pub struct MinifyOptions {
    pub source_map: Option<SourceMapOptions>,
}

/// Output of one minification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifiedScript {
    /// Minified code; ends with a `sourceMappingURL` trailer when a map was requested.
    pub code: String,
    /// Source map JSON, when requested.
    pub source_map: Option<String>,
}

/// A JS minifier applying dead-code elimination, statement sequencing and
/// unused-binding removal over all inputs at once.
#[async_trait]
pub trait ScriptMinifier: Send + Sync {
    async fn minify(&self, files: &[PathBuf], options: &MinifyOptions) -> Result<MinifiedScript>;
}

// ---------------------------------------------------------------------------
// Toolchain
// ---------------------------------------------------------------------------

/// The set of compilers a build uses.
pub struct Toolchain {
    pub less: Box<dyn StyleCompiler>,
    pub sass: Box<dyn StyleCompiler>,
    pub script: Box<dyn ScriptMinifier>,
}

impl Toolchain {
    pub fn new(
        less: Box<dyn StyleCompiler>,
        sass: Box<dyn StyleCompiler>,
        script: Box<dyn ScriptMinifier>,
    ) -> Self {
        Self { less, sass, script }
    }

    /// Default toolchain using the configured external commands.
    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::new(
            Box::new(LessCompiler::new(&tools.lessc)),
            Box::new(SassCompiler),
            Box::new(UglifyMinifier::new(&tools.uglifyjs)),
        )
    }

    /// The preprocessor for `source`, or `None` for plain CSS (literal or glob).
    pub fn style_for(&self, source: &Path) -> Option<&dyn StyleCompiler> {
        match source.extension().and_then(|e| e.to_str()) {
            Some("less") => Some(self.less.as_ref()),
            Some("scss" | "sass") => Some(self.sass.as_ref()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}
