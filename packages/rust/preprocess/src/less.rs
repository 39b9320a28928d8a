//! LESS via the `lessc` command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use koaton_shared::{CompiledUnit, KoatonError, Result};
use regex::Regex;
use tracing::{debug, instrument};

use crate::process::run_tool;
use crate::{StyleCompiler, StyleOptions};

/// Output name handed to `lessc --depends`; nothing is written to it.
const DEPENDS_TARGET: &str = "koaton-depends.css";

/// Compiles `.less` sources with an external `lessc`. Output without an
/// embedded source map is minified in-process.
#[derive(Debug, Clone)]
pub struct LessCompiler {
    program: String,
}

impl LessCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl StyleCompiler for LessCompiler {
    #[instrument(skip_all, fields(source = %source.display()))]
    async fn compile(&self, source: &Path, options: &StyleOptions) -> Result<CompiledUnit> {
        let mut args: Vec<OsString> = Vec::new();
        if options.embed_source_map {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            args.push("--source-map-map-inline".into());
            args.push("--source-map-include-source".into());
            args.push(format!("--source-map-rootpath=/{name}").into());
        }
        args.push(source.as_os_str().to_owned());

        let raw = run_tool(&self.program, &args, source).await?;
        let (text, source_map) = finish_output(&raw, source)?;
        let dependencies = self.dependencies(source).await?;

        debug!(bytes = text.len(), deps = dependencies.len(), "less compiled");
        Ok(CompiledUnit {
            text,
            source_map,
            dependencies,
        })
    }

    async fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>> {
        let args = [
            OsString::from("--depends"),
            source.as_os_str().to_owned(),
            OsString::from(DEPENDS_TARGET),
        ];
        let stdout = run_tool(&self.program, &args, source).await?;
        Ok(parse_depends(&stdout, source))
    }
}

/// Parse `lessc --depends` output (`<target>: a.less b.less`), putting the
/// source first.
fn parse_depends(stdout: &str, source: &Path) -> Vec<PathBuf> {
    let listed = stdout
        .split_once(": ")
        .map(|(_, rest)| rest)
        .unwrap_or(stdout);

    let mut deps = vec![source.to_path_buf()];
    for dep in split_unescaped(listed).into_iter().map(PathBuf::from) {
        if !deps.contains(&dep) {
            deps.push(dep);
        }
    }
    deps
}

/// Split on whitespace not preceded by a backslash. `\ ` becomes a space;
/// other backslashes (Windows separators) are kept.
fn split_unescaped(listed: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = listed.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek().is_some_and(|next| next.is_whitespace()) => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }
    items
}

/// Split off an embedded map and minify when there is none.
///
/// Mapped output stays exactly as `lessc` produced it so the map's positions
/// remain valid.
fn finish_output(raw: &str, source: &Path) -> Result<(String, Option<String>)> {
    match split_inline_map(raw) {
        (css, Some(map)) => Ok((css.to_string(), Some(map))),
        (css, None) => Ok((minify_css(css, source)?, None)),
    }
}

/// Separate a trailing `/*# sourceMappingURL=… */` comment from the CSS.
fn split_inline_map(css: &str) -> (&str, Option<String>) {
    static MAP_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"/\*# sourceMappingURL=(\S+)\s*\*/\s*$").expect("valid regex")
    });

    match MAP_RE.captures(css) {
        Some(caps) => {
            let start = caps.get(0).map_or(css.len(), |m| m.start());
            (&css[..start], Some(caps[1].to_string()))
        }
        None => (css, None),
    }
}

/// Compress plain CSS.
pub(crate) fn minify_css(css: &str, source: &Path) -> Result<String> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Compressed)
        .input_syntax(grass::InputSyntax::Css);
    grass::from_string(css.to_owned(), &options)
        .map_err(|e| KoatonError::compile(source, format!("failed to minify css: {e}")))
}
