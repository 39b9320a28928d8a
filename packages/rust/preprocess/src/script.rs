//! JS via the `uglifyjs` command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use koaton_shared::{KoatonError, Result};
use regex::Regex;
use tracing::{debug, instrument};

use crate::process::run_tool;
use crate::{MinifiedScript, MinifyOptions, ScriptMinifier};

/// Compression passes requested from the minifier.
const COMPRESS_OPTIONS: &str = "dead_code=true,sequences=true,unused=true";

/// Minifies scripts with an external uglify-js compatible CLI.
#[derive(Debug, Clone)]
pub struct UglifyMinifier {
    program: String,
}

impl UglifyMinifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ScriptMinifier for UglifyMinifier {
    #[instrument(skip_all, fields(files = files.len()))]
    async fn minify(&self, files: &[PathBuf], options: &MinifyOptions) -> Result<MinifiedScript> {
        let blame = files.first().map_or(Path::new("<no input>"), PathBuf::as_path);

        let mut args: Vec<OsString> = files.iter().map(|f| f.as_os_str().to_owned()).collect();
        args.push("--compress".into());
        args.push(COMPRESS_OPTIONS.into());
        if let Some(map) = &options.source_map {
            args.push("--source-map".into());
            args.push(format!("root='{}',url=inline,includeSources", map.root).into());
        }

        let stdout = run_tool(&self.program, &args, blame).await?;

        let Some(map) = &options.source_map else {
            return Ok(MinifiedScript {
                code: stdout,
                source_map: None,
            });
        };

        let (code, encoded) = split_inline_map(&stdout).ok_or_else(|| {
            KoatonError::compile(blame, format!("{} did not emit an inline source map", self.program))
        })?;
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| KoatonError::compile(blame, format!("invalid inline source map: {e}")))?;
        let source_map = String::from_utf8(decoded)
            .map_err(|e| KoatonError::compile(blame, format!("invalid inline source map: {e}")))?;

        debug!(bytes = code.len(), "script minified with source map");
        Ok(MinifiedScript {
            code: format!("{}\n//# sourceMappingURL={}", code.trim_end(), map.url),
            source_map: Some(source_map),
        })
    }
}

/// Split minified code from its trailing base64 `sourceMappingURL` comment.
fn split_inline_map(output: &str) -> Option<(&str, &str)> {
    static MAP_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^//# sourceMappingURL=data:application/json;(?:charset=utf-8;)?base64,([A-Za-z0-9+/=]+)\s*$")
            .expect("valid regex")
    });

    let caps = MAP_RE.captures(output)?;
    let whole = caps.get(0)?;
    let payload = caps.get(1)?;
    Some((&output[..whole.start()], payload.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_trailer_is_split() {
        let encoded = STANDARD.encode(r#"{"version":3}"#);
        let output = format!(
            "var a=1;\n//# sourceMappingURL=data:application/json;charset=utf-8;base64,{encoded}\n"
        );

        let (code, payload) = split_inline_map(&output).unwrap();
        assert_eq!(code, "var a=1;\n");
        assert_eq!(STANDARD.decode(payload).unwrap(), br#"{"version":3}"#);
    }

    #[test]
    fn output_without_trailer_has_no_map() {
        assert!(split_inline_map("var a=1;").is_none());
    }

    #[tokio::test]
    async fn missing_minifier_is_compile_error() {
        let minifier = UglifyMinifier::new("koaton-no-such-uglify-9a8b");
        let err = minifier
            .minify(&[PathBuf::from("a.js")], &MinifyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KoatonError::Compile { .. }));
    }
}
