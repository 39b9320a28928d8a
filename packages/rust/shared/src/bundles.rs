//! Bundle definition loading.
//!
//! A bundle file maps target names to ordered source patterns. Three formats
//! are accepted, chosen by extension:
//! - `.json`: a plain JSON object
//! - `.toml`: top-level keys (quote names containing dots)
//! - `.js`: a `module.exports = {…};` or `export default {…};` module whose
//!   object literal is plain data (JSON5: quotes of either kind, trailing
//!   commas, comments)
//!
//! Key order in the file is the build order.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{KoatonError, Result};
use crate::types::{BundleConfig, BundleTarget};

type RawBundles = IndexMap<String, Vec<String>>;

/// Read and parse the bundle definitions at `path`.
pub fn load_bundle_config(path: &Path) -> Result<BundleConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KoatonError::io(path, e))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let raw = parse_bundles(&content, ext).map_err(|message| {
        KoatonError::config(format!("failed to parse {}: {message}", path.display()))
    })?;

    tracing::debug!(path = %path.display(), targets = raw.len(), "loaded bundle definitions");

    Ok(BundleConfig {
        targets: raw
            .into_iter()
            .map(|(name, sources)| BundleTarget::new(name, sources))
            .collect(),
    })
}

fn parse_bundles(content: &str, ext: &str) -> std::result::Result<RawBundles, String> {
    match ext {
        "toml" => toml::from_str(content).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(content).map_err(|e| e.to_string()),
        _ => {
            let literal = exported_object(content)
                .ok_or_else(|| "no `module.exports = {…}` or `export default {…}` found".to_string())?;
            json5::from_str(&literal)
                .map_err(|e| format!("exported object must be a plain object literal: {e}"))
        }
    }
}

/// Extract the object literal exported by a CommonJS or ES module.
fn exported_object(source: &str) -> Option<String> {
    static EXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?:module\.exports\s*=|export\s+default)\s*\{").expect("valid regex")
    });

    let code = strip_comments(source);
    let found = EXPORT_RE.find(&code)?;
    let open = found.end() - 1;
    balanced_object(&code[open..]).map(str::to_string)
}

/// Drop `//` and `/* */` comments that are not inside string literals.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('/', Some('/')) => {
                while chars.next_if(|&n| n != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            ('"' | '\'' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// The `{…}` at the start of `text`, up to its matching close brace.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("koaton-bundles-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn names(config: &BundleConfig) -> Vec<&str> {
        config.targets.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn commonjs_module_keeps_declaration_order() {
        let path = temp_file(
            "bundles.js",
            r#"'use strict';
// bundles for the public site
module.exports = {
    "zeta.css": ["static/css/a.less", "static/css/b.scss"],
    "app.js": ["static/js/*.js"],
    "alpha.css": ["static/css/*.css"]
};
"#,
        );

        let config = load_bundle_config(&path).expect("parse js module");
        assert_eq!(names(&config), ["zeta.css", "app.js", "alpha.css"]);
        assert_eq!(
            config.targets[0].sources,
            ["static/css/a.less", "static/css/b.scss"]
        );
    }

    #[test]
    fn es_module_default_export() {
        let path = temp_file("bundles.mjs", r#"export default {"main.css": ["a.less"]}"#);
        let config = load_bundle_config(&path).expect("parse es module");
        assert_eq!(names(&config), ["main.css"]);
    }

    #[test]
    fn empty_export_is_empty_config() {
        let path = temp_file("bundles.js", "module.exports = {};\n");
        let config = load_bundle_config(&path).expect("parse");
        assert!(config.is_empty());
    }

    #[test]
    fn json_and_toml_formats() {
        let json = temp_file("bundles.json", r#"{"b.js": ["x.js"], "a.css": []}"#);
        assert_eq!(names(&load_bundle_config(&json).unwrap()), ["b.js", "a.css"]);

        let toml_path = temp_file(
            "bundles.toml",
            "\"b.js\" = [\"x.js\"]\n\"a.css\" = [\"a.less\", \"b.scss\"]\n",
        );
        let config = load_bundle_config(&toml_path).unwrap();
        assert_eq!(names(&config), ["b.js", "a.css"]);
        assert_eq!(config.targets[1].sources.len(), 2);
    }

    #[test]
    fn non_data_literal_is_config_error() {
        let path = temp_file("bundles.js", "module.exports = { main: require('./x') };");
        let err = load_bundle_config(&path).unwrap_err();
        assert!(matches!(err, KoatonError::Config { .. }));
        assert!(err.to_string().contains("plain object literal"));
    }

    #[test]
    fn handwritten_module_syntax() {
        let path = temp_file(
            "bundles.js",
            r#"/* bundles for the public site */
module.exports = {
    'main.css': ['static/css/a.less', "static/css/vendor/*.css"], // vendor last
    /* scripts */
    "app.js": [
        'static/js/*.js',
    ],
}; // end
"#,
        );

        let config = load_bundle_config(&path).expect("parse handwritten module");
        assert_eq!(names(&config), ["main.css", "app.js"]);
        assert_eq!(
            config.targets[0].sources,
            ["static/css/a.less", "static/css/vendor/*.css"]
        );
        assert_eq!(config.targets[1].sources, ["static/js/*.js"]);
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        let path = temp_file(
            "bundles.js",
            r#"module.exports = { "site.css": ["//cdn/x.css", "a/*.css"] };"#,
        );
        let config = load_bundle_config(&path).expect("parse");
        assert_eq!(config.targets[0].sources, ["//cdn/x.css", "a/*.css"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_bundle_config(Path::new("/nonexistent/koaton/bundles.js")).unwrap_err();
        assert!(matches!(err, KoatonError::Io { .. }));
    }
}
