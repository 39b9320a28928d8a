//! Source pattern expansion.
//!
//! Bundle sources are literal paths or globs relative to the project root.
//! A pattern expands to the files it matches, sorted by path; a pattern that
//! matches nothing contributes nothing and is not an error.
//!
//! Supported glob syntax: `*` and `?` within one path component, `**` across
//! components, and `[...]` / `[!...]` character classes. Hidden files are only
//! matched by pattern components that themselves start with `.`.

use std::path::{Path, PathBuf};

use koaton_shared::{KoatonError, Result};
use regex::Regex;
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Characters that make a pattern component a glob.
const GLOB_CHARS: &[char] = &['*', '?', '['];

/// Expand every pattern and concatenate the matches in pattern order.
pub fn expand_all(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        files.extend(expand(root, pattern)?);
    }
    Ok(files)
}

/// Expand one pattern against `root`.
#[instrument(skip(root), fields(root = %root.display()))]
pub fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let normalized = normalize(pattern);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    if !is_glob(&normalized) {
        let path = root.join(&normalized);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    }

    let (base, rest) = split_base(&normalized);
    let base_dir = root.join(base);
    if !base_dir.is_dir() {
        debug!(base = %base_dir.display(), "glob base does not exist");
        return Ok(Vec::new());
    }

    let matcher = glob_to_regex(rest).ok_or_else(|| {
        KoatonError::validation(format!("invalid source pattern '{pattern}'"))
    })?;
    let allow_hidden = rest.split('/').any(|part| part.starts_with('.'));

    let mut walker = WalkDir::new(&base_dir).min_depth(1);
    if !rest.contains("**") {
        walker = walker.max_depth(rest.split('/').count());
    }

    let mut matches: Vec<(String, PathBuf)> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(&base_dir).ok()?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !allow_hidden && rel.split('/').any(|part| part.starts_with('.')) {
                return None;
            }
            matcher
                .is_match(&rel)
                .then(|| (rel, entry.path().to_path_buf()))
        })
        .collect();

    matches.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(count = matches.len(), "pattern expanded");

    Ok(matches.into_iter().map(|(_, path)| path).collect())
}

/// Whether a pattern contains glob syntax.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_CHARS)
}

/// Use forward slashes and drop a leading `./`.
fn normalize(pattern: &str) -> String {
    let unified = pattern.trim().replace('\\', "/");
    unified
        .strip_prefix("./")
        .map(str::to_string)
        .unwrap_or(unified)
}

/// Split a glob into its literal directory prefix and the globbed remainder.
fn split_base(pattern: &str) -> (&str, &str) {
    let mut offset = 0;
    for part in pattern.split('/') {
        if is_glob(part) {
            break;
        }
        offset += part.len() + 1;
    }
    if offset == 0 {
        ("", pattern)
    } else {
        (&pattern[..offset - 1], &pattern[offset..])
    }
}

/// Convert a glob pattern to an anchored regex over `/`-separated paths.
///
/// `-` is left unescaped: it is literal outside a class and a range inside one.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*/", "(?:.*/)?")
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", "[^/]")
        .replace(r"\[!", "[^")
        .replace(r"\[", "[")
        .replace(r"\]", "]")
        .replace(r"\-", "-");
    Regex::new(&format!("^{escaped}$")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_project(files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("koaton-discovery-test-{}", uuid::Uuid::now_v7()));
        for file in files {
            let path = dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!("/* {file} */")).unwrap();
        }
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn rel(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn literal_paths_resolve_when_present() {
        let root = temp_project(&["styles/site.css"]);

        assert_eq!(rel(&root, &expand(&root, "styles/site.css").unwrap()), ["styles/site.css"]);
        assert_eq!(rel(&root, &expand(&root, "./styles/site.css").unwrap()), ["styles/site.css"]);
        assert!(expand(&root, "styles/missing.css").unwrap().is_empty());
        assert!(expand(&root, "styles").unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn star_matches_within_one_directory_sorted() {
        let root = temp_project(&["src/c.js", "src/a.js", "src/b.js", "src/nested/d.js", "src/e.css"]);

        let files = expand(&root, "src/*.js").unwrap();
        assert_eq!(rel(&root, &files), ["src/a.js", "src/b.js", "src/c.js"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn double_star_crosses_directories() {
        let root = temp_project(&["src/a.js", "src/nested/d.js", "src/nested/deeper/e.js"]);

        let files = expand(&root, "src/**/*.js").unwrap();
        assert_eq!(
            rel(&root, &files),
            ["src/a.js", "src/nested/d.js", "src/nested/deeper/e.js"]
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn hidden_files_need_explicit_dot() {
        let root = temp_project(&["src/.secret.js", "src/visible.js"]);

        assert_eq!(rel(&root, &expand(&root, "src/*.js").unwrap()), ["src/visible.js"]);
        assert_eq!(rel(&root, &expand(&root, "src/.*.js").unwrap()), ["src/.secret.js"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn character_classes_and_question_mark() {
        let root = temp_project(&["a1.css", "a2.css", "b1.css", "a10.css", "c1.css", "d1.css", "x-y.css"]);

        assert_eq!(rel(&root, &expand(&root, "a?.css").unwrap()), ["a1.css", "a2.css"]);
        assert_eq!(rel(&root, &expand(&root, "[!a]1.css").unwrap()), ["b1.css", "c1.css", "d1.css"]);
        assert_eq!(rel(&root, &expand(&root, "[ab]1.css").unwrap()), ["a1.css", "b1.css"]);
        assert_eq!(
            rel(&root, &expand(&root, "[a-c]1.css").unwrap()),
            ["a1.css", "b1.css", "c1.css"]
        );
        assert_eq!(rel(&root, &expand(&root, "[!a-c]1.css").unwrap()), ["d1.css"]);
        assert_eq!(rel(&root, &expand(&root, "x-*.css").unwrap()), ["x-y.css"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn expand_all_preserves_pattern_order() {
        let root = temp_project(&["vendor/z.js", "app/a.js", "app/b.js"]);
        let patterns = vec![
            "vendor/*.js".to_string(),
            "nothing/*.js".to_string(),
            "app/*.js".to_string(),
        ];

        let files = expand_all(&root, &patterns).unwrap();
        assert_eq!(rel(&root, &files), ["vendor/z.js", "app/a.js", "app/b.js"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn split_base_stops_at_first_glob_component() {
        assert_eq!(split_base("static/js/*.js"), ("static/js", "*.js"));
        assert_eq!(split_base("*.js"), ("", "*.js"));
        assert_eq!(split_base("src/**/x/*.js"), ("src", "**/x/*.js"));
    }
}
