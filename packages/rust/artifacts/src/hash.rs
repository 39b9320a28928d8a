//! Content-addressed output naming.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const HASH_LEN: usize = 20;

/// Fingerprint `bytes` as the first [`HASH_LEN`] lowercase hex chars of their SHA-256.
///
/// A cache-busting fingerprint, not a security primitive.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(HASH_LEN);
    hex
}

/// `${basename}_${hash}${ext}` for the given output bytes.
pub fn name_for(basename: &str, ext: &str, bytes: &[u8]) -> String {
    format!("{basename}_{}{ext}", content_hash(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hash_is_twenty_lowercase_hex() {
        let hash = content_hash(b"body{color:red}");
        assert_eq!(hash.len(), HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_is_pure() {
        assert_eq!(content_hash(b"same bytes"), content_hash(b"same bytes"));
        assert_eq!(
            name_for("main", ".css", b"same bytes"),
            name_for("main", ".css", b"same bytes")
        );
    }

    #[test]
    fn known_digest_prefix() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        assert_eq!(content_hash(b""), "e3b0c44298fc1c149afb");
    }

    #[test]
    fn distinct_contents_get_distinct_names() {
        let names: HashSet<String> = (0..500)
            .map(|i| name_for("app", ".js", format!("var build = {i};").as_bytes()))
            .collect();
        assert_eq!(names.len(), 500);
    }

    #[test]
    fn name_layout() {
        let name = name_for("main", ".css", b".a{}");
        assert!(name.starts_with("main_"));
        assert!(name.ends_with(".css"));
        assert_eq!(name.len(), "main_".len() + HASH_LEN + ".css".len());
    }
}
