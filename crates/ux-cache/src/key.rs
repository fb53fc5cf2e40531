//! Cache key derivation.
//!
//! Provides [`CacheKey`] for naming cache entry directories.

use std::fmt;
use std::path::{Component, Path};

use sha1::{Digest, Sha1};

/// Identifier of a cache entry directory.
///
/// Derived only from the source path relative to the documentation root, so
/// temporary build directories and different checkouts of the same project
/// share cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a source path relative to the documentation root.
    ///
    /// # Hash Format
    ///
    /// Lowercase hex SHA-1 (40 characters) of the UTF-8 path with components
    /// joined by `/`, whatever the platform separator is.
    #[must_use]
    pub fn derive(relative_source: &Path) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(portable_path(relative_source).as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex representation used as the directory name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a relative path with `/` separators, dropping `.` components.
fn portable_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = match component {
            Component::CurDir => continue,
            Component::Normal(part) => part.to_string_lossy(),
            other => other.as_os_str().to_string_lossy(),
        };
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_is_deterministic() {
        let key1 = CacheKey::derive(Path::new("SimpleClass.uxf"));
        let key2 = CacheKey::derive(Path::new("SimpleClass.uxf"));
        let key3 = CacheKey::derive(Path::new("Usecase.uxf"));

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_key_known_digest() {
        // sha1("SimpleClass.uxf")
        let key = CacheKey::derive(Path::new("SimpleClass.uxf"));
        assert_eq!(key.as_str(), "9cb7ad6b543c393481e5a1d66a0a9e896bfa5b7f");
    }

    #[test]
    fn test_key_format() {
        let key = CacheKey::derive(Path::new("diagrams/SimpleClass.uxf"));

        assert_eq!(key.as_str().len(), 40, "SHA-1 hash should be 40 hex characters");
        assert!(
            key.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)),
            "Hash should contain only lowercase hex digits"
        );
    }

    #[test]
    fn test_key_nested_path() {
        // sha1("diagrams/SimpleClass.uxf")
        let key = CacheKey::derive(Path::new("diagrams/SimpleClass.uxf"));
        assert_eq!(key.as_str(), "fe79ff2a65a5fa836fd77b04fe0c6d738599d795");
    }

    #[test]
    fn test_key_ignores_cur_dir_components() {
        let plain = CacheKey::derive(Path::new("diagrams/SimpleClass.uxf"));
        let dotted = CacheKey::derive(Path::new("./diagrams/./SimpleClass.uxf"));
        assert_eq!(plain, dotted);
    }

    #[test]
    fn test_key_does_not_depend_on_build_root() {
        // Two different build roots holding the same relative source
        let first = Path::new("/tmp/build-a/src/SimpleClass.uxf");
        let second = Path::new("/var/tmp/ci-run-42/src/SimpleClass.uxf");

        let key_a = CacheKey::derive(first.strip_prefix("/tmp/build-a/src").unwrap());
        let key_b = CacheKey::derive(second.strip_prefix("/var/tmp/ci-run-42/src").unwrap());

        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_key_display() {
        let key = CacheKey::derive(Path::new("SimpleClass.uxf"));
        assert_eq!(key.to_string(), key.as_str());
    }
}
