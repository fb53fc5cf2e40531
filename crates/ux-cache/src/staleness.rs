//! Modification-time staleness check.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Whether a cached artifact can be reused for `source`.
///
/// True only if `cached` exists and was modified strictly after `source`.
/// A missing or unreadable file on either side, or equal timestamps, means
/// the artifact must be regenerated. Source contents are never hashed.
#[must_use]
pub fn is_fresh(cached: &Path, source: &Path) -> bool {
    let (Some(cached_mtime), Some(source_mtime)) = (modified(cached), modified(source)) else {
        return false;
    };
    cached_mtime > source_mtime
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, mtime: SystemTime) {
        fs::write(path, b"data").unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_newer_cache_is_fresh() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("SimpleClass.uxf");
        let cached = tmp.path().join("SimpleClass.svg");
        touch(&source, at(1_000));
        touch(&cached, at(2_000));

        assert!(is_fresh(&cached, &source));
    }

    #[test]
    fn test_equal_timestamps_are_stale() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("SimpleClass.uxf");
        let cached = tmp.path().join("SimpleClass.svg");
        touch(&source, at(1_000));
        touch(&cached, at(1_000));

        assert!(!is_fresh(&cached, &source));
    }

    #[test]
    fn test_newer_source_is_stale() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("SimpleClass.uxf");
        let cached = tmp.path().join("SimpleClass.svg");
        touch(&cached, at(1_000));
        touch(&source, at(2_000));

        assert!(!is_fresh(&cached, &source));
    }

    #[test]
    fn test_missing_cache_is_stale() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("SimpleClass.uxf");
        touch(&source, at(1_000));

        assert!(!is_fresh(&tmp.path().join("missing.svg"), &source));
    }

    #[test]
    fn test_missing_source_is_stale() {
        let tmp = TempDir::new().unwrap();
        let cached = tmp.path().join("SimpleClass.svg");
        touch(&cached, at(2_000));

        assert!(!is_fresh(&cached, &tmp.path().join("missing.uxf")));
    }
}
