//! Copying produced images into the build output.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use ux_cache::CacheStore;

/// Directory under the output root that receives images.
pub const IMAGES_DIRNAME: &str = "_images";

/// Copies cached images to `<output>/_images/`.
///
/// A copy is refreshed only when the cached image is newer, and keeps the
/// cached image's modification time, so an unchanged diagram leaves the
/// output untouched across builds. Distinct images sharing a file name get
/// a numeric suffix (`Diagram1.svg`).
#[derive(Debug)]
pub struct ImageCollector {
    images_dir: PathBuf,
    assigned: HashMap<PathBuf, String>,
    taken: HashSet<String>,
}

impl ImageCollector {
    /// Collector writing below `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        Self {
            images_dir: output_dir.join(IMAGES_DIRNAME),
            assigned: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    /// Destination directory.
    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Copy `artifact` into the images directory if needed.
    ///
    /// Returns the destination path.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact has no file name or copying fails.
    pub fn collect(&mut self, artifact: &Path) -> io::Result<PathBuf> {
        let name = self.name_for(artifact)?;
        let dest = self.images_dir.join(&name);

        let source_mtime = fs::metadata(artifact)?.modified()?;
        let current = fs::metadata(&dest).and_then(|m| m.modified()).ok();
        if current.is_some_and(|mtime| mtime >= source_mtime) {
            tracing::debug!("image up to date: {}", dest.display());
            return Ok(dest);
        }

        CacheStore::ensure_directory(&self.images_dir)?;
        fs::copy(artifact, &dest)?;
        File::options()
            .write(true)
            .open(&dest)?
            .set_modified(source_mtime)?;
        tracing::debug!("copied {} -> {}", artifact.display(), dest.display());
        Ok(dest)
    }

    fn name_for(&mut self, artifact: &Path) -> io::Result<String> {
        if let Some(name) = self.assigned.get(artifact) {
            return Ok(name.clone());
        }
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("image path has no file name: {}", artifact.display()),
                )
            })?;

        let mut name = file_name.clone();
        let mut counter = 0;
        while self.taken.contains(&name) {
            counter += 1;
            name = match file_name.rsplit_once('.') {
                Some((stem, ext)) => format!("{stem}{counter}.{ext}"),
                None => format!("{file_name}{counter}"),
            };
        }
        self.taken.insert(name.clone());
        self.assigned.insert(artifact.to_path_buf(), name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Consumer;
    use crate::mock::MockConverter;
    use crate::orchestrator::{ConversionOrchestrator, RenderConfig};
    use crate::target::{RecordedAssets, RenderTarget};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, secs: u64) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_collect_copies_with_mtime() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("cache/abc/SimpleClass.svg");
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, "<svg/>").unwrap();
        set_mtime(&artifact, 5_000);

        let mut collector = ImageCollector::new(&tmp.path().join("out"));
        let dest = collector.collect(&artifact).unwrap();

        assert_eq!(dest, tmp.path().join("out/_images/SimpleClass.svg"));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "<svg/>");
        assert_eq!(mtime(&dest), mtime(&artifact));
    }

    #[test]
    fn test_collect_skips_up_to_date_copy() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("SimpleClass.svg");
        fs::write(&artifact, "<svg/>").unwrap();
        set_mtime(&artifact, 5_000);

        let mut collector = ImageCollector::new(&tmp.path().join("out"));
        let dest = collector.collect(&artifact).unwrap();
        fs::write(&dest, "edited").unwrap();
        set_mtime(&dest, 5_000);

        collector.collect(&artifact).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "edited");
    }

    #[test]
    fn test_collect_disambiguates_names() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("a/Diagram.svg");
        let second = tmp.path().join("b/Diagram.svg");
        for path in [&first, &second] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "<svg/>").unwrap();
        }

        let mut collector = ImageCollector::new(tmp.path());
        let dest_first = collector.collect(&first).unwrap();
        let dest_second = collector.collect(&second).unwrap();

        assert!(dest_first.ends_with("_images/Diagram.svg"));
        assert!(dest_second.ends_with("_images/Diagram1.svg"));
        assert_eq!(collector.collect(&first).unwrap(), dest_first);
    }

    #[test]
    fn test_collect_missing_artifact_fails() {
        let tmp = TempDir::new().unwrap();
        let mut collector = ImageCollector::new(tmp.path());
        assert!(collector.collect(&tmp.path().join("missing.svg")).is_err());
    }

    /// Two builds over the same tree, then a third after editing the diagram.
    #[test]
    fn test_repeated_builds_only_refresh_changed_diagrams() {
        let tmp = TempDir::new().unwrap();
        let source_dir = tmp.path().join("docs");
        let output_dir = tmp.path().join("_build/html");
        fs::create_dir_all(&source_dir).unwrap();
        let source = source_dir.join("SimpleClass.uxf");
        fs::write(&source, "<diagram/>").unwrap();
        set_mtime(&source, 1_000);

        let config = RenderConfig {
            source_dir: source_dir.clone(),
            cache_dir: tmp.path().join("_build/doctrees/umlet"),
            binary_path: None,
            export_formats: HashMap::from([("html".to_owned(), "svg".to_owned())]),
        };
        let converter = std::sync::Arc::new(MockConverter::new());
        let orchestrator = ConversionOrchestrator::with_converter(
            &config,
            Consumer::html(),
            Box::new(std::sync::Arc::clone(&converter)),
        )
        .unwrap();

        let build = || {
            let mut target = RenderTarget::diagram("SimpleClass.uxf");
            orchestrator
                .apply(&mut target, &mut RecordedAssets::default())
                .unwrap();
            ImageCollector::new(&output_dir).collect(&target.uri).unwrap()
        };

        let image = build();
        assert_eq!(image, output_dir.join("_images/SimpleClass.svg"));
        assert!(image.is_file());
        let first_mtime = mtime(&image);

        build();
        assert_eq!(mtime(&image), first_mtime);
        assert_eq!(converter.call_count(), 1);

        // Move the first build into the past so the rebuild is observably later
        let cached = orchestrator
            .apply(
                &mut RenderTarget::diagram("SimpleClass.uxf"),
                &mut RecordedAssets::default(),
            )
            .unwrap()
            .path()
            .unwrap()
            .to_path_buf();
        set_mtime(&cached, 2_000);
        set_mtime(&image, 2_000);
        fs::write(&source, "<diagram changed=\"yes\"/>").unwrap();
        set_mtime(&source, 3_000);

        build();
        assert!(mtime(&image) > SystemTime::UNIX_EPOCH + Duration::from_secs(2_000));
        assert_eq!(converter.call_count(), 2);
    }
}
