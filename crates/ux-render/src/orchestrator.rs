//! Conversion orchestration.
//!
//! [`ConversionOrchestrator`] ties the pieces together for one builder:
//! format validation, applicability, cache lookup, and conversion on a miss.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Component, Path, PathBuf};

use ux_cache::{CacheKey, CacheStore, is_fresh};

use crate::consts::DIAGRAM_EXTENSION;
use crate::converter::{Converter, ProcessConverter};
use crate::error::ConvertError;
use crate::format::{Consumer, ExportFormat, validate};

/// Settings for a [`ConversionOrchestrator`].
///
/// Passed in explicitly; nothing is read from the environment except the
/// `PATH` lookup for the converter executable.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Documentation source root. Cache keys are derived relative to it.
    pub source_dir: PathBuf,
    /// Cache root directory.
    pub cache_dir: PathBuf,
    /// Explicit converter executable. `None` searches `PATH`.
    pub binary_path: Option<PathBuf>,
    /// Default export format per builder name.
    pub export_formats: HashMap<String, String>,
}

/// One request to produce (or reuse) an image for a diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderRequest {
    /// Diagram path. Relative paths are taken relative to the source root.
    pub source: PathBuf,
    /// Requested format name; `None` uses the builder default.
    pub format: Option<String>,
    /// Image options from the document (alt, width, ...). They do not
    /// affect the cached artifact.
    pub options: BTreeMap<String, String>,
}

impl RenderRequest {
    /// Request for `source` with no explicit format.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Set the requested format name.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Add a rendering option.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Why a request was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source file does not exist. Callers report this as a warning.
    SourceMissing,
    /// Source is not a diagram, or the builder accepts no exportable format.
    NotConvertible,
    /// Source is already an image the builder embeds directly.
    AlreadySupported,
}

/// Non-failing result of a [`RenderRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Image is available at `path`. `cached` is true when no conversion ran.
    Success { path: PathBuf, cached: bool },
    /// Nothing was done.
    Skipped(SkipReason),
}

impl ConversionOutcome {
    /// Produced image path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success { path, .. } => Some(path),
            Self::Skipped(_) => None,
        }
    }
}

/// Converts diagrams for one builder, reusing cached images.
///
/// Safe to share between threads. Requests for different diagrams never
/// touch the same files. Concurrent requests for the same diagram are not
/// serialized: both may convert, and the last committed file wins.
pub struct ConversionOrchestrator {
    source_dir: PathBuf,
    store: CacheStore,
    consumer: Consumer,
    default_format: Option<ExportFormat>,
    converter: Box<dyn Converter>,
}

impl std::fmt::Debug for ConversionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionOrchestrator")
            .field("source_dir", &self.source_dir)
            .field("store", &self.store)
            .field("consumer", &self.consumer)
            .field("default_format", &self.default_format)
            .finish_non_exhaustive()
    }
}

impl ConversionOrchestrator {
    /// Create an orchestrator that runs the `UMLet` executable.
    ///
    /// # Errors
    ///
    /// Fails if the configured default format for `consumer` is unknown or
    /// cannot be embedded by it.
    pub fn new(config: &RenderConfig, consumer: Consumer) -> Result<Self, ConvertError> {
        let converter = ProcessConverter::new(config.binary_path.clone());
        Self::with_converter(config, consumer, Box::new(converter))
    }

    /// Create an orchestrator with a custom converter.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_converter(
        config: &RenderConfig,
        consumer: Consumer,
        converter: Box<dyn Converter>,
    ) -> Result<Self, ConvertError> {
        let configured = config.export_formats.get(consumer.name()).map(String::as_str);
        let default_format = validate(configured, &consumer)?;
        Ok(Self {
            source_dir: normalize(&config.source_dir),
            store: CacheStore::new(&config.cache_dir),
            consumer,
            default_format,
            converter,
        })
    }

    /// Builder this orchestrator converts for.
    #[must_use]
    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    /// Validated default format for the builder, if configured.
    #[must_use]
    pub fn default_format(&self) -> Option<ExportFormat> {
        self.default_format
    }

    /// Format used for a request: the explicit one, else the builder
    /// default, else the first builder MIME type `UMLet` can export.
    ///
    /// # Errors
    ///
    /// Fails if an explicit format is invalid for the builder.
    pub fn target_format(
        &self,
        requested: Option<&str>,
    ) -> Result<Option<ExportFormat>, ConvertError> {
        let explicit = validate(requested, &self.consumer)?;
        Ok(explicit
            .or(self.default_format)
            .or_else(|| self.consumer.preferred_format()))
    }

    /// Produce the image for `request`, converting only if the cached copy
    /// is missing or older than the source.
    ///
    /// `.` and `..` in the source path are collapsed before the cache key is
    /// derived, so every spelling of one diagram shares one entry.
    ///
    /// # Errors
    ///
    /// Format validation, converter and cache I/O failures. A missing
    /// source is not an error; it yields [`SkipReason::SourceMissing`].
    pub fn render(&self, request: &RenderRequest) -> Result<ConversionOutcome, ConvertError> {
        let Some(format) = self.target_format(request.format.as_deref())? else {
            return Ok(ConversionOutcome::Skipped(SkipReason::NotConvertible));
        };

        let source = normalize(&self.source_dir.join(&request.source));
        if !source.is_file() {
            tracing::debug!("(umlet) source not found: {}", source.display());
            return Ok(ConversionOutcome::Skipped(SkipReason::SourceMissing));
        }
        if let Some(reason) = self.inapplicable(&source) {
            tracing::debug!("(umlet) skipping {}: {reason:?}", source.display());
            return Ok(ConversionOutcome::Skipped(reason));
        }

        let relative = source
            .strip_prefix(&self.source_dir)
            .ok()
            .filter(|rel| !rel.starts_with(".."))
            .ok_or_else(|| ConvertError::SourceOutsideRoot {
                path: source.clone(),
                root: self.source_dir.clone(),
            })?;
        let key = CacheKey::derive(relative);
        let target = self
            .store
            .resolve_path(&key, &output_filename(&source, format));

        if is_fresh(&target, &source) {
            tracing::debug!("(umlet) cache hit for '{}'", relative.display());
            return Ok(ConversionOutcome::Success {
                path: target,
                cached: true,
            });
        }

        let staged = self
            .store
            .stage(&target)
            .map_err(|e| ConvertError::io(&target, e))?;
        tracing::info!(
            "(umlet) '{}' -> '{}'",
            relative.display(),
            target
                .strip_prefix(self.store.root())
                .unwrap_or(&target)
                .display()
        );
        let produced = self.converter.convert(&source, format, staged.path())?;
        if produced != staged.path() {
            return Err(ConvertError::io(
                &produced,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "converter reported {} instead of {}",
                        produced.display(),
                        staged.path().display()
                    ),
                ),
            ));
        }
        let path = staged
            .commit()
            .map_err(|e| ConvertError::io(&target, e))?;

        Ok(ConversionOutcome::Success {
            path,
            cached: false,
        })
    }

    /// Reason a source should not be converted at all, judged by extension.
    fn inapplicable(&self, source: &Path) -> Option<SkipReason> {
        let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext.eq_ignore_ascii_case(DIAGRAM_EXTENSION) {
            return None;
        }
        match ExportFormat::from_extension(ext) {
            Some(native) if self.consumer.supports(native.mime_type()) => {
                Some(SkipReason::AlreadySupported)
            }
            _ => Some(SkipReason::NotConvertible),
        }
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root; leading `..` of a relative path are
/// kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Output file name for `source` exported as `format`:
/// the source stem with the format's extension.
#[must_use]
pub fn output_filename(source: &Path, format: ExportFormat) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!("{stem}.{}", format.extension())
}
