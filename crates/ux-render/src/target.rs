//! Image references found in documents.
//!
//! A [`RenderTarget`] is the builder-side view of one image: candidate
//! files keyed by MIME type, CSS classes, and an optional `format` option.
//! [`ConversionOrchestrator::apply`] picks the conversion rule, renders the
//! diagram and rewrites the candidates to point at the produced image.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::consts::{DIAGRAM_CLASS, DIAGRAM_MIME_TYPE, WILDCARD};
use crate::error::ConvertError;
use crate::format::{Consumer, ExportFormat, validate};
use crate::orchestrator::{ConversionOrchestrator, ConversionOutcome, RenderRequest, SkipReason};

/// `(from, to)` MIME type pairs the converter handles.
///
/// The generic diagram type converts to any exportable type; a diagram
/// tagged with an explicit format only converts to that format.
pub const CONVERSION_RULES: [(&str, &str); 8] = [
    ("application/x-umlet", "image/png"),
    ("application/x-umlet", "image/jpeg"),
    ("application/x-umlet", "image/svg+xml"),
    ("application/x-umlet", "application/pdf"),
    ("application/x-umlet-png", "image/png"),
    ("application/x-umlet-jpg", "image/jpeg"),
    ("application/x-umlet-svg", "image/svg+xml"),
    ("application/x-umlet-pdf", "application/pdf"),
];

/// An image reference in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTarget {
    /// Path currently referenced by the document.
    pub uri: PathBuf,
    /// Candidate files keyed by MIME type, or [`WILDCARD`].
    pub candidates: BTreeMap<String, PathBuf>,
    /// CSS classes; diagrams carry `umlet`.
    pub classes: Vec<String>,
    /// Explicit `format` option.
    pub format: Option<String>,
    /// Remaining image options (alt, width, align, ...).
    pub options: BTreeMap<String, String>,
}

impl RenderTarget {
    /// Diagram reference to `source` (relative to the documentation root).
    #[must_use]
    pub fn diagram(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            uri: source.clone(),
            candidates: BTreeMap::from([(WILDCARD.to_owned(), source)]),
            classes: vec![DIAGRAM_CLASS.to_owned()],
            ..Self::default()
        }
    }

    /// Set the explicit `format` option.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Whether the reference was produced by a diagram directive.
    #[must_use]
    pub fn is_diagram(&self) -> bool {
        self.classes.iter().any(|c| c == DIAGRAM_CLASS)
    }
}

/// Receives every image produced for a document.
pub trait AssetRegistry {
    /// Record that `produced` was generated from `original`.
    fn register(&mut self, produced: &Path, original: &Path);
}

/// [`AssetRegistry`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordedAssets {
    /// Produced image -> diagram it was generated from.
    pub original_uri: BTreeMap<PathBuf, PathBuf>,
    /// Produced images in registration order.
    pub files: Vec<PathBuf>,
}

impl AssetRegistry for RecordedAssets {
    fn register(&mut self, produced: &Path, original: &Path) {
        self.original_uri
            .insert(produced.to_path_buf(), original.to_path_buf());
        if !self.files.iter().any(|f| f == produced) {
            self.files.push(produced.to_path_buf());
        }
    }
}

/// MIME type of a diagram, specialised by its export format when known.
#[must_use]
pub fn diagram_mime_type(format: Option<ExportFormat>) -> String {
    match format {
        Some(format) => format!("{DIAGRAM_MIME_TYPE}-{format}"),
        None => DIAGRAM_MIME_TYPE.to_owned(),
    }
}

/// First rule converting `from` into a type the consumer embeds.
///
/// Consumer MIME types are tried in the consumer's preference order.
#[must_use]
pub fn conversion_rule(from: &str, consumer: &Consumer) -> Option<(&'static str, &'static str)> {
    consumer.supported_mime_types().iter().find_map(|supported| {
        CONVERSION_RULES
            .iter()
            .find(|(rule_from, rule_to)| *rule_from == from && *rule_to == supported.as_str())
            .copied()
    })
}

impl ConversionOrchestrator {
    /// MIME types a reference is treated as.
    ///
    /// Empty for non-diagram references.
    ///
    /// # Errors
    ///
    /// Fails if the reference's `format` option is invalid for the builder.
    pub fn guess_mime_types(&self, target: &RenderTarget) -> Result<Vec<String>, ConvertError> {
        if !target.is_diagram() {
            return Ok(Vec::new());
        }
        let explicit = validate(target.format.as_deref(), self.consumer())?;
        Ok(vec![diagram_mime_type(explicit.or(self.default_format()))])
    }

    /// Convert the diagram behind `target` and point the reference at the
    /// produced image.
    ///
    /// On success the matching candidate (the wildcard if present, else the
    /// target MIME type) and the URI are replaced, and the image is
    /// registered with `assets`. Skips leave `target` untouched.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    pub fn apply(
        &self,
        target: &mut RenderTarget,
        assets: &mut dyn AssetRegistry,
    ) -> Result<ConversionOutcome, ConvertError> {
        if target.candidates.keys().any(|m| self.consumer().supports(m)) {
            return Ok(ConversionOutcome::Skipped(SkipReason::AlreadySupported));
        }
        let guessed = self.guess_mime_types(target)?;
        let Some((from, to)) = guessed
            .iter()
            .find_map(|mime| conversion_rule(mime, self.consumer()))
        else {
            return Ok(ConversionOutcome::Skipped(SkipReason::NotConvertible));
        };
        let Some(format) = ExportFormat::from_mime_type(to) else {
            return Ok(ConversionOutcome::Skipped(SkipReason::NotConvertible));
        };
        let Some(source) = target
            .candidates
            .get(from)
            .or_else(|| target.candidates.get(WILDCARD))
            .cloned()
        else {
            return Ok(ConversionOutcome::Skipped(SkipReason::SourceMissing));
        };

        let request = RenderRequest {
            source: source.clone(),
            format: Some(format.as_str().to_owned()),
            options: target.options.clone(),
        };
        let outcome = self.render(&request)?;

        if let ConversionOutcome::Success { path, .. } = &outcome {
            let key = if target.candidates.contains_key(WILDCARD) {
                WILDCARD
            } else {
                to
            };
            target.candidates.insert(key.to_owned(), path.clone());
            target.uri.clone_from(path);
            assets.register(path, &source);
        }
        Ok(outcome)
    }
}
