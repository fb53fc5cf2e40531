//! Export formats and consumer capabilities.
//!
//! [`ExportFormat`] lists what `UMLet` can export; [`Consumer`] describes which
//! image MIME types a builder embeds directly. [`validate`] checks a requested
//! format against both.

use std::fmt;

use crate::error::ConvertError;

/// Image formats `UMLet` can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Jpg,
    Svg,
    Pdf,
}

impl ExportFormat {
    /// All formats, in the order they are offered to users.
    pub const ALL: [Self; 4] = [Self::Png, Self::Jpg, Self::Svg, Self::Pdf];

    /// Parse a format name (`png`, `jpg`, `svg`, `pdf`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "svg" => Some(Self::Svg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Format name, also used as the converter's `-format` value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type of the exported image.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
        }
    }

    /// Inverse of [`mime_type`](Self::mime_type).
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.mime_type() == mime)
    }

    /// File extension (without dot) of the exported image.
    #[must_use]
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    /// Format of an existing image file, by extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpeg" => Some(Self::Jpg),
            other => Self::parse(other),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable list of valid format names: `"png", "jpg", "svg", or "pdf"`.
pub(crate) fn format_choices() -> String {
    let quoted: Vec<String> = ExportFormat::ALL
        .iter()
        .map(|f| format!("\"{f}\""))
        .collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, or {last}", rest.join(", ")),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

/// A builder that embeds images into its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    name: String,
    supported_mime_types: Vec<String>,
}

impl Consumer {
    /// Create a consumer accepting `supported_mime_types`, in preference order.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, supported_mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            supported_mime_types: supported_mime_types.into_iter().map(Into::into).collect(),
        }
    }

    /// HTML builder.
    #[must_use]
    pub fn html() -> Self {
        Self::new(
            "html",
            ["image/svg+xml", "image/png", "image/gif", "image/jpeg"],
        )
    }

    /// LaTeX/PDF builder.
    #[must_use]
    pub fn latex() -> Self {
        Self::new("latex", ["application/pdf", "image/png", "image/jpeg"])
    }

    /// Well-known consumer for a builder name.
    #[must_use]
    pub fn for_builder(name: &str) -> Option<Self> {
        match name {
            "html" | "dirhtml" | "singlehtml" => Some(Self {
                name: name.to_owned(),
                ..Self::html()
            }),
            "latex" => Some(Self::latex()),
            _ => None,
        }
    }

    /// Builder name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME types embedded directly, in preference order.
    #[must_use]
    pub fn supported_mime_types(&self) -> &[String] {
        &self.supported_mime_types
    }

    /// Whether `mime` can be embedded without conversion.
    #[must_use]
    pub fn supports(&self, mime: &str) -> bool {
        self.supported_mime_types.iter().any(|m| m == mime)
    }

    /// First supported MIME type that `UMLet` can export.
    #[must_use]
    pub fn preferred_format(&self) -> Option<ExportFormat> {
        self.supported_mime_types
            .iter()
            .find_map(|m| ExportFormat::from_mime_type(m))
    }
}

/// Validate a requested format name against the consumer.
///
/// Returns `Ok(None)` when no format was requested.
///
/// # Errors
///
/// - [`ConvertError::UnsupportedFormat`] if the name is not a known format
/// - [`ConvertError::IncompatibleWithConsumer`] if the consumer cannot embed it
pub fn validate(
    requested: Option<&str>,
    consumer: &Consumer,
) -> Result<Option<ExportFormat>, ConvertError> {
    let Some(name) = requested else {
        return Ok(None);
    };
    let format = ExportFormat::parse(name).ok_or_else(|| ConvertError::UnsupportedFormat {
        format: name.to_owned(),
        choices: format_choices(),
    })?;
    if !consumer.supports(format.mime_type()) {
        return Err(ConvertError::IncompatibleWithConsumer {
            format,
            consumer: consumer.name().to_owned(),
        });
    }
    Ok(Some(format))
}
