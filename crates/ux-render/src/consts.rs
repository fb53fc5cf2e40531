//! Internal constants for diagram conversion.

/// Class marking an image reference as a `UMLet` diagram.
pub const DIAGRAM_CLASS: &str = "umlet";

/// MIME type of `UMLet` diagram sources.
pub const DIAGRAM_MIME_TYPE: &str = "application/x-umlet";

/// File extension of `UMLet` diagram sources.
pub const DIAGRAM_EXTENSION: &str = "uxf";

/// Candidate key matching any MIME type.
pub const WILDCARD: &str = "*";

/// Converter executable looked up on `PATH` when none is configured.
#[cfg(windows)]
pub const CONVERTER_BINARY: &str = "Umlet.exe";

/// Converter executable looked up on `PATH` when none is configured.
#[cfg(not(windows))]
pub const CONVERTER_BINARY: &str = "umlet.sh";
