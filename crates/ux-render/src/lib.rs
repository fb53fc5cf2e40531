//! `UMLet` diagram conversion with a persistent image cache.
//!
//! Diagrams (`.uxf`) referenced by documents are exported to an image
//! format the current builder can embed. Exported images are cached under
//! a directory keyed by the diagram's path relative to the documentation
//! root, and regenerated only when the diagram is newer than its image.
//!
//! # Example
//!
//! ```ignore
//! use ux_render::{Consumer, ConversionOrchestrator, RenderConfig, RenderRequest};
//!
//! let config = RenderConfig {
//!     source_dir: "docs".into(),
//!     cache_dir: "_build/doctrees/umlet".into(),
//!     ..RenderConfig::default()
//! };
//! let orchestrator = ConversionOrchestrator::new(&config, Consumer::html())?;
//! let outcome = orchestrator.render(&RenderRequest::new("SimpleClass.uxf").format("svg"))?;
//! ```
//!
//! # Features
//!
//! - `mock`: Enables [`MockConverter`] for testing without `UMLet` installed

mod collect;
mod consts;
mod converter;
mod error;
mod format;
mod locate;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod orchestrator;
mod target;

pub use collect::{IMAGES_DIRNAME, ImageCollector};
pub use consts::{
    CONVERTER_BINARY, DIAGRAM_CLASS, DIAGRAM_EXTENSION, DIAGRAM_MIME_TYPE, WILDCARD,
};
pub use converter::{Converter, ProcessConverter};
pub use error::{ConvertError, ConvertErrorKind, ReturnCode};
pub use format::{Consumer, ExportFormat, validate};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockConverter;
pub use orchestrator::{
    ConversionOrchestrator, ConversionOutcome, RenderConfig, RenderRequest, SkipReason,
    output_filename,
};
pub use target::{
    AssetRegistry, CONVERSION_RULES, RecordedAssets, RenderTarget, conversion_rule,
    diagram_mime_type,
};
