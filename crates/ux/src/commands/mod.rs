//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod convert;

pub(crate) use build::BuildArgs;
pub(crate) use convert::ConvertArgs;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ux_config::Config;
use ux_render::{Consumer, RenderConfig, SkipReason};

use crate::error::CliError;

/// Map loaded configuration onto the converter settings.
pub(crate) fn render_config(config: &Config) -> Result<RenderConfig, CliError> {
    Ok(RenderConfig {
        source_dir: std::path::absolute(&config.docs_resolved.source_dir)?,
        cache_dir: std::path::absolute(config.docs_resolved.cache_dir())?,
        binary_path: config.umlet_resolved.binary_path.clone(),
        export_formats: config
            .umlet_resolved
            .builder_export_format
            .iter()
            .map(|(builder, format)| (builder.clone(), format.clone()))
            .collect::<HashMap<_, _>>(),
    })
}

/// Known consumer for a builder name.
pub(crate) fn consumer(builder: &str) -> Result<Consumer, CliError> {
    Consumer::for_builder(builder).ok_or_else(|| {
        CliError::Validation(format!(
            "unknown builder '{builder}'; choose from html, dirhtml, singlehtml, latex"
        ))
    })
}

/// Human-readable skip reason.
pub(crate) fn describe(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::SourceMissing => "file not found",
        SkipReason::NotConvertible => "not a convertible diagram for this builder",
        SkipReason::AlreadySupported => "already embeddable without conversion",
    }
}

/// `path` relative to `root` for display, or unchanged.
pub(crate) fn display_path<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Resolve a user-supplied path against the current directory.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    Ok(std::path::absolute(path)?)
}
