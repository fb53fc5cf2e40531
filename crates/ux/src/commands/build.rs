//! `ux build` command implementation.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use clap::Args;
use ux_config::{CliSettings, Config};
use ux_render::{
    ConversionOrchestrator, ConversionOutcome, ConvertError, DIAGRAM_EXTENSION, ImageCollector,
    RecordedAssets, RenderTarget, SkipReason,
};

use super::{consumer, describe, display_path, render_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Builder the images are produced for.
    #[arg(short, long, default_value = "html")]
    builder: String,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Build output root (overrides config). Images go to `<output>/<builder>/_images/`.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// `UMLet` executable (overrides config).
    #[arg(long, env = "UX_UMLET_BINARY")]
    binary_path: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover ux.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the source tree cannot
    /// be scanned, or any diagram failed to convert or copy.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            binary_path: self.binary_path,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let render_config = render_config(&config)?;
        let orchestrator = ConversionOrchestrator::new(&render_config, consumer(&self.builder)?)?;
        let output_dir = std::path::absolute(config.docs_resolved.output_dir.join(&self.builder))?;

        output.info(&format!("Source: {}", render_config.source_dir.display()));
        output.info(&format!("Output: {}", output_dir.display()));

        let report = build_all(&orchestrator, &render_config.source_dir, &output_dir)?;

        for (image, diagram) in &report.sources {
            tracing::info!("{} <- {}", image.display(), diagram.display());
        }

        for (path, reason) in &report.skipped {
            output.warning(&format!(
                "WARNING: {}: {}",
                display_path(path, &render_config.source_dir).display(),
                describe(*reason)
            ));
        }
        for (path, err) in &report.failed {
            output.warning(&format!(
                "WARNING: {}: {err}",
                display_path(path, &render_config.source_dir).display()
            ));
        }

        if !report.failed.is_empty() {
            return Err(CliError::Validation(format!(
                "{} of {} diagrams failed to convert",
                report.failed.len(),
                report.total()
            )));
        }
        output.success(&format!(
            "{} diagrams ({} converted, {} up to date) in {}",
            report.images.len(),
            report.converted,
            report.cached,
            output_dir.display()
        ));
        Ok(())
    }
}

/// Result of converting a source tree.
#[derive(Debug, Default)]
pub(crate) struct BuildReport {
    /// Conversions that ran.
    pub converted: usize,
    /// Images served from the cache.
    pub cached: usize,
    /// Images placed in the output tree.
    pub images: Vec<PathBuf>,
    /// Diagrams that were not converted.
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Diagrams whose conversion failed.
    pub failed: Vec<(PathBuf, ConvertError)>,
    /// Cached image -> diagram it was generated from (relative to the source root).
    pub sources: BTreeMap<PathBuf, PathBuf>,
}

impl BuildReport {
    /// Number of diagrams seen.
    pub(crate) fn total(&self) -> usize {
        self.images.len() + self.skipped.len() + self.failed.len()
    }
}

/// Convert every diagram under `source_dir` and collect the images into
/// `output_dir`.
///
/// A failing diagram is recorded and does not stop the others.
pub(crate) fn build_all(
    orchestrator: &ConversionOrchestrator,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<BuildReport, CliError> {
    let mut report = BuildReport::default();
    let mut assets = RecordedAssets::default();
    let mut collector = ImageCollector::new(output_dir);

    for source in find_diagrams(source_dir)? {
        let relative = display_path(&source, source_dir).to_path_buf();
        let mut target = RenderTarget::diagram(&relative);
        match orchestrator.apply(&mut target, &mut assets) {
            Ok(ConversionOutcome::Success { path, cached }) => {
                if cached {
                    report.cached += 1;
                } else {
                    report.converted += 1;
                }
                match collector.collect(&path) {
                    Ok(image) => report.images.push(image),
                    Err(error) => {
                        tracing::warn!("failed to copy {}: {error}", path.display());
                        report.failed.push((source, ConvertError::Io { path, error }));
                    }
                }
            }
            Ok(ConversionOutcome::Skipped(reason)) => report.skipped.push((source, reason)),
            Err(err) => {
                tracing::warn!("{}: {err}", relative.display());
                report.failed.push((source, err));
            }
        }
    }
    report.sources = assets.original_uri;
    Ok(report)
}

/// All diagram files below `source_dir`, sorted.
fn find_diagrams(source_dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let root = source_dir.to_str().ok_or_else(|| {
        CliError::Validation(format!(
            "source directory is not valid UTF-8: {}",
            source_dir.display()
        ))
    })?;
    let pattern = format!("{}/**/*.{DIAGRAM_EXTENSION}", glob::Pattern::escape(root));
    let entries = glob::glob(&pattern).map_err(|e| CliError::Validation(e.to_string()))?;

    let mut diagrams = entries
        .collect::<Result<Vec<_>, _>>()
        .map_err(io::Error::from)?;
    diagrams.retain(|path| path.is_file());
    diagrams.sort();
    Ok(diagrams)
}
