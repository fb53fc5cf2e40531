//! `ux convert` command implementation.

use std::path::PathBuf;

use clap::Args;
use ux_config::{CliSettings, Config};
use ux_render::{ConversionOrchestrator, ConversionOutcome, RenderRequest};

use super::{absolute, consumer, describe, render_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Diagram file to convert.
    file: PathBuf,

    /// Builder the image is produced for.
    #[arg(short, long, default_value = "html")]
    builder: String,

    /// Export format (png, jpg, svg, pdf). Defaults to the builder's format.
    #[arg(short, long)]
    format: Option<String>,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// `UMLet` executable (overrides config).
    #[arg(long, env = "UX_UMLET_BINARY")]
    binary_path: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover ux.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the conversion fails,
    /// or the diagram was skipped.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            binary_path: self.binary_path,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let orchestrator =
            ConversionOrchestrator::new(&render_config(&config)?, consumer(&self.builder)?)?;

        let mut request = RenderRequest::new(absolute(&self.file)?);
        request.format = self.format;

        match orchestrator.render(&request)? {
            ConversionOutcome::Success { path, cached } => {
                if cached {
                    output.info("Up to date");
                }
                output.success(&path.display().to_string());
                Ok(())
            }
            ConversionOutcome::Skipped(reason) => Err(CliError::Validation(format!(
                "{}: {}",
                self.file.display(),
                describe(reason)
            ))),
        }
    }
}
