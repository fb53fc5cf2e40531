//! Converter capability and the `UMLet` process implementation.
//!
//! The orchestrator only sees the [`Converter`] trait, so tests substitute
//! an in-process fake and never spawn anything.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ConvertError, ReturnCode};
use crate::format::ExportFormat;
use crate::locate::resolve_converter;

/// Something that turns a diagram file into an image file.
pub trait Converter: Send + Sync {
    /// Convert `source` to `format`, writing the image to `output`.
    ///
    /// Returns `output` on success; the orchestrator only commits the file
    /// at `output` and rejects any other reported path. Implementations make
    /// a single attempt and never retry.
    fn convert(
        &self,
        source: &Path,
        format: ExportFormat,
        output: &Path,
    ) -> Result<PathBuf, ConvertError>;
}

impl<C: Converter + ?Sized> Converter for Arc<C> {
    fn convert(
        &self,
        source: &Path,
        format: ExportFormat,
        output: &Path,
    ) -> Result<PathBuf, ConvertError> {
        (**self).convert(source, format, output)
    }
}

/// Runs the `UMLet` command-line converter.
///
/// The executable is resolved on every call, so a build that only hits the
/// cache never needs `UMLet` installed. There is no timeout: a hanging
/// converter blocks the calling request.
#[derive(Debug, Clone, Default)]
pub struct ProcessConverter {
    binary_path: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl ProcessConverter {
    /// Create a converter using `binary_path`, or `PATH` lookup when `None`.
    #[must_use]
    pub fn new(binary_path: Option<PathBuf>) -> Self {
        Self {
            binary_path,
            search_path: None,
        }
    }

    /// Search these directories (a `PATH`-style list) instead of `PATH`.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }
}

impl Converter for ProcessConverter {
    fn convert(
        &self,
        source: &Path,
        format: ExportFormat,
        output: &Path,
    ) -> Result<PathBuf, ConvertError> {
        let path_var = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));
        let binary = resolve_converter(self.binary_path.as_deref(), path_var.as_deref())?;
        let args = converter_args(source, format, output);
        let command = command_line(&binary, &args);

        let started_at = Instant::now();
        let result = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|error| ConvertError::Spawn {
                command: command.clone(),
                error,
            })?;

        let stdout = String::from_utf8_lossy(&result.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        tracing::debug!(
            elapsed_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            status = %result.status,
            "umlet finished: {command}"
        );

        if !result.status.success() {
            return Err(ConvertError::Converter {
                command,
                code: ReturnCode(result.status.code()),
                stdout,
                stderr,
            });
        }
        if !output.is_file() {
            return Err(ConvertError::NoOutputProduced {
                command,
                stdout,
                stderr,
            });
        }
        Ok(output.to_path_buf())
    }
}

/// Arguments for `umlet -action=convert`.
fn converter_args(source: &Path, format: ExportFormat, output: &Path) -> Vec<OsString> {
    let mut filename = OsString::from("-filename=");
    filename.push(source);
    let mut out = OsString::from("-output=");
    out.push(output);
    vec![
        OsString::from("-action=convert"),
        OsString::from(format!("-format={format}")),
        filename,
        out,
    ]
}

/// Space-joined command line for diagnostics.
fn command_line(binary: &Path, args: &[OsString]) -> String {
    std::iter::once(binary.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
