//! In-process converter for testing.
//!
//! Provides [`MockConverter`] so conversion flows can be tested without a
//! `UMLet` installation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::converter::Converter;
use crate::error::{ConvertError, ReturnCode};
use crate::format::ExportFormat;

/// Converter that writes `<{format}/>` to the output path, or fails with a
/// fixed exit code. Every call is recorded.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use ux_render::{Consumer, ConversionOrchestrator, MockConverter};
///
/// let converter = Arc::new(MockConverter::new());
/// let orchestrator =
///     ConversionOrchestrator::with_converter(&config, Consumer::html(), Box::new(Arc::clone(&converter)))?;
/// orchestrator.render(&request)?;
/// assert_eq!(converter.call_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockConverter {
    exit_code: Option<i32>,
    calls: Mutex<Vec<(PathBuf, ExportFormat)>>,
}

impl MockConverter {
    /// Converter that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter that always fails as if the process exited with `code`.
    #[must_use]
    pub fn failing(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// Recorded `(source, format)` pairs, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<(PathBuf, ExportFormat)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of conversions attempted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Converter for MockConverter {
    fn convert(
        &self,
        source: &Path,
        format: ExportFormat,
        output: &Path,
    ) -> Result<PathBuf, ConvertError> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_path_buf(), format));

        if let Some(code) = self.exit_code {
            return Err(ConvertError::Converter {
                command: format!("mock -format={format} -filename={}", source.display()),
                code: ReturnCode(Some(code)),
                stdout: String::new(),
                stderr: "mock conversion failure".to_owned(),
            });
        }

        fs::write(output, format!("<{format}/>")).map_err(|e| ConvertError::io(output, e))?;
        Ok(output.to_path_buf())
    }
}
