//! Conversion error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::format::ExportFormat;

/// Semantic category of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConvertErrorKind {
    /// Requested format is not one `UMLet` can export.
    UnsupportedFormat,
    /// Format is valid but the builder cannot embed it.
    IncompatibleWithConsumer,
    /// Source path is not inside the documentation root.
    SourceOutsideRoot,
    /// No converter executable configured or found on `PATH`.
    ConverterNotFound,
    /// Converter process could not be started.
    Spawn,
    /// Converter exited with a non-zero status.
    Converter,
    /// Converter succeeded but wrote no output file.
    NoOutputProduced,
    /// Cache directory or file operation failed.
    Io,
}

/// Exit status of a converter run, printed like a process return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnCode(pub Option<i32>);

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "{code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Error raised while converting a diagram.
///
/// Every variant is fatal for the request that raised it and for nothing
/// else. Process failures carry the command line and captured output so the
/// conversion can be reproduced by hand.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("export format \"{format}\" is unsupported by UMLet; choose from {choices}")]
    UnsupportedFormat { format: String, choices: String },

    #[error("invalid export format '{format}' specified for builder '{consumer}'")]
    IncompatibleWithConsumer {
        format: ExportFormat,
        consumer: String,
    },

    #[error(
        "diagram {} is outside the documentation root {}",
        path.display(),
        root.display()
    )]
    SourceOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("No UMLet executable found (looked for {binary} on PATH)")]
    ConverterNotFound { binary: String },

    #[error("umlet ({command}) exited with error:\n{error}")]
    Spawn {
        command: String,
        #[source]
        error: io::Error,
    },

    #[error(
        "umlet ({command}) exited with error:\n[stderr]\n{stderr}\n[stdout]\n{stdout}\n[returncode]\n{code}"
    )]
    Converter {
        command: String,
        code: ReturnCode,
        stdout: String,
        stderr: String,
    },

    #[error(
        "umlet ({command}) did not produce an output file:\n[stderr]\n{stderr}\n[stdout]\n{stdout}"
    )]
    NoOutputProduced {
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("I/O error at {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
}

impl ConvertError {
    /// Semantic category of this error.
    #[must_use]
    pub fn kind(&self) -> ConvertErrorKind {
        match self {
            Self::UnsupportedFormat { .. } => ConvertErrorKind::UnsupportedFormat,
            Self::IncompatibleWithConsumer { .. } => ConvertErrorKind::IncompatibleWithConsumer,
            Self::SourceOutsideRoot { .. } => ConvertErrorKind::SourceOutsideRoot,
            Self::ConverterNotFound { .. } => ConvertErrorKind::ConverterNotFound,
            Self::Spawn { .. } => ConvertErrorKind::Spawn,
            Self::Converter { .. } => ConvertErrorKind::Converter,
            Self::NoOutputProduced { .. } => ConvertErrorKind::NoOutputProduced,
            Self::Io { .. } => ConvertErrorKind::Io,
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_converter_error_message_layout() {
        let err = ConvertError::Converter {
            command: "umlet.sh -action=convert".to_owned(),
            code: ReturnCode(Some(3)),
            stdout: "out".to_owned(),
            stderr: "bad diagram".to_owned(),
        };

        assert_eq!(
            err.to_string(),
            "umlet (umlet.sh -action=convert) exited with error:\n\
             [stderr]\nbad diagram\n[stdout]\nout\n[returncode]\n3"
        );
        assert_eq!(err.kind(), ConvertErrorKind::Converter);
    }

    #[test]
    fn test_no_output_message_layout() {
        let err = ConvertError::NoOutputProduced {
            command: "umlet.sh".to_owned(),
            stdout: String::new(),
            stderr: "warning".to_owned(),
        };

        assert_eq!(
            err.to_string(),
            "umlet (umlet.sh) did not produce an output file:\n[stderr]\nwarning\n[stdout]\n"
        );
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        let err = ConvertError::Spawn {
            command: "/missing/umlet.sh".to_owned(),
            error: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };

        assert!(err.to_string().contains("/missing/umlet.sh"));
        assert!(err.to_string().contains("No such file or directory"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_return_code_display() {
        assert_eq!(ReturnCode(Some(1)).to_string(), "1");
        assert_eq!(ReturnCode(None).to_string(), "terminated by signal");
    }
}
