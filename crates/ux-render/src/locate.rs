//! Converter executable resolution.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::consts::CONVERTER_BINARY;
use crate::error::ConvertError;

/// Resolve the converter executable.
///
/// An explicit path always wins, even if it does not exist: a broken
/// override then surfaces as a spawn error naming that path. Otherwise
/// [`CONVERTER_BINARY`] is searched in `path_var`, a `PATH`-style list.
pub(crate) fn resolve_converter(
    explicit: Option<&Path>,
    path_var: Option<&OsStr>,
) -> Result<PathBuf, ConvertError> {
    if let Some(path) = explicit {
        tracing::debug!("using configured umlet executable: {}", path.display());
        return Ok(path.to_path_buf());
    }
    let found = find_on_path(CONVERTER_BINARY, path_var).ok_or_else(|| {
        ConvertError::ConverterNotFound {
            binary: CONVERTER_BINARY.to_owned(),
        }
    })?;
    tracing::debug!("found umlet executable on PATH: {}", found.display());
    Ok(found)
}

/// Find `name` in the directories of a `PATH`-style list.
fn find_on_path(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    std::env::split_paths(path_var?)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
