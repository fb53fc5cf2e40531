//! `${VAR}` expansion in the configured converter path.

use std::env::{self, VarError};

use crate::ConfigError;

/// Config field whose value is expanded.
pub(crate) const BINARY_PATH_FIELD: &str = "umlet.binary_path";

/// Expand `${VAR}` and `${VAR:-default}` in a converter path.
///
/// An unset variable without a default is an error. Values without `${`
/// are returned as is, so a bare `$` in a path is never touched.
pub(crate) fn expand_binary_path(value: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| env::var(name).map(Some))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| {
            let message = match e.cause {
                VarError::NotPresent => format!("${{{}}} not set", e.var_name),
                VarError::NotUnicode(_) => format!("${{{}}} is not valid UTF-8", e.var_name),
            };
            ConfigError::EnvVar {
                field: BINARY_PATH_FIELD.to_owned(),
                message,
            }
        })
}
