//! Configuration management for UX.
//!
//! Parses `ux.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `umlet.binary_path`
//!
//! ## Example
//!
//! ```toml
//! [docs]
//! source_dir = "docs"
//! output_dir = "_build"
//!
//! [umlet]
//! binary_path = "${UMLET_HOME}/umlet.sh"
//!
//! [umlet.builder_export_format]
//! html = "svg"
//! latex = "pdf"
//! ```

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs source directory.
    pub source_dir: Option<PathBuf>,
    /// Override build output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the `UMLet` executable.
    pub binary_path: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ux.toml";

/// Project data directory name, created next to the config file.
const PROJECT_DIRNAME: &str = ".ux";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Diagram conversion configuration.
    umlet: UmletConfigRaw,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Resolved diagram conversion configuration (set after loading).
    #[serde(skip)]
    pub umlet_resolved: UmletConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved documentation configuration with absolute paths.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Documentation source root. Cache keys are derived relative to it.
    pub source_dir: PathBuf,
    /// Build output root.
    pub output_dir: PathBuf,
    /// Project directory for ux data (.ux/).
    pub project_dir: PathBuf,
}

impl DocsConfig {
    /// Rendered diagram cache root (.ux/cache/umlet/).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache").join("umlet")
    }
}

/// Raw `[umlet]` section as parsed from TOML.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct UmletConfigRaw {
    binary_path: Option<String>,
    builder_export_format: BTreeMap<String, String>,
}

impl Default for UmletConfigRaw {
    fn default() -> Self {
        Self {
            binary_path: None,
            builder_export_format: default_export_formats(),
        }
    }
}

/// Builder defaults used when `[umlet.builder_export_format]` is absent.
fn default_export_formats() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("html".to_owned(), "svg".to_owned()),
        ("latex".to_owned(), "pdf".to_owned()),
    ])
}

/// Resolved diagram conversion configuration.
#[derive(Debug)]
pub struct UmletConfig {
    /// Explicit `UMLet` executable. When unset the executable is looked up
    /// on `PATH`.
    pub binary_path: Option<PathBuf>,
    /// Default export format per builder name (e.g. `html = "svg"`).
    ///
    /// Format names are checked against the builder's capabilities when a
    /// converter is set up for that builder.
    pub builder_export_format: BTreeMap<String, String>,
}

impl Default for UmletConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            builder_export_format: default_export_formats(),
        }
    }
}

impl UmletConfig {
    /// Default export format configured for `builder`, if any.
    #[must_use]
    pub fn export_format_for(&self, builder: &str) -> Option<&str> {
        self.builder_export_format.get(builder).map(String::as_str)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`umlet.binary_path`").
        field: String,
        /// Error message (e.g., "${`UMLET_HOME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ux.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.docs_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(binary_path) = &settings.binary_path {
            self.umlet_resolved.binary_path = Some(binary_path.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            umlet: UmletConfigRaw::default(),
            docs_resolved: DocsConfig {
                source_dir: base.join("docs"),
                output_dir: base.join("_build"),
                project_dir: base.join(PROJECT_DIRNAME),
            },
            umlet_resolved: UmletConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;
        config.validate()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref binary_path) = self.umlet.binary_path {
            require_non_empty(binary_path, "umlet.binary_path")?;
        }
        for (builder, format) in &self.umlet.builder_export_format {
            require_non_empty(builder, "umlet.builder_export_format key")?;
            require_non_empty(format, &format!("umlet.builder_export_format.{builder}"))?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.umlet.binary_path {
            self.umlet.binary_path = Some(expand::expand_binary_path(path)?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.docs_resolved = DocsConfig {
            source_dir: resolve(self.docs.source_dir.as_deref(), "docs"),
            output_dir: resolve(self.docs.output_dir.as_deref(), "_build"),
            project_dir: config_dir.join(PROJECT_DIRNAME),
        };

        self.umlet_resolved = UmletConfig {
            binary_path: self.umlet.binary_path.as_deref().map(|p| config_dir.join(p)),
            builder_export_format: self.umlet.builder_export_format.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.docs_resolved.source_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.docs_resolved.output_dir, PathBuf::from("/test/_build"));
        assert_eq!(config.docs_resolved.project_dir, PathBuf::from("/test/.ux"));
        assert_eq!(
            config.docs_resolved.cache_dir(),
            PathBuf::from("/test/.ux/cache/umlet")
        );
        assert!(config.umlet_resolved.binary_path.is_none());
        assert_eq!(config.umlet_resolved.export_format_for("html"), Some("svg"));
        assert_eq!(config.umlet_resolved.export_format_for("latex"), Some("pdf"));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.umlet.binary_path.is_none());
        assert_eq!(config.umlet.builder_export_format, default_export_formats());
    }

    #[test]
    fn test_export_format_table_replaces_defaults() {
        let toml = r#"
[umlet.builder_export_format]
html = "png"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.umlet_resolved.export_format_for("html"), Some("png"));
        assert_eq!(config.umlet_resolved.export_format_for("latex"), None);
    }

    #[test]
    fn test_parse_umlet_config() {
        let toml = r#"
[umlet]
binary_path = "/opt/umlet/umlet.sh"

[umlet.builder_export_format]
html = "svg"
latex = "pdf"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.umlet_resolved.binary_path,
            Some(PathBuf::from("/opt/umlet/umlet.sh"))
        );
        assert_eq!(config.umlet_resolved.export_format_for("html"), Some("svg"));
        assert_eq!(config.umlet_resolved.export_format_for("latex"), Some("pdf"));
        assert_eq!(config.umlet_resolved.export_format_for("epub"), None);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[docs]
source_dir = "documentation"
output_dir = "build/site"

[umlet]
binary_path = "tools/umlet.sh"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.docs_resolved.source_dir,
            PathBuf::from("/project/documentation")
        );
        assert_eq!(
            config.docs_resolved.output_dir,
            PathBuf::from("/project/build/site")
        );
        assert_eq!(
            config.docs_resolved.project_dir,
            PathBuf::from("/project/.ux")
        );
        assert_eq!(
            config.umlet_resolved.binary_path,
            Some(PathBuf::from("/project/tools/umlet.sh"))
        );
    }

    #[test]
    fn test_validate_empty_binary_path() {
        let toml = r#"
[umlet]
binary_path = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("umlet.binary_path"));
    }

    #[test]
    fn test_validate_empty_export_format() {
        let toml = r#"
[umlet.builder_export_format]
html = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("umlet.builder_export_format.html"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[umlet.builder_export_format]
html = "svg"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path, Some(path.clone()));
        assert_eq!(config.docs_resolved.source_dir, tmp.path().join("docs"));
        assert_eq!(config.docs_resolved.cache_dir(), tmp.path().join(".ux/cache/umlet"));
        assert_eq!(config.umlet_resolved.export_format_for("html"), Some("svg"));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/ux.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[umlet\nbinary_path = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            source_dir: Some(PathBuf::from("/custom/docs")),
            binary_path: Some(PathBuf::from("/usr/bin/umlet.sh")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.docs_resolved.source_dir,
            PathBuf::from("/custom/docs")
        );
        assert_eq!(config.docs_resolved.output_dir, PathBuf::from("/test/_build")); // Unchanged
        assert_eq!(
            config.umlet_resolved.binary_path,
            Some(PathBuf::from("/usr/bin/umlet.sh"))
        );
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.docs_resolved.source_dir, PathBuf::from("/test/docs"));
        assert!(config.umlet_resolved.binary_path.is_none());
    }

    #[test]
    fn test_expand_env_vars_binary_path() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("UX_TEST_CONFIG_UMLET_HOME", "/opt/umlet");
        }

        let toml = r#"
[umlet]
binary_path = "${UX_TEST_CONFIG_UMLET_HOME}/umlet.sh"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.umlet_resolved.binary_path,
            Some(PathBuf::from("/opt/umlet/umlet.sh"))
        );

        unsafe {
            std::env::remove_var("UX_TEST_CONFIG_UMLET_HOME");
        }
    }
}
