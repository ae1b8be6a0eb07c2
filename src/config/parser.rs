//! Configuration parser for loading and merging configuration.
//!
//! Precedence, lowest first: built-in defaults, `gemtool.yaml`, environment
//! variables, command-line flags (applied by the caller).

use crate::error::{ConfigError, GemtoolError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::ToolConfig;

/// Configuration parser for loading tool configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for locating `.env`.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for locating `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ToolConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(GemtoolError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            GemtoolError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ToolConfig> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(ToolConfig::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            GemtoolError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })
    }

    /// Loads configuration from an optional file, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// environment override is not a valid value.
    pub fn load_with_env(&self, path: Option<&Path>) -> Result<ToolConfig> {
        let mut config = match path {
            Some(p) => self.load_file(p)?,
            None => ToolConfig::default(),
        };

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `GEMTOOL_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean or numeric override cannot be parsed.
    pub fn apply_env_overrides(
        config: &mut ToolConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(program) = lookup("GEMTOOL_PROGRAM") {
            debug!("Overriding program from environment");
            config.program = program;
        }

        if let Some(source) = lookup("GEMTOOL_SOURCE") {
            debug!("Overriding source from environment");
            config.source = Some(source);
        }

        if let Some(doc) = lookup("GEMTOOL_DOC") {
            debug!("Overriding document from environment");
            config.document = parse_bool(&doc).ok_or_else(|| {
                ConfigError::validation(format!("GEMTOOL_DOC must be a boolean, got '{doc}'"), "document")
            })?;
        }

        if let Some(secs) = lookup("GEMTOOL_GRACE_PERIOD_SECS") {
            debug!("Overriding grace_period_secs from environment");
            config.grace_period_secs = secs.trim().parse().map_err(|_| {
                ConfigError::validation(
                    format!("GEMTOOL_GRACE_PERIOD_SECS must be a whole number, got '{secs}'"),
                    "grace_period_secs",
                )
            })?;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                GemtoolError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["gemtool.yaml", "gemtool.yml", ".gemtool.yaml"];

/// Finds the configuration file in the given directory or its parents, then
/// in the user configuration directory.
///
/// Returns `None` when no file exists, since a configuration file is optional.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("gemtool").join("config.yaml");
    if user_config.exists() {
        info!("Found configuration file: {}", user_config.display());
        return Some(user_config);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
program: /usr/local/bin/gem
document: true
source: https://gems.example.com
grace_period_secs: 5
";
        let config = ConfigParser::new().parse_yaml(yaml, None).unwrap();
        assert_eq!(config.program, "/usr/local/bin/gem");
        assert!(config.document);
        assert_eq!(config.source.as_deref(), Some("https://gems.example.com"));
        assert_eq!(config.grace_period_secs, 5);
    }

    #[test]
    fn test_parse_partial_and_empty_config() {
        let parser = ConfigParser::new();
        let config = parser.parse_yaml("document: true\n", None).unwrap();
        assert_eq!(config.program, "gem");
        assert!(config.document);

        assert_eq!(parser.parse_yaml("", None).unwrap(), ToolConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let result = ConfigParser::new().parse_yaml("sauce: https://typo.example.com\n", None);
        assert!(matches!(
            result,
            Err(GemtoolError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GEMTOOL_PROGRAM", "gem2"),
            ("GEMTOOL_SOURCE", "https://mirror.example.com"),
            ("GEMTOOL_DOC", "yes"),
            ("GEMTOOL_GRACE_PERIOD_SECS", "7"),
        ]);

        let mut config = ToolConfig::default();
        ConfigParser::apply_env_overrides(&mut config, |k| env.get(k).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.program, "gem2");
        assert_eq!(config.source.as_deref(), Some("https://mirror.example.com"));
        assert!(config.document);
        assert_eq!(config.grace_period_secs, 7);
    }

    #[test]
    fn test_env_override_invalid_bool() {
        let mut config = ToolConfig::default();
        let result = ConfigParser::apply_env_overrides(&mut config, |k| {
            (k == "GEMTOOL_DOC").then(|| String::from("maybe"))
        });
        assert!(matches!(
            result,
            Err(GemtoolError::Config(ConfigError::ValidationError { .. }))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigParser::new().load_file(dir.path().join("gemtool.yaml"));
        assert!(matches!(
            result,
            Err(GemtoolError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("gemtool.yaml"), "document: true\n").unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("gemtool.yaml"));
    }
}
