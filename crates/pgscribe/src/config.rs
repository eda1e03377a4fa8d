//! Configuration file handling.
//!
//! Looks for `.config/pgscribe.styx` in the current directory or any parent directory.

pub use pgscribe_config::*;

use std::path::{Path, PathBuf};

/// Load configuration from `.config/pgscribe.styx`, searching up the directory tree.
pub fn load() -> Result<(Config, PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let config = parse(&content)?;
    tracing::debug!(path = %config_path.display(), "loaded configuration");

    Ok((config, config_path))
}

/// Load configuration if a file exists, falling back to defaults when none is found.
pub fn load_or_default(start: &Path) -> Result<Config, ConfigError> {
    match load_from(start) {
        Ok((config, _)) => Ok(config),
        Err(ConfigError::NotFound) => Ok(Config::default()),
        Err(e) => Err(e),
    }
}

/// Parse configuration from Styx source.
pub fn parse(content: &str) -> Result<Config, ConfigError> {
    facet_styx::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Find `.config/pgscribe.styx` by searching up the directory tree.
fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".config/pgscribe.styx");
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No `.config/pgscribe.styx` found in any parent directory
    NotFound,
    /// I/O error reading the file
    Io(String),
    /// Parse error in the Styx file
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound => {
                write!(
                    f,
                    "No .config/pgscribe.styx found in current directory or any parent"
                )
            }
            ConfigError::Io(e) => write!(f, "Failed to read .config/pgscribe.styx: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse .config/pgscribe.styx: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        // The filesystem root never carries a pgscribe config.
        let config = load_or_default(Path::new("/")).unwrap();
        assert_eq!(config.migrations().schema(), DEFAULT_TRACKING_SCHEMA);
    }

    #[test]
    fn parse_error_is_reported() {
        let err = parse("migrations {schema").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Failed to parse"));
    }
}
