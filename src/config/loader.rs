//! Configuration file loading.
//!
//! Pipeline:
//! 1. Read the file (UTF-8, optional BOM)
//! 2. Environment variable expansion on the raw text
//! 3. YAML parsing (JSON files parse as YAML too)

use std::path::Path;

use crate::config::schema::ChaosConfig;
use crate::error::ConfigError;

/// Loads a configuration file.
///
/// # Errors
///
/// Returns `ConfigError::MissingFile` if the file cannot be read,
/// `ConfigError::EnvVarNotSet` for an unset `${VAR}` without default, and
/// `ConfigError::ParseError` if the content is not a valid configuration.
pub fn load(path: &Path) -> Result<ChaosConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
        path: path.to_path_buf(),
    })?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let expanded = expand_env(raw, path)?;

    let mut config: ChaosConfig = if expanded.trim().is_empty() {
        ChaosConfig::default()
    } else {
        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };
    config.source = Some(path.to_path_buf());

    tracing::debug!(config = %path.display(), "configuration loaded");
    Ok(config)
}

/// Expands environment variables in raw config text.
///
/// Supports:
/// - `${VAR}` - value of `VAR`, error if unset
/// - `${VAR:-default}` - `default` if unset
/// - `$$` - literal `$`
fn expand_env(raw: &str, path: &Path) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next();
                let spec: String = chars.by_ref().take_while(|&c| c != '}').collect();
                let (name, default) = match spec.split_once(":-") {
                    Some((name, default)) => (name, Some(default)),
                    None => (spec.as_str(), None),
                };
                match (std::env::var(name), default) {
                    (Ok(value), _) => result.push_str(&value),
                    (Err(_), Some(default)) => result.push_str(default),
                    (Err(_), None) => {
                        return Err(ConfigError::EnvVarNotSet {
                            var: name.to_string(),
                            path: path.to_path_buf(),
                        });
                    }
                }
            }
            _ => result.push(c),
        }
    }

    Ok(result)
}
