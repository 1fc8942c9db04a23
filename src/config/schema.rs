//! Configuration schema and target resolution.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Root configuration document.
///
/// ```yaml
/// wiremock:
///   host: localhost
///   port: 8080
///   contextPath: /mock
///   timeout: 1
///   defaults:
///     down:
///       numberOfChunks: 10
///       totalDuration: 10000
/// ```
///
/// A top-level `defaults` section is read when `wiremock.defaults` has no
/// entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Mock server connection settings.
    #[serde(default)]
    pub wiremock: Option<ServerSection>,

    /// Default payloads for shorthand actions, outside `wiremock`.
    #[serde(default)]
    pub defaults: Defaults,

    /// File this configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// The `wiremock` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSection {
    /// Server host; used together with `port`.
    pub host: Option<String>,
    /// Server port; used together with `host`.
    pub port: Option<u16>,
    /// Path prefix appended after `host:port`.
    pub context_path: Option<String>,
    /// Full base url, used when host or port is missing.
    pub url: Option<String>,
    /// Per-call timeout in seconds.
    pub timeout: Option<f64>,
    /// Default payloads for shorthand actions.
    #[serde(default)]
    pub defaults: Defaults,
}

/// The `defaults` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Chunked dribble delay applied by `down`.
    pub down: Option<Value>,
}

/// Command-line or environment values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOverrides {
    /// Base url.
    pub url: Option<String>,
    /// Host.
    pub host: Option<String>,
    /// Port.
    pub port: Option<u16>,
    /// Context path.
    pub context_path: Option<String>,
    /// Per-call timeout.
    pub timeout: Option<Duration>,
}

/// A resolved mock server endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Base url, without the admin prefix.
    pub url: String,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl Target {
    /// Host and port of the target url, when they can be read from it.
    #[must_use]
    pub fn host_port(&self) -> Option<(String, u16)> {
        let rest = self
            .url
            .strip_prefix("http://")
            .map(|r| (r, 80))
            .or_else(|| self.url.strip_prefix("https://").map(|r| (r, 443)));
        let (rest, default_port) = rest?;
        let authority = rest.split('/').next()?;
        match authority.rsplit_once(':') {
            Some((host, port)) => Some((host.to_string(), port.parse().ok()?)),
            None if !authority.is_empty() => Some((authority.to_string(), default_port)),
            None => None,
        }
    }
}

impl ChaosConfig {
    /// Resolves the mock server endpoint.
    ///
    /// `http://{host}:{port}{contextPath}` wins when both host and port are
    /// known; otherwise `url` is used. Overrides replace file values field by
    /// field.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSection` when a loaded file has no
    /// `wiremock` section and nothing was overridden,
    /// `ConfigError::MissingTarget` when no endpoint can be built, and
    /// `ConfigError::InvalidValue` for a negative or non-finite timeout.
    pub fn target(&self, overrides: &TargetOverrides) -> Result<Target, ConfigError> {
        let section = self.wiremock.clone().unwrap_or_default();

        let host = overrides.host.clone().or(section.host);
        let port = overrides.port.or(section.port);
        let context_path = overrides
            .context_path
            .clone()
            .or(section.context_path)
            .unwrap_or_default();

        let url = match (host, port) {
            (Some(host), Some(port)) => Some(format!("http://{host}:{port}{context_path}")),
            _ => overrides.url.clone().or(section.url),
        };

        let Some(url) = url.filter(|u| !u.is_empty()) else {
            if self.wiremock.is_none() && self.source.is_some() {
                return Err(ConfigError::MissingSection {
                    section: "wiremock".to_string(),
                });
            }
            return Err(ConfigError::MissingTarget);
        };

        let timeout = match (overrides.timeout, section.timeout) {
            (Some(timeout), _) => timeout,
            (None, Some(secs)) => {
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidValue {
                    field: "wiremock.timeout".to_string(),
                    value: secs.to_string(),
                    expected: "a non-negative number of seconds".to_string(),
                })?
            }
            (None, None) => DEFAULT_TIMEOUT,
        };

        Ok(Target { url, timeout })
    }

    /// The chunked dribble delay used by `down`.
    ///
    /// `wiremock.defaults.down` wins over a top-level `defaults.down`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` when neither is set.
    pub fn down_defaults(&self) -> Result<&Value, ConfigError> {
        self.wiremock
            .as_ref()
            .and_then(|section| section.defaults.down.as_ref())
            .or(self.defaults.down.as_ref())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "down".to_string(),
                location: "wiremock.defaults".to_string(),
            })
    }
}
