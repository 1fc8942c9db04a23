//! Error types for `stubchaos`
//!
//! Configuration and validation errors are raised before any call reaches
//! the admin API. Store errors carry the operation name and the mapping id
//! (when known) so log lines can be correlated with the remote server.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `stubchaos` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (missing target, unreadable config file)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Admin API error (transport failure, unexpected status)
    pub const STORE_ERROR: i32 = 4;

    /// Caller input rejected before any network call
    pub const VALIDATION_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `stubchaos` operations.
#[derive(Debug, Error)]
pub enum ChaosError {
    /// Configuration loading or resolution error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Caller input rejected before touching the store
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Admin API call failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Sequential creation stopped after a store failure.
    ///
    /// Mappings created before the failure are left on the server.
    #[error("creation aborted after {} mapping(s): {source}", .created.len())]
    PartialCreate {
        /// Ids of the mappings created before the failure
        created: Vec<String>,
        /// The failure that stopped the sequence
        #[source]
        source: StoreError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ChaosError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Validation(_) | Self::Json(_) => ExitCode::VALIDATION_ERROR,
            Self::Store(_) | Self::PartialCreate { .. } => ExitCode::STORE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and resolution errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be parsed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message from the parser
        message: String,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// The `wiremock` section is absent
    #[error("'{section}' section not found in configuration")]
    MissingSection {
        /// Name of the missing section
        section: String,
    },

    /// Neither host+port nor url was provided
    #[error("no mock server target configured (set host and port, or url)")]
    MissingTarget,

    /// Required field is missing from configuration
    #[error("missing required field '{field}' at {location}")]
    MissingRequired {
        /// Name of the missing field
        field: String,
        /// Location in the configuration (e.g., "defaults")
        location: String,
    },

    /// Environment variable referenced in the config file is not set
    #[error("environment variable '{var}' not set (referenced in {path})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Config file that referenced it
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Malformed caller input, detected before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Status code is not an integer in 100..=599
    #[error("invalid status code '{0}': expected an integer between 100 and 599")]
    InvalidStatus(String),

    /// Fault name outside the supported set
    #[error("unknown fault '{value}'{}", .suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownFault {
        /// The rejected value
        value: String,
        /// Closest supported fault name, if any is near
        suggestion: Option<String>,
    },

    /// A required attribute is missing from a caller-supplied document
    #[error("attribute '{field}' not found in {what}")]
    MissingField {
        /// Name of the missing attribute
        field: &'static str,
        /// The document that should have carried it
        what: &'static str,
    },

    /// An attribute has the wrong type or range
    #[error("attribute '{field}' of {what} is invalid: {reason}")]
    InvalidField {
        /// Name of the offending attribute
        field: &'static str,
        /// The document that carried it
        what: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Input was expected to be a JSON object
    #[error("{what} has to be a JSON object")]
    NotADocument {
        /// Which input was rejected
        what: &'static str,
    },
}

// ============================================================================
// Store Errors
// ============================================================================

/// Failures talking to the mock server's admin API.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection-level failure
    #[error("[{operation}] transport error: {message}")]
    Transport {
        /// Logical store operation
        operation: &'static str,
        /// Underlying error text
        message: String,
    },

    /// The per-call timeout elapsed
    #[error("[{operation}] timed out")]
    Timeout {
        /// Logical store operation
        operation: &'static str,
    },

    /// The server answered with an unexpected status
    #[error("[{operation}] unexpected status {status}{}: {body}", .id.as_ref().map(|i| format!(" for mapping {i}")).unwrap_or_default())]
    Status {
        /// Logical store operation
        operation: &'static str,
        /// Target mapping id, when the call addressed one
        id: Option<String>,
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// The response body could not be decoded
    #[error("[{operation}] invalid response body: {message}")]
    Decode {
        /// Logical store operation
        operation: &'static str,
        /// Decoder message
        message: String,
    },

    /// A created mapping came back without an id
    #[error("[{operation}] response carries no mapping id")]
    MissingId {
        /// Logical store operation
        operation: &'static str,
    },

    /// An update echoed a different id than the one addressed
    #[error("[update] mapping id changed: expected {expected}, got {actual}")]
    IdMismatch {
        /// The id the update addressed
        expected: String,
        /// The id found in the response
        actual: String,
    },

    /// A mapping id that cannot address a single mapping
    #[error("[{operation}] invalid mapping id '{id}'")]
    InvalidId {
        /// Logical store operation
        operation: &'static str,
        /// The rejected id
        id: String,
    },
}

impl StoreError {
    /// Logical operation that failed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Transport { operation, .. }
            | Self::Timeout { operation }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. }
            | Self::MissingId { operation }
            | Self::InvalidId { operation, .. } => operation,
            Self::IdMismatch { .. } => "update",
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `stubchaos` operations.
pub type Result<T> = std::result::Result<T, ChaosError>;

// ============================================================================
// Tests
// ============================================================================
