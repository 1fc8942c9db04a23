//! Stub mapping documents and the response fields `stubchaos` rewrites.
//!
//! A mapping is kept as an opaque JSON object. Only the handful of
//! `response` keys touched by mutations are given names and types here;
//! everything else round-trips untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A JSON object: the shape of mappings, filters and settings payloads.
pub type Document = Map<String, Value>;

/// Key holding the store-assigned identifier.
pub const ID_KEY: &str = "id";
/// Request-matching section.
pub const REQUEST_KEY: &str = "request";
/// Response-definition section.
pub const RESPONSE_KEY: &str = "response";

/// `response.fixedDelayMilliseconds`
pub const FIXED_DELAY_KEY: &str = "fixedDelayMilliseconds";
/// `response.delayDistribution`
pub const DELAY_DISTRIBUTION_KEY: &str = "delayDistribution";
/// `response.chunkedDribbleDelay`
pub const CHUNKED_DRIBBLE_DELAY_KEY: &str = "chunkedDribbleDelay";
/// `response.fault`
pub const FAULT_KEY: &str = "fault";
/// `response.status`
pub const STATUS_KEY: &str = "status";
/// `response.body`
pub const BODY_KEY: &str = "body";
/// `response.bodyFileName`
pub const BODY_FILE_KEY: &str = "bodyFileName";

/// Every delay-bearing key a response may carry.
pub const DELAY_KEYS: [&str; 3] = [
    FIXED_DELAY_KEY,
    DELAY_DISTRIBUTION_KEY,
    CHUNKED_DRIBBLE_DELAY_KEY,
];

/// Parses a caller-supplied JSON value as a [`Document`].
///
/// # Errors
///
/// Returns [`ValidationError::NotADocument`] when `value` is not an object.
pub fn into_document(value: Value, what: &'static str) -> Result<Document, ValidationError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::NotADocument { what }),
    }
}

// ============================================================================
// Mapping
// ============================================================================

/// A stub mapping as stored by the mock server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping(Document);

impl Mapping {
    /// Wraps an existing JSON object.
    #[must_use]
    pub const fn new(document: Document) -> Self {
        Self(document)
    }

    /// Store-assigned id; `None` before creation.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_KEY).and_then(Value::as_str)
    }

    /// The `request` section, if present and an object.
    #[must_use]
    pub fn request(&self) -> Option<&Document> {
        self.0.get(REQUEST_KEY).and_then(Value::as_object)
    }

    /// The `response` section, if present and an object.
    #[must_use]
    pub fn response(&self) -> Option<&Document> {
        self.0.get(RESPONSE_KEY).and_then(Value::as_object)
    }

    /// Runs `edit` on the `response` section, creating it empty when missing.
    ///
    /// A non-object `response` is replaced by an empty object.
    pub fn edit_response(&mut self, edit: impl FnOnce(&mut Document)) {
        let mut response = match self.0.remove(RESPONSE_KEY) {
            Some(Value::Object(map)) => map,
            _ => Document::new(),
        };
        edit(&mut response);
        self.0
            .insert(RESPONSE_KEY.to_string(), Value::Object(response));
    }

    /// The whole document.
    #[must_use]
    pub const fn as_document(&self) -> &Document {
        &self.0
    }

    /// Consumes the mapping, returning the whole document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.0
    }
}

impl From<Document> for Mapping {
    fn from(document: Document) -> Self {
        Self(document)
    }
}

impl TryFrom<Value> for Mapping {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        into_document(value, "mapping").map(Self)
    }
}

// ============================================================================
// Faults
// ============================================================================

/// Protocol-level faults the mock server can inject instead of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Fault {
    /// Close the connection without sending anything.
    EmptyResponse,
    /// Send an OK status header, then garbage, then close.
    MalformedResponseChunk,
    /// Send garbage, then close.
    RandomDataThenClose,
    /// Close the connection with a TCP reset.
    ConnectionResetByPeer,
}

impl Fault {
    /// All supported faults.
    pub const ALL: [Self; 4] = [
        Self::EmptyResponse,
        Self::MalformedResponseChunk,
        Self::RandomDataThenClose,
        Self::ConnectionResetByPeer,
    ];

    /// Wire name of the fault.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::MalformedResponseChunk => "MALFORMED_RESPONSE_CHUNK",
            Self::RandomDataThenClose => "RANDOM_DATA_THEN_CLOSE",
            Self::ConnectionResetByPeer => "CONNECTION_RESET_BY_PEER",
        }
    }

    /// Closest supported fault name, when within a small edit distance.
    #[must_use]
    pub fn suggest(input: &str) -> Option<&'static str> {
        let upper = input.to_ascii_uppercase();
        Self::ALL
            .iter()
            .map(|f| (f.as_str(), strsim::damerau_levenshtein(&upper, f.as_str())))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(name, _)| name)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fault {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownFault {
                value: s.to_string(),
                suggestion: Self::suggest(s).map(str::to_string),
            })
    }
}

// ============================================================================
// Delays
// ============================================================================

/// A random delay distribution, passed through to the server as-is.
///
/// Only `lognormal` (`median`, `sigma`) is known by name; other shapes are
/// accepted unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelayDistribution(Document);

impl DelayDistribution {
    /// A lognormal distribution.
    #[must_use]
    pub fn lognormal(median: u64, sigma: f64) -> Self {
        let mut doc = Document::new();
        doc.insert("type".into(), Value::from("lognormal"));
        doc.insert("median".into(), Value::from(median));
        doc.insert("sigma".into(), Value::from(sigma));
        Self(doc)
    }

    /// Distribution name (`type`), if set.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// JSON form written into a response or settings payload.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl TryFrom<Value> for DelayDistribution {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        into_document(value, DELAY_DISTRIBUTION_KEY).map(Self)
    }
}

/// Body delivered in a fixed number of chunks over a total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkedDribbleDelay {
    /// Number of chunks the body is split into.
    pub number_of_chunks: u64,
    /// Total delivery time in milliseconds.
    pub total_duration: u64,
}

impl ChunkedDribbleDelay {
    /// Validates a caller-supplied specification.
    ///
    /// Both `numberOfChunks` and `totalDuration` are mandatory and must be
    /// non-negative integers.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed attribute.
    pub fn from_spec(spec: &Value) -> Result<Self, ValidationError> {
        const WHAT: &str = CHUNKED_DRIBBLE_DELAY_KEY;
        let doc = spec
            .as_object()
            .ok_or(ValidationError::NotADocument { what: WHAT })?;

        let field = |name: &'static str| -> Result<u64, ValidationError> {
            let value = doc.get(name).ok_or(ValidationError::MissingField {
                field: name,
                what: WHAT,
            })?;
            value.as_u64().ok_or_else(|| ValidationError::InvalidField {
                field: name,
                what: WHAT,
                reason: format!("expected a non-negative integer, got {value}"),
            })
        };

        Ok(Self {
            number_of_chunks: field("numberOfChunks")?,
            total_duration: field("totalDuration")?,
        })
    }

    /// JSON form written into a response.
    #[must_use]
    pub fn to_value(self) -> Value {
        serde_json::json!({
            "numberOfChunks": self.number_of_chunks,
            "totalDuration": self.total_duration,
        })
    }
}

// ============================================================================
// Status / body overrides
// ============================================================================

/// Replacement body for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Inline body text (`response.body`).
    Inline(String),
    /// Reference to a file under the server's `__files` (`response.bodyFileName`).
    File(String),
}

/// Parses an HTTP status code given as text.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidStatus`] unless the text is an integer
/// in `100..=599`.
pub fn parse_status(input: &str) -> Result<u16, ValidationError> {
    input
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|code| (100..=599).contains(code))
        .ok_or_else(|| ValidationError::InvalidStatus(input.to_string()))
}
