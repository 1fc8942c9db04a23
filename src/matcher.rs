//! Filter evaluation against stored mappings.
//!
//! Two semantics are supported:
//!
//! - [`MatchMode::Strict`] compares the filter one level deep against the
//!   mapping's `request` section using plain JSON equality per key.
//! - [`MatchMode::Recursive`] walks the whole mapping. Nested objects in the
//!   filter recurse, arrays list acceptable values, anything else must be
//!   equal.
//!
//! Matcher descriptors stored in mappings (`equalTo`, `matches`, ...) are
//! never interpreted, only compared as values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::mapping::{Document, Mapping};

/// How a filter is evaluated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Flat equality over `request`.
    #[default]
    Strict,
    /// Structural subset over the whole mapping.
    Recursive,
}

/// Tests whether `mapping` satisfies `filter` under `mode`.
#[must_use]
pub fn matches(mapping: &Mapping, filter: &Document, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Strict => mapping
            .request()
            .is_some_and(|request| matches_strict(request, filter)),
        MatchMode::Recursive => matches_recursive(mapping.as_document(), filter),
    }
}

/// One-level comparison: every filter key must exist and be equal.
#[must_use]
pub fn matches_strict(candidate: &Document, filter: &Document) -> bool {
    if !all_keys_present(candidate, filter) {
        return false;
    }
    filter.iter().all(|(key, expected)| {
        let equal = candidate.get(key) == Some(expected);
        if !equal {
            trace!(key = %key, "strict mismatch");
        }
        equal
    })
}

/// Recursive comparison with list membership.
#[must_use]
pub fn matches_recursive(candidate: &Document, filter: &Document) -> bool {
    if !all_keys_present(candidate, filter) {
        return false;
    }
    filter.iter().all(|(key, expected)| {
        // Presence was checked above.
        let Some(actual) = candidate.get(key) else {
            return false;
        };
        let ok = value_satisfies(actual, expected);
        if !ok {
            trace!(key = %key, "recursive mismatch");
        }
        ok
    })
}

fn value_satisfies(actual: &Value, expected: &Value) -> bool {
    match expected {
        Value::Object(nested) => actual
            .as_object()
            .is_some_and(|sub| matches_recursive(sub, nested)),
        Value::Array(accepted) => actual == expected || accepted.contains(actual),
        _ => actual == expected,
    }
}

/// Key-count pre-check: the number of filter keys found in the candidate
/// must equal the filter's key count.
fn all_keys_present(candidate: &Document, filter: &Document) -> bool {
    let common = filter.keys().filter(|k| candidate.contains_key(*k)).count();
    common == filter.len()
}
