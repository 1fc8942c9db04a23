//! Resolves filters to concrete mappings.
//!
//! All filtering is client-side: the full listing is fetched once per call
//! and every filter is evaluated against that snapshot.

use tracing::{debug, info};

use crate::error::StoreError;
use crate::mapping::{Document, Mapping};
use crate::matcher::{MatchMode, matches};
use crate::store::MappingStore;

/// How filters are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectOptions {
    /// Matching semantics. Defaults to [`MatchMode::Strict`].
    pub mode: MatchMode,
    /// Maximum matches per filter; `0` means unbounded.
    pub limit: usize,
}

impl SelectOptions {
    /// Options with the given mode and no limit.
    #[must_use]
    pub const fn with_mode(mode: MatchMode) -> Self {
        Self { mode, limit: 0 }
    }
}

/// Mappings in `listing` satisfying `filter`, in listing order.
///
/// Stops after `options.limit` matches when the limit is non-zero.
#[must_use]
pub fn filter_listing(listing: &[Mapping], filter: &Document, options: SelectOptions) -> Vec<Mapping> {
    let matched = listing
        .iter()
        .filter(|m| matches(m, filter, options.mode))
        .cloned();
    if options.limit == 0 {
        matched.collect()
    } else {
        matched.take(options.limit).collect()
    }
}

/// Mappings satisfying `filter`.
///
/// # Errors
///
/// Returns the store error if the listing cannot be fetched.
pub async fn select(
    store: &dyn MappingStore,
    filter: &Document,
    options: SelectOptions,
) -> Result<Vec<Mapping>, StoreError> {
    select_all(store, std::slice::from_ref(filter), options).await
}

/// Union of the matches of every filter.
///
/// Results are ordered by filter, then by listing order. A mapping matched
/// by several filters appears once per filter.
///
/// # Errors
///
/// Returns the store error if the listing cannot be fetched.
pub async fn select_all(
    store: &dyn MappingStore,
    filters: &[Document],
    options: SelectOptions,
) -> Result<Vec<Mapping>, StoreError> {
    let listing = store.list().await?;
    debug!(
        mappings = listing.len(),
        filters = filters.len(),
        mode = ?options.mode,
        "selecting mappings"
    );

    let mut selected = Vec::new();
    for filter in filters {
        let found = filter_listing(&listing, filter, options);
        if found.is_empty() {
            info!(filter = %serde_json::Value::Object(filter.clone()), "no mapping matches filter");
        }
        selected.extend(found);
    }
    Ok(selected)
}
