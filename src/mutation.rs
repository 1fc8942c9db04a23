//! Fault-injection mutations over selected mappings.
//!
//! The [`Orchestrator`] resolves filters through the selection service,
//! rewrites each mapping's `response` section and pushes the full document
//! back with an update. Per-mapping updates are independent: a failed update
//! is logged and left out of the result while the loop moves on. Creation is
//! the exception and stops at the first failure.
//!
//! Input validation always happens before the first store call.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{ChaosError, Result, StoreError};
use crate::mapping::{
    BODY_FILE_KEY, BODY_KEY, CHUNKED_DRIBBLE_DELAY_KEY, ChunkedDribbleDelay, DELAY_DISTRIBUTION_KEY,
    DELAY_KEYS, DelayDistribution, Document, FAULT_KEY, FIXED_DELAY_KEY, Fault, Mapping,
    ResponseBody, STATUS_KEY, into_document, parse_status,
};
use crate::selection::{SelectOptions, select_all};
use crate::store::MappingStore;

/// Applies mutations to the mappings of a [`MappingStore`].
#[derive(Debug)]
pub struct Orchestrator<S> {
    store: S,
    options: SelectOptions,
}

impl<S: MappingStore> Orchestrator<S> {
    /// Orchestrator with default selection options (strict, unbounded).
    pub fn new(store: S) -> Self {
        Self {
            store,
            options: SelectOptions::default(),
        }
    }

    /// Replaces the selection options used by filter-driven operations.
    #[must_use]
    pub const fn with_options(mut self, options: SelectOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Every stored mapping.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn mappings(&self) -> Result<Vec<Mapping>> {
        Ok(self.store.list().await?)
    }

    /// One mapping by id.
    ///
    /// # Errors
    ///
    /// Returns the store error if the mapping cannot be fetched.
    pub async fn mapping(&self, id: &str) -> Result<Mapping> {
        Ok(self.store.get(id).await?)
    }

    /// Mappings matched by `filters` under the configured options.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn select(&self, filters: &[Document]) -> Result<Vec<Mapping>> {
        Ok(select_all(&self.store, filters, self.options).await?)
    }

    // ------------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------------

    /// Creates every mapping in order and returns their ids.
    ///
    /// All documents are validated first. The first store failure stops the
    /// sequence; mappings already created stay on the server and are listed
    /// in the error.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotADocument` if any item is not a JSON
    /// object, or `ChaosError::PartialCreate` on a store failure.
    pub async fn populate(&self, mappings: Vec<Value>) -> Result<Vec<String>> {
        let mappings = mappings
            .into_iter()
            .map(Mapping::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.create_all("populate", mappings).await
    }

    /// Creates a mapping from every `*.json` file in `dir` (non-recursive).
    ///
    /// Files are processed in file-name order. Files that cannot be read or
    /// do not hold a JSON object are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ChaosError::Io` if the directory cannot be read, or
    /// `ChaosError::PartialCreate` on a store failure.
    pub async fn import_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .inspect_err(|e| error!(dir = %dir.display(), error = %e, "cannot read directory"))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut mappings = Vec::with_capacity(paths.len());
        for path in &paths {
            match read_mapping(path) {
                Ok(mapping) => {
                    info!(file = %path.display(), "importing mapping");
                    mappings.push(mapping);
                }
                Err(e) => warn!(file = %path.display(), error = %e, "skipping file"),
            }
        }

        self.create_all("import_dir", mappings).await
    }

    async fn create_all(&self, operation: &'static str, mappings: Vec<Mapping>) -> Result<Vec<String>> {
        let mut created = Vec::with_capacity(mappings.len());
        for mapping in &mappings {
            match self.store.create(mapping).await {
                Ok(stored) => {
                    let id = stored
                        .id()
                        .ok_or(StoreError::MissingId { operation: "create" });
                    match id {
                        Ok(id) => created.push(id.to_string()),
                        Err(source) => return Err(abort_create(operation, created, source)),
                    }
                }
                Err(source) => return Err(abort_create(operation, created, source)),
            }
        }
        debug!(operation, count = created.len(), "mappings created");
        Ok(created)
    }

    // ------------------------------------------------------------------------
    // Deletion / reset
    // ------------------------------------------------------------------------

    /// Deletes every mapping matched by `filters` and returns their ids.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails. Individual delete
    /// failures are logged and omitted.
    pub async fn delete_selected(&self, filters: &[Document]) -> Result<Vec<String>> {
        let selected = self.select(filters).await?;
        let mut deleted = Vec::with_capacity(selected.len());
        for mapping in &selected {
            let Some(id) = mapping.id() else {
                warn!(operation = "delete", "selected mapping has no id");
                continue;
            };
            match self.store.delete(id).await {
                Ok(()) => deleted.push(id.to_string()),
                Err(e) => error!(operation = "delete", id, error = %e, "cannot delete mapping"),
            }
        }
        Ok(deleted)
    }

    /// Deletes every stored mapping and returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn delete_all(&self) -> Result<usize> {
        let mappings = self.store.list().await?;
        let mut count = 0;
        for id in mappings.iter().filter_map(Mapping::id) {
            match self.store.delete(id).await {
                Ok(()) => count += 1,
                Err(e) => error!(operation = "delete_all", id, error = %e, "cannot delete mapping"),
            }
        }
        info!(deleted = count, total = mappings.len(), "deleted all mappings");
        Ok(count)
    }

    /// Resets the whole server (mappings, settings, request journal).
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn reset(&self) -> Result<()> {
        self.store
            .reset()
            .await
            .inspect_err(|e| error!(operation = "reset", error = %e, "cannot reset server"))?;
        Ok(())
    }

    /// Reloads mappings from the server's backing files.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn reset_mappings(&self) -> Result<()> {
        self.store
            .reset_mappings()
            .await
            .inspect_err(|e| error!(operation = "reset_mappings", error = %e, "cannot reset mappings"))?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Per-mapping mutations
    // ------------------------------------------------------------------------

    /// Sets `fixedDelayMilliseconds` and clears `delayDistribution`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn fixed_delay(&self, filters: &[Document], millis: u64) -> Result<Vec<Mapping>> {
        self.apply("fixed_delay", filters, |response| {
            response.insert(FIXED_DELAY_KEY.to_string(), Value::from(millis));
            response.remove(DELAY_DISTRIBUTION_KEY);
        })
        .await
    }

    /// Sets `delayDistribution`. A fixed delay, if any, is left in place.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn random_delay(
        &self,
        filters: &[Document],
        distribution: &DelayDistribution,
    ) -> Result<Vec<Mapping>> {
        let value = distribution.to_value();
        self.apply("random_delay", filters, |response| {
            response.insert(DELAY_DISTRIBUTION_KEY.to_string(), value.clone());
        })
        .await
    }

    /// Sets `chunkedDribbleDelay` from a caller-supplied specification.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the missing attribute before any
    /// store call, or the store error if the listing fails.
    pub async fn chunked_dribble_delay(
        &self,
        filters: &[Document],
        spec: &Value,
    ) -> Result<Vec<Mapping>> {
        let delay = ChunkedDribbleDelay::from_spec(spec).inspect_err(|e| {
            error!(operation = "chunked_dribble_delay", error = %e, "invalid delay specification");
        })?;
        let value = delay.to_value();
        self.apply("chunked_dribble_delay", filters, |response| {
            response.insert(CHUNKED_DRIBBLE_DELAY_KEY.to_string(), value.clone());
        })
        .await
    }

    /// Removes every delay from the selected mappings and returns their ids.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn up(&self, filters: &[Document]) -> Result<Vec<String>> {
        let updated = self
            .apply("up", filters, |response| {
                for key in DELAY_KEYS {
                    response.remove(key);
                }
            })
            .await?;
        Ok(updated
            .iter()
            .filter_map(Mapping::id)
            .map(str::to_string)
            .collect())
    }

    /// Sets `response.fault`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownFault` before any store call, or the
    /// store error if the listing fails.
    pub async fn set_fault(&self, filters: &[Document], fault: &str) -> Result<Vec<Mapping>> {
        let fault = fault.parse::<Fault>().inspect_err(|e| {
            error!(operation = "set_fault", error = %e, "invalid fault");
        })?;
        self.apply("set_fault", filters, |response| {
            response.insert(FAULT_KEY.to_string(), Value::from(fault.as_str()));
        })
        .await
    }

    /// Sets `response.status` and, when given, exactly one of `body` or
    /// `bodyFileName`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidStatus` before any store call, or the
    /// store error if the listing fails.
    pub async fn set_status(
        &self,
        filters: &[Document],
        status: &str,
        body: Option<ResponseBody>,
    ) -> Result<Vec<Mapping>> {
        let status = parse_status(status).inspect_err(|e| {
            error!(operation = "set_status", error = %e, "invalid status");
        })?;
        self.apply("set_status", filters, |response| {
            response.insert(STATUS_KEY.to_string(), Value::from(status));
            match &body {
                Some(ResponseBody::Inline(text)) => {
                    response.insert(BODY_KEY.to_string(), Value::from(text.as_str()));
                    response.remove(BODY_FILE_KEY);
                }
                Some(ResponseBody::File(name)) => {
                    response.insert(BODY_FILE_KEY.to_string(), Value::from(name.as_str()));
                    response.remove(BODY_KEY);
                }
                None => {}
            }
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Global settings
    // ------------------------------------------------------------------------

    /// Sets a store-wide fixed delay.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn global_fixed_delay(&self, millis: u64) -> Result<()> {
        let mut settings = Document::new();
        settings.insert("fixedDelay".to_string(), Value::from(millis));
        self.write_settings("global_fixed_delay", &settings).await
    }

    /// Sets a store-wide random delay.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotADocument` if `distribution` is not an
    /// object, or the store error.
    pub async fn global_random_delay(&self, distribution: &Value) -> Result<()> {
        let distribution = DelayDistribution::try_from(distribution.clone())?;
        let mut settings = Document::new();
        settings.insert(DELAY_DISTRIBUTION_KEY.to_string(), distribution.to_value());
        self.write_settings("global_random_delay", &settings).await
    }

    /// Posts an arbitrary settings document.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotADocument` if `settings` is not an
    /// object, or the store error.
    pub async fn global_settings(&self, settings: &Value) -> Result<()> {
        let settings = into_document(settings.clone(), "settings")?;
        self.write_settings("global_settings", &settings).await
    }

    async fn write_settings(&self, operation: &'static str, settings: &Document) -> Result<()> {
        self.store
            .settings(settings)
            .await
            .inspect_err(|e| error!(operation, error = %e, "cannot write settings"))?;
        debug!(operation, "settings written");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Selects mappings, edits each `response` with `edit`, and pushes the
    /// result. Returns the documents the store accepted.
    async fn apply<F>(&self, operation: &'static str, filters: &[Document], edit: F) -> Result<Vec<Mapping>>
    where
        F: Fn(&mut Document) + Send + Sync,
    {
        let selected = self.select(filters).await?;
        if selected.is_empty() {
            info!(operation, "no mapping selected");
        }

        let mut updated = Vec::with_capacity(selected.len());
        for mut mapping in selected {
            let Some(id) = mapping.id().map(str::to_string) else {
                warn!(operation, "selected mapping has no id");
                continue;
            };
            mapping.edit_response(&edit);
            match self.push_update(&id, &mapping).await {
                Ok(stored) => {
                    debug!(operation, id = %id, "mapping updated");
                    updated.push(stored);
                }
                Err(e) => error!(operation, id = %id, error = %e, "cannot update mapping"),
            }
        }
        Ok(updated)
    }

    /// Updates `id`, requiring the store to echo the same id back.
    async fn push_update(&self, id: &str, mapping: &Mapping) -> std::result::Result<Mapping, StoreError> {
        let stored = self.store.update(id, mapping).await?;
        match stored.id() {
            Some(actual) if actual == id => Ok(stored),
            Some(actual) => Err(StoreError::IdMismatch {
                expected: id.to_string(),
                actual: actual.to_string(),
            }),
            None => Err(StoreError::MissingId { operation: "update" }),
        }
    }
}

fn abort_create(operation: &'static str, created: Vec<String>, source: StoreError) -> ChaosError {
    error!(
        operation,
        created = created.len(),
        error = %source,
        "cannot create mapping, aborting"
    );
    ChaosError::PartialCreate { created, source }
}

fn read_mapping(path: &Path) -> Result<Mapping> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    Ok(Mapping::try_from(value)?)
}
