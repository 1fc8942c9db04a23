//! In-process [`MappingStore`].
//!
//! Mirrors the admin API semantics closely enough for unit tests:
//! ids are assigned on create, listing preserves insertion order, unknown ids
//! answer with a 404 `StoreError::Status`. Failures can be injected per
//! operation to exercise abort and continue policies.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::mapping::{Document, ID_KEY, Mapping};

use super::MappingStore;

#[derive(Debug, Default)]
struct State {
    mappings: Vec<Mapping>,
    /// Mappings restored by `reset_mappings`.
    persisted: Vec<Mapping>,
    settings: Document,
    fail_updates: HashSet<String>,
    fail_deletes: HashSet<String>,
    creates_before_failure: Option<usize>,
}

/// Mapping store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `mappings`.
    ///
    /// Mappings without an id get one. The same set is what
    /// `reset_mappings` restores.
    #[must_use]
    pub fn with_mappings(mappings: impl IntoIterator<Item = Mapping>) -> Self {
        let mappings: Vec<Mapping> = mappings.into_iter().map(with_id).collect();
        Self {
            state: Mutex::new(State {
                persisted: mappings.clone(),
                mappings,
                ..State::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of store operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current mappings, in listing order.
    pub async fn snapshot(&self) -> Vec<Mapping> {
        self.state.lock().await.mappings.clone()
    }

    /// Last settings payload written.
    pub async fn current_settings(&self) -> Document {
        self.state.lock().await.settings.clone()
    }

    /// Makes every update of `id` fail with a 500.
    pub async fn fail_updates_for(&self, id: &str) {
        self.state.lock().await.fail_updates.insert(id.to_string());
    }

    /// Makes every delete of `id` fail with a 500.
    pub async fn fail_deletes_for(&self, id: &str) {
        self.state.lock().await.fail_deletes.insert(id.to_string());
    }

    /// Lets `count` creations succeed, then fails the rest with a 422.
    pub async fn fail_creates_after(&self, count: usize) {
        self.state.lock().await.creates_before_failure = Some(count);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn with_id(mut mapping: Mapping) -> Mapping {
    if mapping.id().is_none() {
        let mut doc = mapping.into_document();
        doc.insert(
            ID_KEY.to_string(),
            Value::from(uuid::Uuid::new_v4().to_string()),
        );
        mapping = Mapping::new(doc);
    }
    mapping
}

fn status(operation: &'static str, id: Option<&str>, code: u16, body: &str) -> StoreError {
    StoreError::Status {
        operation,
        id: id.map(str::to_string),
        status: code,
        body: body.to_string(),
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Mapping>, StoreError> {
        self.record_call();
        Ok(self.state.lock().await.mappings.clone())
    }

    async fn get(&self, id: &str) -> Result<Mapping, StoreError> {
        self.record_call();
        self.state
            .lock()
            .await
            .mappings
            .iter()
            .find(|m| m.id() == Some(id))
            .cloned()
            .ok_or_else(|| status("get", Some(id), 404, "No such mapping"))
    }

    async fn create(&self, mapping: &Mapping) -> Result<Mapping, StoreError> {
        self.record_call();
        let mut state = self.state.lock().await;
        if let Some(remaining) = state.creates_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(status("create", None, 422, "Invalid mapping"));
            }
            *remaining -= 1;
        }
        let created = with_id(mapping.clone());
        state.mappings.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, mapping: &Mapping) -> Result<Mapping, StoreError> {
        self.record_call();
        let mut state = self.state.lock().await;
        if state.fail_updates.contains(id) {
            return Err(status("update", Some(id), 500, "Injected failure"));
        }
        let slot = state
            .mappings
            .iter_mut()
            .find(|m| m.id() == Some(id))
            .ok_or_else(|| status("update", Some(id), 404, "No such mapping"))?;

        let mut doc = mapping.clone().into_document();
        doc.insert(ID_KEY.to_string(), Value::from(id));
        *slot = Mapping::new(doc);
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.lock().await;
        if state.fail_deletes.contains(id) {
            return Err(status("delete", Some(id), 500, "Injected failure"));
        }
        let before = state.mappings.len();
        state.mappings.retain(|m| m.id() != Some(id));
        if state.mappings.len() == before {
            return Err(status("delete", Some(id), 404, "No such mapping"));
        }
        Ok(())
    }

    async fn settings(&self, settings: &Document) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.lock().await;
        for (key, value) in settings {
            state.settings.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.mappings.clear();
        state.settings.clear();
        Ok(())
    }

    async fn reset_mappings(&self) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.mappings = state.persisted.clone();
        Ok(())
    }
}
