//! Access to the mock server's stub mapping store.
//!
//! [`MappingStore`] is the seam between the orchestration logic and the
//! admin API. [`HttpStore`] talks to a live server; [`MemoryStore`] keeps
//! mappings in process with the same observable behavior.

pub mod http;
pub mod memory;
pub mod reachability;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::mapping::{Document, Mapping};

pub use http::HttpStore;
pub use memory::MemoryStore;

/// Logical operations consumed from the remote store.
///
/// Every call is a single round-trip. No retries happen at this layer.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// All mappings, in the order the store returns them.
    async fn list(&self) -> Result<Vec<Mapping>, StoreError>;

    /// A single mapping by id.
    async fn get(&self, id: &str) -> Result<Mapping, StoreError>;

    /// Creates a mapping and returns the stored document (with id).
    async fn create(&self, mapping: &Mapping) -> Result<Mapping, StoreError>;

    /// Replaces the mapping stored under `id`.
    async fn update(&self, id: &str, mapping: &Mapping) -> Result<Mapping, StoreError>;

    /// Deletes the mapping stored under `id`.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Writes store-wide settings.
    async fn settings(&self, settings: &Document) -> Result<(), StoreError>;

    /// Resets the whole server.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Reloads mappings from the server's backing files.
    async fn reset_mappings(&self) -> Result<(), StoreError>;
}
