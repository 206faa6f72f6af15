//! Model store: resolves search hits back to fully loaded domain objects

pub mod fixtures;
pub mod memory;

pub use fixtures::Fixtures;
pub use memory::InMemoryStore;

use crate::error::Result;
use crate::models::{Credential, Model, ModelKind};
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for domain object storage operations
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Save (insert or replace) a model
    async fn save(&self, model: Model) -> Result<()>;

    /// Get a model by kind and ID
    async fn get(&self, kind: ModelKind, id: &str) -> Result<Option<Model>>;

    /// Batch load models of one kind, keyed by ID. Unknown IDs are absent from the map.
    async fn load_many(&self, kind: ModelKind, ids: &[String]) -> Result<HashMap<String, Model>>;

    /// All credentials owned by a topic
    async fn credentials_for_topic(&self, topic_id: &str) -> Result<Vec<Credential>>;

    /// Delete a model, returning it if it existed
    async fn delete(&self, kind: ModelKind, id: &str) -> Result<Option<Model>>;

    /// Number of stored models of one kind
    async fn count(&self, kind: ModelKind) -> Result<usize>;
}
