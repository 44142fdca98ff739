//! Capabilities a database backend must offer to be bootstrapped.

use async_trait::async_trait;
use serde::Serialize;

use crate::schema::{DatabaseName, IndexSpec};

/// Error type returned by backends; the bootstrapper classifies it by step.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of an idempotent create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ensured {
    Created,
    AlreadyPresent,
}

/// Opens database handles. One connector serves one bootstrap run.
#[async_trait]
pub trait Connector: Send + Sync {
    type Database: DatabaseHandle;

    /// Human-readable description of where the connector points, safe to log.
    fn target(&self) -> String;

    /// Obtain a handle to `name`, verifying the backend is reachable.
    /// Engines that create databases on first write must not create it here.
    async fn select_database(&self, name: &DatabaseName) -> Result<Self::Database, BoxError>;
}

/// Schema operations on a single database.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Create `collection` unless it exists. "Already exists" is not an error.
    async fn ensure_collection(&self, collection: &str) -> Result<Ensured, BoxError>;

    /// Create `index` on `collection` unless an identical one exists.
    /// An index that clashes by name or keys is an error.
    async fn ensure_index(&self, collection: &str, index: &IndexSpec)
        -> Result<Ensured, BoxError>;

    async fn collection_names(&self) -> Result<Vec<String>, BoxError>;

    /// Names of the indexes on `collection`; empty when the collection is absent.
    async fn index_names(&self, collection: &str) -> Result<Vec<String>, BoxError>;
}
