//! In-process backend with document-database semantics, for tests and dry runs.
//!
//! Databases come into existence on the first write, collections are created
//! implicitly by an index create, and an index that clashes by name or keys
//! with an existing one is rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use feedbase_kernel::{BoxError, Connector, DatabaseHandle, DatabaseName, Ensured, IndexSpec};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("connection refused by {0}")]
    Refused(String),

    #[error("index '{existing}' on '{collection}' already covers the same keys as '{requested}'")]
    KeysConflict {
        collection: String,
        existing: String,
        requested: String,
    },

    #[error("index '{index}' on '{collection}' exists with different keys")]
    NameConflict { collection: String, index: String },

    #[error("not authorized to modify '{0}'")]
    Unauthorized(String),
}

type Collections = BTreeMap<String, Vec<IndexSpec>>;

#[derive(Debug, Default)]
struct ServerState {
    databases: BTreeMap<String, Collections>,
    refuse_connections: bool,
    read_only_collections: BTreeSet<String>,
    writes: usize,
}

/// Shared state of a fake server. Clones observe the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent `select_database` fail.
    pub fn refuse_connections(&self) {
        self.lock().refuse_connections = true;
    }

    /// Make creates against `collection` fail in every database.
    pub fn deny_writes_to(&self, collection: impl Into<String>) {
        self.lock().read_only_collections.insert(collection.into());
    }

    pub fn database_names(&self) -> Vec<String> {
        self.lock().databases.keys().cloned().collect()
    }

    pub fn collection_names(&self, database: &str) -> Vec<String> {
        self.lock()
            .databases
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn indexes(&self, database: &str, collection: &str) -> Vec<IndexSpec> {
        self.lock()
            .databases
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of creates that changed state.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }
}

#[async_trait]
impl Connector for MemoryServer {
    type Database = MemoryDatabase;

    fn target(&self) -> String {
        "memory".to_string()
    }

    async fn select_database(&self, name: &DatabaseName) -> Result<MemoryDatabase, BoxError> {
        if self.lock().refuse_connections {
            return Err(MemoryError::Refused(self.target()).into());
        }
        Ok(MemoryDatabase {
            server: self.clone(),
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    server: MemoryServer,
    name: String,
}

impl MemoryDatabase {
    fn guard_writes(state: &ServerState, collection: &str) -> Result<(), MemoryError> {
        if state.read_only_collections.contains(collection) {
            Err(MemoryError::Unauthorized(collection.to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DatabaseHandle for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure_collection(&self, collection: &str) -> Result<Ensured, BoxError> {
        let mut state = self.server.lock();
        Self::guard_writes(&state, collection)?;

        let collections = state.databases.entry(self.name.clone()).or_default();
        if collections.contains_key(collection) {
            return Ok(Ensured::AlreadyPresent);
        }
        collections.insert(collection.to_string(), Vec::new());
        state.writes += 1;
        Ok(Ensured::Created)
    }

    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> Result<Ensured, BoxError> {
        let mut state = self.server.lock();
        Self::guard_writes(&state, collection)?;

        let indexes = state
            .databases
            .entry(self.name.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        if let Some(existing) = indexes.iter().find(|i| i.name() == index.name()) {
            if existing.keys() == index.keys() {
                return Ok(Ensured::AlreadyPresent);
            }
            return Err(MemoryError::NameConflict {
                collection: collection.to_string(),
                index: index.name().to_string(),
            }
            .into());
        }
        if let Some(existing) = indexes.iter().find(|i| i.keys() == index.keys()) {
            return Err(MemoryError::KeysConflict {
                collection: collection.to_string(),
                existing: existing.name().to_string(),
                requested: index.name().to_string(),
            }
            .into());
        }

        indexes.push(index.clone());
        state.writes += 1;
        Ok(Ensured::Created)
    }

    async fn collection_names(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.server.collection_names(&self.name))
    }

    async fn index_names(&self, collection: &str) -> Result<Vec<String>, BoxError> {
        Ok(self
            .server
            .indexes(&self.name, collection)
            .iter()
            .map(|index| index.name().to_string())
            .collect())
    }
}
