//! MongoDB backend.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error, ErrorKind};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

use feedbase_kernel::settings::DatabaseSettings;
use feedbase_kernel::{BoxError, Connector, DatabaseHandle, DatabaseName, Ensured, IndexSpec};

/// Server error code for "collection already exists".
const NAMESPACE_EXISTS: i32 = 48;
/// Server error code for "namespace does not exist".
const NAMESPACE_NOT_FOUND: i32 = 26;

const APP_NAME: &str = "feedbase";

fn command_code(err: &Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    }
}

/// Hide credentials in a connection string so it can be logged.
pub fn redact_uri(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
        None => uri.to_string(),
    }
}

/// Builds a MongoDB client from [`DatabaseSettings`] when a database is selected.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    uri: String,
    connect_timeout: Duration,
    server_selection_timeout: Duration,
}

impl MongoConnector {
    pub fn new(settings: &DatabaseSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            server_selection_timeout: Duration::from_millis(settings.server_selection_timeout_ms),
        }
    }

    async fn client(&self) -> Result<Client, Error> {
        let mut options = ClientOptions::parse(&self.uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.server_selection_timeout);
        Client::with_options(options)
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Database = MongoDatabase;

    fn target(&self) -> String {
        redact_uri(&self.uri)
    }

    async fn select_database(&self, name: &DatabaseName) -> Result<MongoDatabase, BoxError> {
        let client = self.client().await?;

        // The driver connects lazily; ping so that unreachable or
        // unauthenticated servers fail here rather than on the first create.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        tracing::debug!(target: "feedbase-db", database = %name, "mongodb ping ok");

        Ok(MongoDatabase {
            database: client.database(name.as_str()),
        })
    }
}

/// Handle to one MongoDB database. The database itself is created by the
/// server on the first collection create.
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    database: Database,
}

fn index_model(index: &IndexSpec) -> IndexModel {
    let mut keys = Document::new();
    for key in index.keys() {
        keys.insert(key.field.clone(), key.order.as_i32());
    }

    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(index.name().to_string())
                .build(),
        )
        .build()
}

#[async_trait]
impl DatabaseHandle for MongoDatabase {
    fn name(&self) -> &str {
        self.database.name()
    }

    async fn ensure_collection(&self, collection: &str) -> Result<Ensured, BoxError> {
        match self.database.create_collection(collection).await {
            Ok(()) => Ok(Ensured::Created),
            Err(err) if command_code(&err) == Some(NAMESPACE_EXISTS) => {
                Ok(Ensured::AlreadyPresent)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> Result<Ensured, BoxError> {
        let existing = self.index_names(collection).await?;

        // createIndexes is a no-op for an identical index and rejects one that
        // conflicts by name or keys, so it is always sent.
        let handle = self.database.collection::<Document>(collection);
        handle.create_index(index_model(index)).await?;

        if existing.iter().any(|name| name == index.name()) {
            Ok(Ensured::AlreadyPresent)
        } else {
            Ok(Ensured::Created)
        }
    }

    async fn collection_names(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.database.list_collection_names().await?)
    }

    async fn index_names(&self, collection: &str) -> Result<Vec<String>, BoxError> {
        let handle = self.database.collection::<Document>(collection);
        match handle.list_index_names().await {
            Ok(names) => Ok(names),
            Err(err) if command_code(&err) == Some(NAMESPACE_NOT_FOUND) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}
