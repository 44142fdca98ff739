//! The bootstrap lifecycle: resolve the database, ensure collections, ensure indexes.

use serde::Serialize;

use crate::backend::{Connector, DatabaseHandle, Ensured};
use crate::error::{BootstrapError, SchemaStep};
use crate::schema::{DatabaseName, SchemaPlan};
use crate::settings::{DatabaseSettings, DATABASE_NAME_ENV};

/// Settings key holding the database name.
pub const DATABASE_NAME_KEY: &str = "database.name";

/// Linear progression of a run. Failures carry the last stage reached,
/// see [`BootstrapError::reached_stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    ConfigResolved,
    DatabaseSelected,
    CollectionsEnsured,
    IndexEnsured,
    Done,
}

impl Stage {
    pub fn next(self) -> Self {
        match self {
            Stage::Start => Stage::ConfigResolved,
            Stage::ConfigResolved => Stage::DatabaseSelected,
            Stage::DatabaseSelected => Stage::CollectionsEnsured,
            Stage::CollectionsEnsured => Stage::IndexEnsured,
            Stage::IndexEnsured | Stage::Done => Stage::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionOutcome {
    pub collection: String,
    pub outcome: Ensured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexOutcome {
    pub collection: String,
    pub index: String,
    pub outcome: Ensured,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub database: String,
    pub stage: Stage,
    pub collections: Vec<CollectionOutcome>,
    pub indexes: Vec<IndexOutcome>,
}

impl BootstrapReport {
    fn new(database: &DatabaseName) -> Self {
        Self {
            database: database.to_string(),
            stage: Stage::ConfigResolved,
            collections: Vec::new(),
            indexes: Vec::new(),
        }
    }

    fn advance(&mut self) {
        self.stage = self.stage.next();
        tracing::debug!(stage = ?self.stage, database = %self.database, "bootstrap stage reached");
    }

    /// Number of collections and indexes this run actually created.
    pub fn created_count(&self) -> usize {
        let collections = self
            .collections
            .iter()
            .filter(|c| c.outcome == Ensured::Created)
            .count();
        let indexes = self
            .indexes
            .iter()
            .filter(|i| i.outcome == Ensured::Created)
            .count();
        collections + indexes
    }

    /// True when everything already existed.
    pub fn is_noop(&self) -> bool {
        self.created_count() == 0
    }
}

/// Read the target database name from settings.
///
/// Fails with [`BootstrapError::Configuration`] when the name is unset or
/// blank. Nothing is contacted before this succeeds.
pub fn resolve_database_name(settings: &DatabaseSettings) -> Result<DatabaseName, BootstrapError> {
    settings
        .name
        .clone()
        .and_then(DatabaseName::new)
        .ok_or(BootstrapError::Configuration {
            key: DATABASE_NAME_KEY,
            env: DATABASE_NAME_ENV,
        })
}

async fn select<C: Connector>(
    settings: &DatabaseSettings,
    connector: &C,
) -> Result<(DatabaseName, C::Database), BootstrapError> {
    let name = resolve_database_name(settings)?;
    tracing::info!(database = %name, "database name resolved");

    let target = connector.target();
    let database = connector
        .select_database(&name)
        .await
        .map_err(|source| BootstrapError::Connection {
            target: target.clone(),
            database: name.to_string(),
            source,
        })?;
    tracing::info!(database = %name, backend = %target, "database selected");

    Ok((name, database))
}

/// Ensure every collection and index in `plan` exists in the configured database.
///
/// Collections are ensured first, in plan order, then indexes. Re-running
/// against an initialised database succeeds and reports every object as
/// already present. The first failure aborts the run.
pub async fn bootstrap<C: Connector>(
    settings: &DatabaseSettings,
    plan: &SchemaPlan,
    connector: &C,
) -> Result<BootstrapReport, BootstrapError> {
    let (name, database) = select(settings, connector).await?;
    let mut report = BootstrapReport::new(&name);
    report.advance();

    for collection in plan.collections() {
        let outcome = database
            .ensure_collection(&collection.name)
            .await
            .map_err(|source| {
                BootstrapError::schema(
                    SchemaStep::CreateCollection {
                        collection: collection.name.clone(),
                    },
                    source,
                )
            })?;
        tracing::info!(
            database = database.name(),
            collection = %collection.name,
            ?outcome,
            "collection ensured"
        );
        report.collections.push(CollectionOutcome {
            collection: collection.name.clone(),
            outcome,
        });
    }
    report.advance();

    for collection in plan.collections() {
        for index in &collection.indexes {
            let outcome = database
                .ensure_index(&collection.name, index)
                .await
                .map_err(|source| {
                    BootstrapError::schema(
                        SchemaStep::CreateIndex {
                            collection: collection.name.clone(),
                            index: index.name().to_string(),
                        },
                        source,
                    )
                })?;
            tracing::info!(
                database = database.name(),
                collection = %collection.name,
                index = index.name(),
                ?outcome,
                "index ensured"
            );
            report.indexes.push(IndexOutcome {
                collection: collection.name.clone(),
                index: index.name().to_string(),
                outcome,
            });
        }
    }
    report.advance();
    report.advance();

    tracing::info!(
        database = %report.database,
        created = report.created_count(),
        "schema bootstrap complete"
    );

    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingIndex {
    pub collection: String,
    pub index: String,
}

/// Comparison between a plan and what a database actually holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaCheck {
    pub database: String,
    pub missing_collections: Vec<String>,
    pub missing_indexes: Vec<MissingIndex>,
}

impl SchemaCheck {
    pub fn is_complete(&self) -> bool {
        self.missing_collections.is_empty() && self.missing_indexes.is_empty()
    }
}

/// Report which parts of `plan` are absent from the configured database.
/// Never mutates the database.
pub async fn check<C: Connector>(
    settings: &DatabaseSettings,
    plan: &SchemaPlan,
    connector: &C,
) -> Result<SchemaCheck, BootstrapError> {
    let (name, database) = select(settings, connector).await?;

    let existing = database
        .collection_names()
        .await
        .map_err(|source| BootstrapError::schema(SchemaStep::ListCollections, source))?;

    let mut result = SchemaCheck {
        database: name.to_string(),
        missing_collections: Vec::new(),
        missing_indexes: Vec::new(),
    };

    for collection in plan.collections() {
        let indexes = if existing.contains(&collection.name) {
            database
                .index_names(&collection.name)
                .await
                .map_err(|source| {
                    BootstrapError::schema(
                        SchemaStep::ListIndexes {
                            collection: collection.name.clone(),
                        },
                        source,
                    )
                })?
        } else {
            result.missing_collections.push(collection.name.clone());
            Vec::new()
        };

        for index in &collection.indexes {
            if !indexes.iter().any(|name| name == index.name()) {
                result.missing_indexes.push(MissingIndex {
                    collection: collection.name.clone(),
                    index: index.name().to_string(),
                });
            }
        }
    }

    tracing::info!(
        database = %result.database,
        missing_collections = result.missing_collections.len(),
        missing_indexes = result.missing_indexes.len(),
        "schema check complete"
    );

    Ok(result)
}
