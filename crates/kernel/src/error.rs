//! Error taxonomy for bootstrap runs.

use std::fmt;

use thiserror::Error;

use crate::backend::BoxError;
use crate::bootstrap::Stage;

/// Exit status for a missing or empty required setting (`EX_CONFIG`).
pub const EXIT_CONFIGURATION: u8 = 78;
/// Exit status when the backend cannot be reached (`EX_UNAVAILABLE`).
pub const EXIT_CONNECTION: u8 = 69;
/// Exit status for a failed schema operation (`EX_SOFTWARE`).
pub const EXIT_SCHEMA: u8 = 70;

/// The schema operation that was in flight when a [`BootstrapError::Schema`] occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStep {
    CreateCollection { collection: String },
    CreateIndex { collection: String, index: String },
    ListCollections,
    ListIndexes { collection: String },
}

impl fmt::Display for SchemaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStep::CreateCollection { collection } => {
                write!(f, "create collection '{}'", collection)
            }
            SchemaStep::CreateIndex { collection, index } => {
                write!(f, "create index '{}' on '{}'", index, collection)
            }
            SchemaStep::ListCollections => f.write_str("list collections"),
            SchemaStep::ListIndexes { collection } => {
                write!(f, "list indexes on '{}'", collection)
            }
        }
    }
}

/// Fatal bootstrap failures. There is no partial-success mode.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("configuration error: required setting '{key}' (env {env}) is missing or empty")]
    Configuration {
        key: &'static str,
        env: &'static str,
    },

    #[error("connection error: cannot open database '{database}' at {target}")]
    Connection {
        target: String,
        database: String,
        #[source]
        source: BoxError,
    },

    #[error("schema error: {step} failed")]
    Schema {
        step: SchemaStep,
        #[source]
        source: BoxError,
    },
}

impl BootstrapError {
    pub fn schema(step: SchemaStep, source: impl Into<BoxError>) -> Self {
        Self::Schema {
            step,
            source: source.into(),
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::Configuration { .. } => EXIT_CONFIGURATION,
            BootstrapError::Connection { .. } => EXIT_CONNECTION,
            BootstrapError::Schema { .. } => EXIT_SCHEMA,
        }
    }

    /// Last stage completed before the failure.
    pub fn reached_stage(&self) -> Stage {
        match self {
            BootstrapError::Configuration { .. } => Stage::Start,
            BootstrapError::Connection { .. } => Stage::ConfigResolved,
            BootstrapError::Schema { step, .. } => match step {
                SchemaStep::CreateIndex { .. } | SchemaStep::ListIndexes { .. } => {
                    Stage::CollectionsEnsured
                }
                SchemaStep::CreateCollection { .. } | SchemaStep::ListCollections => {
                    Stage::DatabaseSelected
                }
            },
        }
    }

    /// Message including every error in the source chain, joined with `: `.
    pub fn diagnostic(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let config = BootstrapError::Configuration {
            key: "database.name",
            env: "MONGO_INITDB_DATABASE",
        };
        let connection = BootstrapError::Connection {
            target: "mongodb://127.0.0.1:27017".to_string(),
            database: "blog".to_string(),
            source: "refused".into(),
        };
        let schema = BootstrapError::schema(
            SchemaStep::CreateCollection {
                collection: "posts".to_string(),
            },
            "not authorized",
        );

        assert_eq!(config.exit_code(), EXIT_CONFIGURATION);
        assert_eq!(connection.exit_code(), EXIT_CONNECTION);
        assert_eq!(schema.exit_code(), EXIT_SCHEMA);
    }

    #[test]
    fn diagnostic_names_the_failed_step_and_cause() {
        let err = BootstrapError::schema(
            SchemaStep::CreateIndex {
                collection: "posts".to_string(),
                index: "compositeKey_-1".to_string(),
            },
            "not authorized on blog",
        );

        assert_eq!(
            err.diagnostic(),
            "schema error: create index 'compositeKey_-1' on 'posts' failed: not authorized on blog"
        );
        assert_eq!(err.reached_stage(), Stage::CollectionsEnsured);
    }

    #[test]
    fn configuration_error_names_key_and_variable() {
        let err = BootstrapError::Configuration {
            key: "database.name",
            env: "MONGO_INITDB_DATABASE",
        };
        let message = err.to_string();
        assert!(message.contains("database.name"));
        assert!(message.contains("MONGO_INITDB_DATABASE"));
        assert_eq!(err.reached_stage(), Stage::Start);
    }
}
