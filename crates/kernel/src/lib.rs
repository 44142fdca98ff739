//! Core types for the feed database bootstrapper: settings, the declarative
//! schema model, backend traits, and the bootstrap lifecycle.

pub mod backend;
pub mod bootstrap;
pub mod error;
pub mod module;
pub mod registry;
pub mod schema;
pub mod settings;

pub use backend::{BoxError, Connector, DatabaseHandle, Ensured};
pub use bootstrap::{
    bootstrap, check, resolve_database_name, BootstrapReport, SchemaCheck, Stage,
};
pub use error::{BootstrapError, SchemaStep};
pub use module::SchemaModule;
pub use registry::SchemaRegistry;
pub use schema::{CollectionSpec, DatabaseName, IndexKey, IndexSpec, SchemaPlan, SortOrder};
