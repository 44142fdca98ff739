//! Database backends for the feed schema bootstrapper.
//!
//! [`MongoConnector`] talks to a real server; [`MemoryServer`] keeps
//! everything in process and is what the test suites run against.

pub mod memory;
pub mod mongo;

pub use memory::{MemoryDatabase, MemoryError, MemoryServer};
pub use mongo::{redact_uri, MongoConnector, MongoDatabase};

use feedbase_kernel::settings::DatabaseSettings;

/// Build the MongoDB connector for `settings`. No I/O happens until a
/// database is selected.
pub fn connector(settings: &DatabaseSettings) -> MongoConnector {
    tracing::debug!(
        target: "feedbase-db",
        uri = %redact_uri(&settings.uri),
        "mongodb connector configured"
    );
    MongoConnector::new(settings)
}
