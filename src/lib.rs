//! Feed database application.
//!
//! Declares the feed schema (the `posts` and `comments` collections and the
//! descending `compositeKey` index), the stored document models, and the
//! composite pagination key.

pub mod modules;
pub mod utils;

pub use modules::{register_all, schema_plan};

use feedbase_kernel::settings::Settings;
use feedbase_kernel::{BootstrapError, BootstrapReport, SchemaCheck};

/// Ensure the feed schema exists in the configured MongoDB database.
pub async fn run_bootstrap(settings: &Settings) -> Result<BootstrapReport, BootstrapError> {
    let connector = feedbase_db::connector(&settings.database);
    feedbase_kernel::bootstrap(&settings.database, &schema_plan(), &connector).await
}

/// Compare the configured MongoDB database against the feed schema.
pub async fn run_check(settings: &Settings) -> Result<SchemaCheck, BootstrapError> {
    let connector = feedbase_db::connector(&settings.database);
    feedbase_kernel::check(&settings.database, &schema_plan(), &connector).await
}

/// Process exit status for an error returned by a binary.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<BootstrapError>()
        .map(BootstrapError::exit_code)
        .unwrap_or(1)
}
