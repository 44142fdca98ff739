pub mod models;

use std::sync::Arc;

use feedbase_kernel::{CollectionSpec, SchemaModule};

pub const COLLECTION: &str = "comments";

/// Comments carry no secondary index; lookups go through the embedded
/// recent comments on each post.
pub struct CommentsModule;

impl CommentsModule {
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaModule for CommentsModule {
    fn name(&self) -> &'static str {
        "comments"
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new(COLLECTION)]
    }
}

/// Create a new instance of the comments module
pub fn create_module() -> Arc<dyn SchemaModule> {
    Arc::new(CommentsModule::new())
}
