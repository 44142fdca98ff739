pub mod models;

use std::sync::Arc;

use feedbase_kernel::{CollectionSpec, IndexSpec, SchemaModule, SortOrder};

pub const COLLECTION: &str = "posts";

/// Posts are paged newest-activity first by their composite key.
pub struct PostsModule;

impl PostsModule {
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaModule for PostsModule {
    fn name(&self) -> &'static str {
        "posts"
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new(COLLECTION).with_index(IndexSpec::on(
            models::COMPOSITE_KEY_FIELD,
            SortOrder::Descending,
        ))]
    }
}

/// Create a new instance of the posts module
pub fn create_module() -> Arc<dyn SchemaModule> {
    Arc::new(PostsModule::new())
}
