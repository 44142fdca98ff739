pub mod comments;
pub mod posts;

use feedbase_kernel::{SchemaPlan, SchemaRegistry};

/// Register all schema modules with the registry. Posts come first so the
/// collection carrying the feed index is created before anything else.
pub fn register_all(registry: &mut SchemaRegistry) {
    registry.register(posts::create_module());
    registry.register(comments::create_module());
}

/// The complete feed schema.
pub fn schema_plan() -> SchemaPlan {
    let mut registry = SchemaRegistry::new();
    register_all(&mut registry);
    registry.plan()
}
