use crate::schema::CollectionSpec;

/// A unit of the application that owns part of the database schema.
pub trait SchemaModule: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Collections (with their indexes) this module needs.
    /// Collections are ensured in the order returned.
    fn collections(&self) -> Vec<CollectionSpec> {
        vec![]
    }
}
