//! Project-specific utilities live here.

pub mod composite_key;

pub use composite_key::{CompositeKey, CompositeKeyError, CompositeKeyParts};
