//! Declarative description of the collections and indexes a database must carry.

use std::fmt;

use serde::Serialize;

/// Name of the database a bootstrap run targets. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Accept `value` verbatim unless it is empty or only whitespace.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort direction of a single index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Numeric direction as written in index key documents.
    pub fn as_i32(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexKey {
    pub field: String,
    pub order: SortOrder,
}

/// An index over one or more fields of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    name: String,
    keys: Vec<IndexKey>,
    #[serde(skip)]
    explicit_name: bool,
}

impl IndexSpec {
    /// Single-field index.
    pub fn on(field: impl Into<String>, order: SortOrder) -> Self {
        let keys = vec![IndexKey {
            field: field.into(),
            order,
        }];
        Self {
            name: derive_name(&keys),
            keys,
            explicit_name: false,
        }
    }

    /// Append another key, producing a compound index. A name set with
    /// `named` is kept.
    pub fn then(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.keys.push(IndexKey {
            field: field.into(),
            order,
        });
        if !self.explicit_name {
            self.name = derive_name(&self.keys);
        }
        self
    }

    /// Override the derived name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.explicit_name = true;
        self
    }

    /// Server-side name, `<field>_<dir>` joined with `_` (e.g. `compositeKey_-1`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[IndexKey] {
        &self.keys
    }
}

fn derive_name(keys: &[IndexKey]) -> String {
    keys.iter()
        .map(|key| format!("{}_{}", key.field, key.order.as_i32()))
        .collect::<Vec<_>>()
        .join("_")
}

/// A schemaless collection and the indexes it must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSpec {
    pub name: String,
    pub indexes: Vec<IndexSpec>,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indexes: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }
}

/// Ordered set of collections to ensure. Collections keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaPlan {
    collections: Vec<CollectionSpec>,
}

impl SchemaPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection. A collection already in the plan absorbs the new
    /// indexes; indexes whose name is already present are dropped.
    pub fn push(&mut self, collection: CollectionSpec) {
        match self
            .collections
            .iter_mut()
            .find(|existing| existing.name == collection.name)
        {
            Some(existing) => {
                for index in collection.indexes {
                    if !existing.indexes.iter().any(|i| i.name() == index.name()) {
                        existing.indexes.push(index);
                    }
                }
            }
            None => self.collections.push(collection),
        }
    }

    pub fn collections(&self) -> &[CollectionSpec] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn index_count(&self) -> usize {
        self.collections.iter().map(|c| c.indexes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}
