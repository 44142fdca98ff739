use std::sync::Arc;

use crate::module::SchemaModule;
use crate::schema::SchemaPlan;

/// Module registry that keeps schema modules in registration order.
pub struct SchemaRegistry {
    modules: Vec<Arc<dyn SchemaModule>>,
}

impl SchemaRegistry {
    /// Create a new schema registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module. Registering the same name twice keeps the first one.
    pub fn register(&mut self, module: Arc<dyn SchemaModule>) {
        if self.get_module(module.name()).is_some() {
            tracing::warn!(module = module.name(), "schema module already registered");
            return;
        }
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn SchemaModule>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn SchemaModule>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Collect the collections of every module into one plan.
    pub fn plan(&self) -> SchemaPlan {
        let mut plan = SchemaPlan::new();

        for module in &self.modules {
            let collections = module.collections();
            tracing::debug!(
                module = module.name(),
                collections = collections.len(),
                "collecting schema"
            );
            for collection in collections {
                plan.push(collection);
            }
        }

        plan
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
