//! Module registry - lookup of module definitions by ID.

use serde::{Deserialize, Serialize};

use crate::entities::{ModuleData, ModuleId};
use crate::error::ProgressError;

/// All known module definitions, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleRegistry {
    #[serde(default)]
    modules: Vec<ModuleData>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load module definitions from a TOML document with a `[[modules]]` array.
    pub fn from_toml_str(source: &str) -> Result<Self, ProgressError> {
        let registry: ModuleRegistry = toml::from_str(source)?;
        tracing::debug!(modules = registry.modules.len(), "loaded module registry");
        Ok(registry)
    }

    /// Register a module, replacing any existing definition with the same ID.
    pub fn register(&mut self, module: ModuleData) {
        if let Some(existing) = self.modules.iter_mut().find(|m| m.id == module.id) {
            *existing = module;
        } else {
            self.modules.push(module);
        }
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ModuleData> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleData> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules whose unlock requirement depends on completing `id`.
    pub fn dependents_of<'a>(&'a self, id: &'a ModuleId) -> impl Iterator<Item = &'a ModuleData> {
        self.modules
            .iter()
            .filter(move |m| m.dependencies().contains(id))
    }
}
