use std::collections::BTreeMap;
use std::sync::Arc;

use super::Module;

/// Name → module lookup, built once and handed to the executors.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under its own name, replacing any previous module
    /// with that name.
    pub fn register(&mut self, module: Arc<dyn Module>) -> Option<Arc<dyn Module>> {
        let name = module.name().to_string();
        let replaced = self.modules.insert(name.clone(), module);
        if replaced.is_some() {
            tracing::warn!(module = %name, "module registered twice, keeping the latest");
        }
        replaced
    }

    pub fn with(mut self, module: Arc<dyn Module>) -> Self {
        self.register(module);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}
