use std::sync::Arc;

use anyhow::Result;
use toolgate_core::batch::BatchObserver;
use toolgate_core::config::AppConfig;
use toolgate_core::ModuleRegistry;

use crate::modules::{HttpModule, UtilModule};
use crate::observers::{JsonlObserver, TracingObserver};

/// Build the registry: the built-in `util` module plus every `[[modules]]`
/// entry from configuration.
pub fn build_registry(cfg: &AppConfig) -> Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new().with(Arc::new(UtilModule));

    for module_cfg in &cfg.modules {
        if module_cfg.name == UtilModule::NAME {
            anyhow::bail!("module name '{}' is reserved", UtilModule::NAME);
        }
        let module = HttpModule::from_config(module_cfg)?;
        tracing::debug!(
            module = %module_cfg.name,
            tools = module_cfg.tools.len(),
            "registered http module"
        );
        registry.register(Arc::new(module));
    }

    Ok(registry)
}

pub fn build_observer(kind: &str) -> Option<Arc<dyn BatchObserver>> {
    match kind {
        "jsonl" => Some(Arc::new(JsonlObserver::stderr())),
        "log" => Some(Arc::new(TracingObserver)),
        _ => None,
    }
}
