#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use toolgate_core::batch::{BatchEvent, BatchObserver, CreditReporter, SuccessfulTask};
use toolgate_core::{Module, ModuleError, ModuleRegistry, Params, ToolDef};

#[derive(Debug, Clone)]
pub enum Behavior {
    Ok(String),
    Fail(String),
    Delay(Duration, String),
    Hang,
    Panic(&'static str),
}

/// Module whose tools follow a fixed script and record every call.
pub struct ScriptedModule {
    name: String,
    tools: HashMap<String, Behavior>,
    log: Arc<Mutex<Vec<String>>>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl ScriptedModule {
    pub fn new(name: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            tools: HashMap::new(),
            log,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn tool(mut self, name: &str, behavior: Behavior) -> Self {
        self.tools.insert(name.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, tool: &str) -> usize {
        self.calls().iter().filter(|(t, _)| t == tool).count()
    }
}

#[async_trait]
impl Module for ScriptedModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn tools(&self) -> Vec<ToolDef> {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|n| ToolDef::new(n.clone(), ""))
            .collect()
    }

    async fn execute_tool(&self, tool: &str, params: &Params) -> Result<String, ModuleError> {
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), params.clone()));
        self.log.lock().unwrap().push(format!("start:{tool}"));

        let behavior = self
            .tools
            .get(tool)
            .cloned()
            .ok_or_else(|| ModuleError::UnknownTool(tool.to_string()))?;
        let out = match behavior {
            Behavior::Ok(json) => Ok(json),
            Behavior::Fail(msg) => Err(ModuleError::Other(msg)),
            Behavior::Delay(d, json) => {
                tokio::time::sleep(d).await;
                Ok(json)
            }
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Ok("{}".to_string())
            }
            Behavior::Panic(msg) => panic!("{msg}"),
        };

        self.log.lock().unwrap().push(format!("end:{tool}"));
        out
    }

    fn to_compact(&self, tool: &str, json: &str) -> Option<String> {
        Some(format!("{tool}:{json}"))
    }
}

pub fn new_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn registry_with(module: Arc<ScriptedModule>) -> ModuleRegistry {
    ModuleRegistry::new().with(module)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<BatchEvent>>,
}

impl BatchObserver for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_event(&self, event: &BatchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Default)]
pub struct RecordingCredits {
    pub reports: Mutex<Vec<(String, Vec<SuccessfulTask>)>>,
}

impl CreditReporter for RecordingCredits {
    fn report(&self, batch_id: &str, successful: &[SuccessfulTask]) {
        self.reports
            .lock()
            .unwrap()
            .push((batch_id.to_string(), successful.to_vec()));
    }
}
