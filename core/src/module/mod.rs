//! Capability providers ("modules") and the registry the gateway resolves
//! them from.

mod registry;

pub use registry::ModuleRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModuleError;

pub type Params = Map<String, Value>;

/// Declaration of a single tool a module exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON-schema-like parameter description. `None` skips validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

#[async_trait]
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn tools(&self) -> Vec<ToolDef>;

    /// Execute `tool` and return its raw JSON result text.
    async fn execute_tool(&self, tool: &str, params: &Params) -> Result<String, ModuleError>;

    /// Optional dense rendering of a tool's JSON result.
    fn to_compact(&self, _tool: &str, _json: &str) -> Option<String> {
        None
    }

    fn tool(&self, name: &str) -> Option<ToolDef> {
        self.tools().into_iter().find(|t| t.name == name)
    }
}
