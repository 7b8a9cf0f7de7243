use async_trait::async_trait;
use serde_json::{json, Value};
use toolgate_core::{Module, ModuleError, Params, ToolDef};

use crate::compact;

/// Local tools that need no remote service.
#[derive(Debug, Default, Clone, Copy)]
pub struct UtilModule;

impl UtilModule {
    pub const NAME: &'static str = "util";
}

#[async_trait]
impl Module for UtilModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Local helper tools"
    }

    fn tools(&self) -> Vec<ToolDef> {
        vec![
            ToolDef::new("echo", "Return the given parameters as the result"),
            ToolDef::new("now", "Current time as an RFC 3339 timestamp"),
        ]
    }

    async fn execute_tool(&self, tool: &str, params: &Params) -> Result<String, ModuleError> {
        match tool {
            "echo" => Ok(Value::Object(params.clone()).to_string()),
            "now" => {
                let ts = chrono::Utc::now().to_rfc3339();
                Ok(json!({ "results": [{ "timestamp": ts }] }).to_string())
            }
            other => Err(ModuleError::UnknownTool(other.to_string())),
        }
    }

    fn to_compact(&self, _tool: &str, json: &str) -> Option<String> {
        compact::to_compact(json)
    }
}
