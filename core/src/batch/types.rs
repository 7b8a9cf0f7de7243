use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::module::Params;

/// One parsed line of a batch. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub after: Vec<String>,
    #[serde(default)]
    pub output: bool,
}

impl TaskDescriptor {
    /// True when the caller asked for the raw JSON rather than the module's
    /// compact rendering.
    pub fn wants_json(&self) -> bool {
        self.params.get("format").and_then(Value::as_str) == Some("json")
    }
}

/// Common task interface for graph handling.
pub trait TaskLike {
    fn id(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

impl TaskLike for TaskDescriptor {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.after
    }
}

/// A validated batch: descriptors keyed by id plus their original order.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub order: Vec<String>,
    pub tasks: HashMap<String, TaskDescriptor>,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Descriptors in parse order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }
}

/// Terminal state of a task after a batch run. Exactly one variant per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded(String),
    Failed(String),
    Skipped,
}
