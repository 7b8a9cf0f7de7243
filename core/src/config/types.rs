use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    /// Remote modules exposed through the gateway.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "toolgate_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Commands accepted in one batch before it is rejected outright.
    #[serde(default = "default_max_commands")]
    pub max_commands: usize,
}

pub const DEFAULT_MAX_COMMANDS: usize = 10;

fn default_max_commands() -> usize {
    DEFAULT_MAX_COMMANDS
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_commands: default_max_commands(),
        }
    }
}

/// An HTTP-backed module declared in `[[modules]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub base_url: String,

    /// Name of the environment variable holding a bearer token, if any.
    #[serde(default)]
    pub token_env: Option<String>,

    /// Transport-level timeout for a single request. The gateway's own
    /// per-call deadline still applies on top of this.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

fn default_request_timeout_ms() -> u64 {
    25_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_http_method")]
    pub method: String,

    pub path: String,

    /// JSON-schema-like description of the tool's parameters.
    #[serde(default)]
    pub input_schema: Option<Value>,
}

fn default_http_method() -> String {
    "POST".to_string()
}
