use std::time::Duration;

use thiserror::Error;

use super::batch::BatchError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("batch rejected: {0}")]
    Batch(#[from] BatchError),
    #[error("command failed: {0}")]
    Command(String),
    /// Bad command-line input, such as malformed `--params` JSON.
    #[error("usage error: {0}")]
    Usage(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Failures reported by a module while executing one of its tools.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Other(String),
}

/// Parameter validation failure against a tool's declared input schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameter '{0}'")]
    MissingRequired(String),
    #[error("parameter '{field}' must be of type {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    #[error("parameter '{field}' must be one of {allowed}")]
    NotInEnum { field: String, allowed: String },
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
}

/// Terminal failure of a single tool call, rendered into the batch response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("module '{0}' not found")]
    ModuleNotFound(String),
    #[error("tool '{tool}' not found in module '{module}'")]
    ToolNotFound { module: String, tool: String },
    #[error("invalid parameters for {module}.{tool}: {message}")]
    Validation {
        module: String,
        tool: String,
        message: String,
    },
    #[error("module '{module}' timed out after {}s", .timeout.as_secs())]
    Timeout { module: String, timeout: Duration },
    #[error("call to module '{0}' cancelled")]
    Cancelled(String),
    #[error("module '{module}' failed: {message}")]
    Module { module: String, message: String },
}
