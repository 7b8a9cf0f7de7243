use thiserror::Error;

/// Structural batch errors. Any of these rejects the whole batch before a
/// single task runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch contains no commands")]
    EmptyBatch,

    #[error("batch has {count} commands, maximum is {max}")]
    TooManyCommands { count: usize, max: usize },

    #[error("failed to parse command on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("command on line {line} is missing required field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

impl BatchError {
    /// Stable machine-readable code, emitted next to the message in rejected
    /// batch responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "empty_batch",
            Self::TooManyCommands { .. } => "too_many_commands",
            Self::Parse { .. } => "parse_error",
            Self::MissingField { .. } => "validation_error",
            Self::DuplicateTaskId(_) => "duplicate_task_id",
            Self::DependencyNotFound { .. } => "dependency_error",
            Self::CircularDependency(_) => "circular_dependency",
        }
    }
}
