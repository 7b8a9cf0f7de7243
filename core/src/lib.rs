//! Core of the toolgate gateway: modules, single tool calls and batch
//! orchestration.

pub mod batch;
pub mod call;
pub mod config;
pub mod error;
pub mod module;
pub mod validate;

pub use batch::{BatchEngine, BatchReport, BatchResponse, SuccessfulTask};
pub use call::{ToolCallResult, ToolCaller, CALL_TIMEOUT};
pub use error::{BatchError, CallError, CliError, ModuleError, ValidationError};
pub use module::{Module, ModuleRegistry, Params, ToolDef};
