pub mod batch;
#[allow(clippy::module_inception)]
pub mod error;

pub use batch::BatchError;
pub use error::{CallError, CliError, ModuleError, ValidationError};
