mod load;
mod types;

pub use load::{apply_env_overrides, get_toolgate_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, BatchConfig, LoggingConfig, ModuleConfig, ToolConfig, DEFAULT_MAX_COMMANDS,
};
