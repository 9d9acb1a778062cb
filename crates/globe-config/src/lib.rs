//! Configuration for the contact globe: `config.ron` in the platform config
//! directory, overridable from the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE, Config, DebugConfig, RenderConfig, SceneConfig, WindowConfig,
    default_config_dir,
};
pub use error::ConfigError;
