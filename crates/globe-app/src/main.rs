//! The `globe` binary: a window showing the procedural Earth and galaxy.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p globe-app -- --seed 42` for a reproducible scene, or
//! `--dump-textures <DIR>` to write the synthesized maps and exit. Press F5 to
//! re-read `config.ron` without restarting.

use std::process::ExitCode;

use clap::Parser;
use globe_app::ConfigSource;
use globe_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone().map_or_else(default_config_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to resolve config directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let file_config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    globe_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    info!("Config directory: {}", config_dir.display());

    if let Some(dir) = &args.dump_textures {
        return match globe_app::dump_textures(dir, config.scene.seed) {
            Ok(seed) => {
                info!("Wrote textures for seed {seed} to {}", dir.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Texture dump failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let source = ConfigSource::new(config_dir, file_config, args);
    match globe_app::run(config, Some(source)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Globe exited with error: {e}");
            ExitCode::FAILURE
        }
    }
}
