//! Command-line argument parsing for the globe binary.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Contact globe command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "globe", about = "Procedural Earth and galaxy scene")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Enable vsync.
    #[arg(long)]
    pub vsync: Option<bool>,

    /// Seed for procedural texture jitter.
    #[arg(long)]
    pub seed: Option<u64>,

    /// MSAA sample count (1 disables multisampling).
    #[arg(long)]
    pub msaa: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the synthesized textures as PNG files into this directory and exit.
    #[arg(long)]
    pub dump_textures: Option<PathBuf>,
}

impl Config {
    /// Overwrite every setting the command line names; the rest keep their
    /// file values.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let window = &mut self.window;
        window.width = args.width.unwrap_or(window.width);
        window.height = args.height.unwrap_or(window.height);
        window.fullscreen = args.fullscreen.unwrap_or(window.fullscreen);
        window.vsync = args.vsync.unwrap_or(window.vsync);

        if args.seed.is_some() {
            self.scene.seed = args.seed;
        }
        self.render.msaa_samples = args.msaa.unwrap_or(self.render.msaa_samples);
        if let Some(level) = &args.log_level {
            self.debug.log_level.clone_from(level);
        }
    }
}
