//! Re-reading `config.ron` while the globe is running.
//!
//! The file is compared against what was last read from disk, so command-line
//! overrides never count as a change; they are re-applied on top of every
//! reloaded file.

use std::path::{Path, PathBuf};

use globe_config::{CliArgs, Config, ConfigError};

/// Where the running config came from.
pub struct ConfigSource {
    dir: PathBuf,
    file: Config,
    cli: CliArgs,
}

impl ConfigSource {
    /// `file` is the config as read from `dir`, before `cli` overrides.
    pub fn new(dir: PathBuf, file: Config, cli: CliArgs) -> Self {
        Self { dir, file, cli }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The effective config for the current file contents.
    pub fn effective(&self) -> Config {
        let mut config = self.file.clone();
        config.apply_cli_overrides(&self.cli);
        config
    }

    /// Re-read the file. Returns the new effective config when the file
    /// changed since the last read.
    pub fn reload(&mut self) -> Result<Option<Config>, ConfigError> {
        let Some(fresh) = self.file.reload(&self.dir)? else {
            return Ok(None);
        };
        self.file = fresh;
        Ok(Some(self.effective()))
    }
}

/// How a new config differs from the running one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReloadEffect {
    /// Scene, render or vsync settings changed; the globe must be rebuilt.
    pub remount: bool,
    /// Size, fullscreen or title changed; these apply on the next start.
    pub needs_restart: bool,
}

impl ReloadEffect {
    pub fn between(old: &Config, new: &Config) -> Self {
        let (a, b) = (&old.window, &new.window);
        Self {
            remount: old.scene != new.scene
                || old.render != new.render
                || a.vsync != b.vsync,
            needs_restart: a.width != b.width
                || a.height != b.height
                || a.fullscreen != b.fullscreen
                || a.title != b.title,
        }
    }
}
