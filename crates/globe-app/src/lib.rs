//! Contact globe application.
//!
//! Hosts the globe component in a winit window: mount and unmount, the
//! self-rescheduling frame loop, config reload on F5, and the texture dump
//! used by the CLI.

pub mod frame_loop;
pub mod host;
pub mod lifecycle;
pub mod reload;
pub mod window;

#[cfg(test)]
mod test_support;

use std::path::Path;

use globe_texture::{RasterError, TextureSet};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

pub use frame_loop::{Clock, FrameLoop, LoopError, LoopState, SystemClock};
pub use host::{AnimationHandle, Host, ListenerId};
pub use lifecycle::{GlobeComponent, GlobeSettings, MountError, TextureSource, resolve_seed};
pub use reload::{ConfigSource, ReloadEffect};
pub use window::{AppError, GlobeApp, WinitHost, run, window_attributes};

/// Synthesize the texture set and write it as PNG files into `dir`.
///
/// Returns the seed used, so a dump can be reproduced.
pub fn dump_textures(dir: &Path, seed: Option<u64>) -> Result<u64, RasterError> {
    let seed = resolve_seed(seed);
    info!(seed, "Dumping textures to {}", dir.display());
    let textures = TextureSet::synthesize(&mut ChaCha8Rng::seed_from_u64(seed));
    textures.save_png(dir)?;
    Ok(seed)
}
