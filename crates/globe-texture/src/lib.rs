//! Procedural texture synthesis for the contact globe.
//!
//! Paints the five rasters the scene needs on the CPU with a small 2D canvas:
//! planet albedo, bump and specular maps, the cloud shell and the galaxy
//! backdrop. All randomness comes from the caller's generator, so a fixed
//! seed reproduces the same images.

mod canvas;
mod clouds;
mod color;
mod galaxy;
mod gradient;
mod planet;
mod raster;

use std::path::Path;

use rand::Rng;

pub use canvas::{Canvas, Paint};
pub use clouds::{
    CLOUD_MAP_SIZE, CloudFormation, CloudKind, FORMATIONS, PuffParams, WISP_COUNT, cloud_map,
};
pub use color::Rgba;
pub use galaxy::{
    CLUSTER_COUNT, GALAXY_MAP_SIZE, GalaxyStats, NEBULAE, STAR_COUNT, Star, StarClass,
    galaxy_map, generate_stars,
};
pub use gradient::{ColorStop, Gradient, LinearGradient, RadialGradient};
pub use planet::{
    BUMP_MAP_SIZE, CONTINENTS, COLOR_MAP_SIZE, LandPatch, SPECULAR_MAP_SIZE, Terrain, bump_map,
    color_map, specular_map,
};
pub use raster::{RasterError, RasterImage, WrapMode};

/// Every raster the scene is built from.
#[derive(Clone, Debug)]
pub struct TextureSet {
    pub color: RasterImage,
    pub bump: RasterImage,
    pub specular: RasterImage,
    pub clouds: RasterImage,
    pub galaxy: RasterImage,
    pub galaxy_stats: GalaxyStats,
}

impl TextureSet {
    /// Paint all five rasters, drawing jitter from `rng`.
    pub fn synthesize(rng: &mut impl Rng) -> Self {
        let start = std::time::Instant::now();

        let color = color_map(rng);
        let bump = bump_map();
        let specular = specular_map();
        let clouds = cloud_map(rng);
        let (galaxy, galaxy_stats) = galaxy_map(rng);

        log::info!(
            "Synthesized textures in {:.1} ms ({} stars)",
            start.elapsed().as_secs_f64() * 1000.0,
            galaxy_stats.total()
        );

        Self {
            color,
            bump,
            specular,
            clouds,
            galaxy,
            galaxy_stats,
        }
    }

    /// Named rasters in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &RasterImage)> {
        [
            ("color", &self.color),
            ("bump", &self.bump),
            ("specular", &self.specular),
            ("clouds", &self.clouds),
            ("galaxy", &self.galaxy),
        ]
        .into_iter()
    }

    /// Write every raster as `<name>.png` into `dir`, creating it if needed.
    pub fn save_png(&self, dir: &Path) -> Result<(), RasterError> {
        std::fs::create_dir_all(dir).map_err(|source| RasterError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        for (name, raster) in self.iter() {
            let path = dir.join(format!("{name}.png"));
            raster.save_png(&path)?;
            log::info!("Wrote {}", path.display());
        }
        Ok(())
    }
}
