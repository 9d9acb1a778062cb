//! Planet surface maps: albedo, bump and specular.
//!
//! Continent and ocean placements are hand-tuned pixel constants. They are
//! reference art, not geography.

use rand::Rng;

use crate::canvas::{Canvas, Paint};
use crate::color::Rgba;
use crate::gradient::{ColorStop, Gradient, RadialGradient};
use crate::raster::{RasterImage, WrapMode};

pub const COLOR_MAP_SIZE: (u32, u32) = (2048, 1024);
pub const BUMP_MAP_SIZE: (u32, u32) = (1024, 512);
pub const SPECULAR_MAP_SIZE: (u32, u32) = (1024, 512);

/// Randomized darker patches in the ocean.
pub const DEPTH_BLOB_COUNT: usize = 50;

/// Broad classification of a land patch, used to pick its palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terrain {
    Forest,
    Desert,
    Mountain,
    Ice,
}

/// A filled ellipse on the color map.
#[derive(Clone, Copy, Debug)]
pub struct LandPatch {
    pub name: &'static str,
    pub center: [f32; 2],
    pub radii: [f32; 2],
    pub rotation: f32,
    pub color: u32,
    pub terrain: Terrain,
}

const fn land(
    name: &'static str,
    center: [f32; 2],
    radii: [f32; 2],
    rotation: f32,
    color: u32,
    terrain: Terrain,
) -> LandPatch {
    LandPatch {
        name,
        center,
        radii,
        rotation,
        color,
        terrain,
    }
}

/// Land patches in paint order. Later patches overdraw earlier ones.
pub const CONTINENTS: [LandPatch; 14] = [
    land("africa", [1150.0, 400.0], [60.0, 120.0], 0.2, 0x16a34a, Terrain::Forest),
    land("sahara", [1120.0, 350.0], [45.0, 30.0], 0.0, 0xd97706, Terrain::Desert),
    land("europe", [1080.0, 280.0], [35.0, 25.0], -0.3, 0x22c55e, Terrain::Forest),
    land("asia", [1400.0, 320.0], [120.0, 80.0], 0.1, 0x15803d, Terrain::Forest),
    land("himalayas", [1350.0, 340.0], [40.0, 15.0], 0.0, 0x78716c, Terrain::Mountain),
    land("siberia", [1300.0, 250.0], [80.0, 40.0], 0.0, 0x064e3b, Terrain::Forest),
    land("north_america", [400.0, 280.0], [90.0, 100.0], -0.2, 0x16a34a, Terrain::Forest),
    land("rockies", [350.0, 300.0], [20.0, 60.0], -0.3, 0x8b5cf6, Terrain::Mountain),
    land("south_america", [600.0, 600.0], [50.0, 120.0], 0.1, 0x059669, Terrain::Forest),
    land("andes", [580.0, 650.0], [15.0, 80.0], 0.0, 0x78716c, Terrain::Mountain),
    land("australia", [1650.0, 750.0], [60.0, 40.0], 0.0, 0xd97706, Terrain::Desert),
    land("australia_coast", [1680.0, 740.0], [20.0, 15.0], 0.0, 0x16a34a, Terrain::Forest),
    land("antarctica", [1024.0, 950.0], [200.0, 50.0], 0.0, 0xf8fafc, Terrain::Ice),
    land("greenland", [700.0, 180.0], [35.0, 50.0], 0.0, 0xe2e8f0, Terrain::Ice),
];

/// Raised areas on the bump map: `(center, radii, color)`.
pub const MOUNTAIN_RANGES: [([f32; 2], [f32; 2], u32); 3] = [
    ([675.0, 160.0], [40.0, 15.0], 0xffffff),
    ([175.0, 150.0], [20.0, 60.0], 0xe0e0ff),
    ([290.0, 325.0], [15.0, 80.0], 0xe0e0ff),
];

/// Reflective water on the specular map: `(center, radii)`.
pub const OCEAN_BASINS: [([f32; 2], [f32; 2]); 3] = [
    ([256.0, 256.0], [200.0, 150.0]),
    ([100.0, 200.0], [150.0, 200.0]),
    ([750.0, 300.0], [120.0, 100.0]),
];

/// Albedo map: ocean gradient, depth blobs, then land.
pub fn color_map(rng: &mut impl Rng) -> RasterImage {
    let (width, height) = COLOR_MAP_SIZE;
    let mut canvas = Canvas::new(width, height);

    let ocean = RadialGradient::new(
        [1024.0, 512.0],
        1024.0,
        Gradient::new([
            ColorStop::new(0.0, Rgba::hex(0x1a472a)),
            ColorStop::new(0.3, Rgba::hex(0x1e40af)),
            ColorStop::new(0.6, Rgba::hex(0x1d4ed8)),
            ColorStop::new(1.0, Rgba::hex(0x0f172a)),
        ]),
    );
    canvas.fill(&ocean.into());

    for _ in 0..DEPTH_BLOB_COUNT {
        let center = [
            rng.random::<f32>() * width as f32,
            rng.random::<f32>() * height as f32,
        ];
        let radius = rng.random_range(50.0..150.0);
        let blob = RadialGradient::new(
            center,
            radius,
            Gradient::new([
                ColorStop::new(0.0, Rgba::rgba(30, 64, 175, 0.3)),
                ColorStop::new(1.0, Rgba::rgba(15, 23, 42, 0.1)),
            ]),
        );
        canvas.fill_circle(center, radius, &blob.into());
    }

    for patch in &CONTINENTS {
        canvas.fill_ellipse(
            patch.center,
            patch.radii,
            patch.rotation,
            &Paint::Solid(Rgba::hex(patch.color)),
        );
    }

    canvas.finish(WrapMode::Repeat, WrapMode::Repeat)
}

/// Height map: flat `#8080ff` with brighter mountain ranges.
pub fn bump_map() -> RasterImage {
    let (width, height) = BUMP_MAP_SIZE;
    let mut canvas = Canvas::new(width, height);
    canvas.fill(&Rgba::hex(0x8080ff).into());

    for (center, radii, color) in MOUNTAIN_RANGES {
        canvas.fill_ellipse(center, radii, 0.0, &Rgba::hex(color).into());
    }

    canvas.finish(WrapMode::Repeat, WrapMode::Repeat)
}

/// Reflectivity map: matte land, grey water.
pub fn specular_map() -> RasterImage {
    let (width, height) = SPECULAR_MAP_SIZE;
    let mut canvas = Canvas::new(width, height);
    canvas.fill(&Rgba::BLACK.into());

    let water = Paint::Solid(Rgba::hex(0x808080));
    for (center, radii) in OCEAN_BASINS {
        canvas.fill_ellipse(center, radii, 0.0, &water);
    }

    canvas.finish(WrapMode::Repeat, WrapMode::Repeat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_continent_table_covers_every_terrain() {
        for terrain in [
            Terrain::Forest,
            Terrain::Desert,
            Terrain::Mountain,
            Terrain::Ice,
        ] {
            assert!(CONTINENTS.iter().any(|p| p.terrain == terrain));
        }
    }

    #[test]
    fn test_continents_inside_color_map() {
        let (w, h) = COLOR_MAP_SIZE;
        for patch in &CONTINENTS {
            assert!(patch.center[0] > 0.0 && patch.center[0] < w as f32, "{}", patch.name);
            assert!(patch.center[1] > 0.0 && patch.center[1] < h as f32, "{}", patch.name);
        }
    }

    #[test]
    fn test_color_map_land_colors() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let map = color_map(&mut rng);
        assert_eq!((map.width(), map.height()), COLOR_MAP_SIZE);
        // Greenland is painted last and nothing overlaps its center.
        assert_eq!(map.pixel(700, 180), Some([0xe2, 0xe8, 0xf0, 0xff]));
        // Andes on top of South America.
        assert_eq!(map.pixel(580, 650), Some([0x78, 0x71, 0x6c, 0xff]));
        assert_eq!(map.wrap(), (WrapMode::Repeat, WrapMode::Repeat));
    }

    #[test]
    fn test_color_map_is_opaque() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let map = color_map(&mut rng);
        assert!(map.as_bytes().chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_color_map_deterministic_per_seed() {
        let a = color_map(&mut ChaCha8Rng::seed_from_u64(3));
        let b = color_map(&mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_bump_map() {
        let map = bump_map();
        assert_eq!((map.width(), map.height()), BUMP_MAP_SIZE);
        assert_eq!(map.pixel(0, 0), Some([0x80, 0x80, 0xff, 0xff]));
        assert_eq!(map.pixel(675, 160), Some([0xff, 0xff, 0xff, 0xff]));
        assert_eq!(map.pixel(290, 325), Some([0xe0, 0xe0, 0xff, 0xff]));
    }

    #[test]
    fn test_specular_map() {
        let map = specular_map();
        assert_eq!((map.width(), map.height()), SPECULAR_MAP_SIZE);
        assert_eq!(map.pixel(1000, 500), Some([0, 0, 0, 0xff]));
        assert_eq!(map.pixel(256, 256), Some([0x80, 0x80, 0x80, 0xff]));
    }
}
