//! Galaxy backdrop: deep-space gradient, galactic band, nebulae, stars,
//! clusters and dust lanes.

use rand::Rng;

use crate::canvas::{Canvas, Paint};
use crate::color::Rgba;
use crate::gradient::{ColorStop, Gradient, LinearGradient, RadialGradient};
use crate::raster::{RasterImage, WrapMode};

pub const GALAXY_MAP_SIZE: (u32, u32) = (2048, 1024);

pub const STAR_COUNT: usize = 5000;
pub const CLUSTER_COUNT: usize = 15;
pub const STARS_PER_CLUSTER: usize = 30;
pub const DUST_LANE_COUNT: usize = 20;

/// Stars brighter than this get a halo.
pub const GLOW_THRESHOLD: f32 = 0.5;

/// Spectral class of a field star, picked from a weighted roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StarClass {
    White,
    Yellow,
    Blue,
    Red,
}

impl StarClass {
    pub const ALL: [StarClass; 4] = [
        StarClass::White,
        StarClass::Yellow,
        StarClass::Blue,
        StarClass::Red,
    ];

    /// Map a uniform roll in `[0, 1)` to a class: 50% white, 20% yellow,
    /// 15% blue, 15% red.
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.5 {
            StarClass::White
        } else if roll < 0.7 {
            StarClass::Yellow
        } else if roll < 0.85 {
            StarClass::Blue
        } else {
            StarClass::Red
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            StarClass::White => (255, 255, 255),
            StarClass::Yellow => (255, 220, 180),
            StarClass::Blue => (180, 200, 255),
            StarClass::Red => (255, 180, 120),
        }
    }

    /// Brightness is scaled by this to get the star's alpha.
    pub fn alpha_scale(self) -> f32 {
        match self {
            StarClass::White => 0.9,
            StarClass::Yellow => 0.8,
            StarClass::Blue => 0.7,
            StarClass::Red => 0.6,
        }
    }

    fn color(self, alpha: f32) -> Rgba {
        let (r, g, b) = self.rgb();
        Rgba::rgba(r, g, b, alpha)
    }
}

/// One field star.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub position: [f32; 2],
    pub brightness: f32,
    pub radius: f32,
    pub class: StarClass,
}

impl Star {
    pub fn alpha(&self) -> f32 {
        self.brightness * self.class.alpha_scale()
    }

    pub fn has_glow(&self) -> bool {
        self.brightness > GLOW_THRESHOLD
    }
}

/// Per-class counts of the field stars painted into a galaxy map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GalaxyStats {
    pub white: usize,
    pub yellow: usize,
    pub blue: usize,
    pub red: usize,
    pub glowing: usize,
}

impl GalaxyStats {
    pub fn from_stars(stars: &[Star]) -> Self {
        let mut stats = Self::default();
        for star in stars {
            match star.class {
                StarClass::White => stats.white += 1,
                StarClass::Yellow => stats.yellow += 1,
                StarClass::Blue => stats.blue += 1,
                StarClass::Red => stats.red += 1,
            }
            if star.has_glow() {
                stats.glowing += 1;
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.white + self.yellow + self.blue + self.red
    }

    pub fn count(&self, class: StarClass) -> usize {
        match class {
            StarClass::White => self.white,
            StarClass::Yellow => self.yellow,
            StarClass::Blue => self.blue,
            StarClass::Red => self.red,
        }
    }
}

/// A soft colored cloud: `(center, base color, radius)`.
pub const NEBULAE: [([f32; 2], Rgba, f32); 8] = [
    ([300.0, 200.0], Rgba::rgba(236, 72, 153, 0.4), 150.0),
    ([1200.0, 300.0], Rgba::rgba(59, 130, 246, 0.35), 200.0),
    ([1600.0, 600.0], Rgba::rgba(34, 197, 94, 0.3), 180.0),
    ([500.0, 700.0], Rgba::rgba(251, 191, 36, 0.4), 160.0),
    ([1800.0, 150.0], Rgba::rgba(147, 51, 234, 0.4), 140.0),
    ([100.0, 500.0], Rgba::rgba(239, 68, 68, 0.3), 120.0),
    ([800.0, 800.0], Rgba::rgba(99, 102, 241, 0.35), 170.0),
    ([1400.0, 800.0], Rgba::rgba(245, 101, 101, 0.3), 130.0),
];

/// Rows covered by the galactic band.
const BAND_TOP: f32 = 300.0;
const BAND_HEIGHT: f32 = 424.0;

/// Roll `count` field stars over a `width × height` area.
pub fn generate_stars(rng: &mut impl Rng, count: usize, width: u32, height: u32) -> Vec<Star> {
    (0..count)
        .map(|_| {
            let position = [
                rng.random::<f32>() * width as f32,
                rng.random::<f32>() * height as f32,
            ];
            let brightness = rng.random::<f32>();
            let radius = rng.random_range(0.5..3.5);
            let class = StarClass::from_roll(rng.random::<f32>());
            Star {
                position,
                brightness,
                radius,
                class,
            }
        })
        .collect()
}

/// Paint the full galaxy map, returning it with the field star statistics.
pub fn galaxy_map(rng: &mut impl Rng) -> (RasterImage, GalaxyStats) {
    let (width, height) = GALAXY_MAP_SIZE;
    let mut canvas = Canvas::new(width, height);

    paint_deep_space(&mut canvas);
    paint_band(&mut canvas);
    paint_nebulae(&mut canvas);

    let stars = generate_stars(rng, STAR_COUNT, width, height);
    for star in &stars {
        paint_star(&mut canvas, star);
    }
    let stats = GalaxyStats::from_stars(&stars);

    paint_clusters(&mut canvas, rng);
    paint_dust(&mut canvas, rng);

    log::debug!(
        "Galaxy map: {} stars ({} glowing), {} clusters",
        stats.total(),
        stats.glowing,
        CLUSTER_COUNT
    );

    (canvas.finish(WrapMode::Repeat, WrapMode::ClampToEdge), stats)
}

fn paint_deep_space(canvas: &mut Canvas) {
    let space = RadialGradient::new(
        [1024.0, 512.0],
        1024.0,
        Gradient::new([
            ColorStop::new(0.0, Rgba::hex(0x1a1a3a)),
            ColorStop::new(0.3, Rgba::hex(0x2a1b4e)),
            ColorStop::new(0.6, Rgba::hex(0x2a3a6e)),
            ColorStop::new(0.8, Rgba::hex(0x1a2a4a)),
            ColorStop::new(1.0, Rgba::hex(0x0a0a1a)),
        ]),
    );
    canvas.fill(&space.into());
}

fn paint_band(canvas: &mut Canvas) {
    let band = LinearGradient::new(
        [0.0, BAND_TOP],
        [0.0, BAND_TOP + BAND_HEIGHT],
        Gradient::new([
            ColorStop::new(0.0, Rgba::rgba(139, 92, 246, 0.2)),
            ColorStop::new(0.2, Rgba::rgba(168, 85, 247, 0.4)),
            ColorStop::new(0.4, Rgba::rgba(217, 119, 6, 0.6)),
            ColorStop::new(0.6, Rgba::rgba(251, 191, 36, 0.5)),
            ColorStop::new(0.8, Rgba::rgba(168, 85, 247, 0.4)),
            ColorStop::new(1.0, Rgba::rgba(139, 92, 246, 0.2)),
        ]),
    );
    let width = canvas.width() as f32;
    canvas.fill_rect(0.0, BAND_TOP, width, BAND_HEIGHT, &band.into());
}

fn paint_nebulae(canvas: &mut Canvas) {
    for (center, color, radius) in NEBULAE {
        let cloud = RadialGradient::new(
            center,
            radius,
            Gradient::new([
                ColorStop::new(0.0, color),
                ColorStop::new(0.4, color.with_alpha(0.15)),
                ColorStop::new(0.8, color.with_alpha(0.05)),
                ColorStop::new(1.0, Rgba::TRANSPARENT),
            ]),
        );
        canvas.fill_circle(center, radius, &cloud.into());
    }
}

fn paint_star(canvas: &mut Canvas, star: &Star) {
    canvas.fill_circle(
        star.position,
        star.radius,
        &star.class.color(star.alpha()).into(),
    );

    if star.has_glow() {
        let glow_radius = star.radius * 4.0;
        let glow = RadialGradient::new(
            star.position,
            glow_radius,
            Gradient::new([
                ColorStop::new(0.0, star.class.color(0.4)),
                ColorStop::new(0.5, star.class.color(0.2)),
                ColorStop::new(1.0, Rgba::TRANSPARENT),
            ]),
        );
        canvas.fill_circle(star.position, glow_radius, &glow.into());
    }
}

fn paint_clusters(canvas: &mut Canvas, rng: &mut impl Rng) {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;

    for _ in 0..CLUSTER_COUNT {
        let cx = rng.random::<f32>() * width;
        let cy = rng.random::<f32>() * height;
        let cluster_radius = rng.random_range(60.0..160.0);

        for _ in 0..STARS_PER_CLUSTER {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let distance = rng.random::<f32>() * cluster_radius;
            let x = cx + angle.cos() * distance;
            let y = cy + angle.sin() * distance;
            if !(0.0..width).contains(&x) || !(0.0..height).contains(&y) {
                continue;
            }
            let alpha = rng.random_range(0.4..1.2);
            let radius = rng.random_range(0.5..2.5);
            canvas.fill_circle([x, y], radius, &Rgba::WHITE.with_alpha(alpha).into());
        }
    }
}

fn paint_dust(canvas: &mut Canvas, rng: &mut impl Rng) {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    let dust = Paint::Solid(Rgba::rgba(50, 50, 100, 0.3));

    for _ in 0..DUST_LANE_COUNT {
        let x = rng.random::<f32>() * width;
        let y = rng.random::<f32>() * height;
        let w = rng.random_range(100.0..300.0);
        let h = rng.random_range(5.0..25.0);
        canvas.fill_rect(x, y, w, h, &dust);
    }
}
