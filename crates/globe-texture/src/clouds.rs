//! Cloud coverage map: soft puff formations plus thin high-altitude wisps.

use rand::Rng;

use crate::canvas::Canvas;
use crate::color::Rgba;
use crate::gradient::{ColorStop, Gradient, RadialGradient};
use crate::raster::{RasterImage, WrapMode};

pub const CLOUD_MAP_SIZE: (u32, u32) = (2048, 1024);

/// Number of high-altitude streaks drawn after the formations.
pub const WISP_COUNT: usize = 30;

/// Weather system type of a formation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudKind {
    Tropical,
    Storm,
    Polar,
    Cumulus,
}

/// How a [`CloudKind`] turns into puffs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PuffParams {
    /// Puffs drawn per formation.
    pub count: usize,
    /// Formation size is divided by this to get the puff size.
    pub size_divisor: f32,
    /// Formation density is multiplied by this to get puff opacity.
    pub opacity_multiplier: f32,
}

impl CloudKind {
    pub fn params(self) -> PuffParams {
        let (count, size_divisor, opacity_multiplier) = match self {
            CloudKind::Tropical => (8, 4.0, 0.8),
            CloudKind::Storm => (12, 3.0, 0.9),
            CloudKind::Polar => (15, 5.0, 0.6),
            CloudKind::Cumulus => (5, 3.0, 0.7),
        };
        PuffParams {
            count,
            size_divisor,
            opacity_multiplier,
        }
    }
}

/// A cluster of puffs around a center point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudFormation {
    pub center: [f32; 2],
    pub size: f32,
    pub density: f32,
    pub kind: CloudKind,
}

impl CloudFormation {
    pub const fn new(x: f32, y: f32, size: f32, density: f32, kind: CloudKind) -> Self {
        Self {
            center: [x, y],
            size,
            density,
            kind,
        }
    }

    /// Peak opacity of each puff.
    pub fn opacity(&self) -> f32 {
        self.density * self.kind.params().opacity_multiplier
    }

    /// Nominal puff radius before jitter.
    pub fn puff_size(&self) -> f32 {
        self.size / self.kind.params().size_divisor
    }

    /// Paint this formation's puffs.
    pub fn paint(&self, canvas: &mut Canvas, rng: &mut impl Rng) {
        let params = self.kind.params();
        let opacity = self.opacity();
        let puff_size = self.puff_size();

        for _ in 0..params.count {
            let offset_x = (rng.random::<f32>() - 0.5) * self.size;
            let offset_y = (rng.random::<f32>() - 0.5) * self.size * 0.5;
            let radius = puff_size * (0.5 + rng.random::<f32>() * 0.5);
            let center = [self.center[0] + offset_x, self.center[1] + offset_y];

            let puff = RadialGradient::new(
                center,
                radius,
                Gradient::new([
                    ColorStop::new(0.0, Rgba::WHITE.with_alpha(opacity)),
                    ColorStop::new(0.6, Rgba::WHITE.with_alpha(opacity * 0.7)),
                    ColorStop::new(1.0, Rgba::WHITE.with_alpha(0.0)),
                ]),
            );
            canvas.fill_circle(center, radius, &puff.into());
        }
    }
}

/// Formations in paint order.
pub const FORMATIONS: [CloudFormation; 14] = [
    // Equatorial band
    CloudFormation::new(400.0, 450.0, 80.0, 0.9, CloudKind::Tropical),
    CloudFormation::new(600.0, 470.0, 100.0, 0.8, CloudKind::Tropical),
    CloudFormation::new(1200.0, 460.0, 120.0, 0.85, CloudKind::Tropical),
    CloudFormation::new(1500.0, 440.0, 90.0, 0.8, CloudKind::Tropical),
    CloudFormation::new(300.0, 300.0, 150.0, 0.95, CloudKind::Storm),
    CloudFormation::new(800.0, 350.0, 130.0, 0.9, CloudKind::Storm),
    CloudFormation::new(1400.0, 320.0, 140.0, 0.92, CloudKind::Storm),
    CloudFormation::new(1024.0, 150.0, 200.0, 0.7, CloudKind::Polar),
    CloudFormation::new(1024.0, 850.0, 250.0, 0.75, CloudKind::Polar),
    CloudFormation::new(200.0, 200.0, 60.0, 0.6, CloudKind::Cumulus),
    CloudFormation::new(500.0, 250.0, 70.0, 0.65, CloudKind::Cumulus),
    CloudFormation::new(900.0, 230.0, 55.0, 0.6, CloudKind::Cumulus),
    CloudFormation::new(1300.0, 280.0, 65.0, 0.62, CloudKind::Cumulus),
    CloudFormation::new(1700.0, 240.0, 58.0, 0.6, CloudKind::Cumulus),
];

/// Transparent map with every formation and [`WISP_COUNT`] wisps.
pub fn cloud_map(rng: &mut impl Rng) -> RasterImage {
    let (width, height) = CLOUD_MAP_SIZE;
    let mut canvas = Canvas::new(width, height);

    for formation in &FORMATIONS {
        formation.paint(&mut canvas, rng);
    }

    for _ in 0..WISP_COUNT {
        let x = rng.random::<f32>() * width as f32;
        let y = rng.random::<f32>() * height as f32;
        let length = rng.random_range(50.0..150.0);
        let opacity = rng.random_range(0.1..0.4);
        let line_width = rng.random_range(1.0..4.0);
        let drift = (rng.random::<f32>() - 0.5) * 20.0;

        canvas.stroke_line(
            [x, y],
            [x + length, y + drift],
            line_width,
            Rgba::WHITE.with_alpha(opacity),
        );
    }

    canvas.finish(WrapMode::Repeat, WrapMode::Repeat)
}
