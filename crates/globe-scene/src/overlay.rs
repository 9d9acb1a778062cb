//! Screen-space star field drawn over the scene: three layers of twinkling
//! points and a few shooting stars.
//!
//! Positions are fractions of the viewport and sizes are logical pixels.
//! Timing follows CSS keyframe rules: a star holds still until its delay has
//! passed, then repeats its cycle forever.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;

pub const STAR_LAYERS: usize = 3;
pub const STARS_PER_LAYER: usize = 50;
pub const SHOOTING_STARS: usize = 3;
/// Every twinkling star, plus a head and a trail per shooting star.
pub const MAX_OVERLAY_SPRITES: usize = STAR_LAYERS * STARS_PER_LAYER + 2 * SHOOTING_STARS;

/// Opacity at both ends of a twinkle cycle; the peak is 1.
pub const TWINKLE_MIN_OPACITY: f32 = 0.3;
/// Scale at the peak of a twinkle.
pub const TWINKLE_PEAK_SCALE: f32 = 1.2;
const STAR_GLOW: f32 = 4.0;

/// Distance a shooting star covers in one pass, logical pixels, +y down.
pub const SHOOTING_TRAVEL: Vec2 = Vec2::new(300.0, 150.0);
/// Fraction of a pass spent fading in, and the same fading out.
pub const SHOOTING_FADE: f32 = 0.1;
const SHOOTING_HEAD: f32 = 2.0;
const SHOOTING_GLOW: f32 = 6.0;
const SHOOTING_TRAIL: Vec2 = Vec2::new(50.0, 1.0);

/// CSS `ease-in-out`: `cubic-bezier(0.42, 0, 0.58, 1)`.
pub fn ease_in_out(u: f32) -> f32 {
    let u = u.clamp(0.0, 1.0);
    let bezier = |s: f32, p1: f32, p2: f32| {
        let r = 1.0 - s;
        3.0 * r * r * s * p1 + 3.0 * r * s * s * p2 + s * s * s
    };
    let slope = |s: f32| {
        let r = 1.0 - s;
        3.0 * r * r * 0.42 + 6.0 * r * s * (0.58 - 0.42) + 3.0 * s * s * (1.0 - 0.58)
    };
    // Solve x(s) = u by Newton; x is strictly increasing on [0, 1].
    let mut s = u;
    for _ in 0..8 {
        s = (s - (bezier(s, 0.42, 0.58) - u) / slope(s)).clamp(0.0, 1.0);
    }
    bezier(s, 0.0, 1.0)
}

/// Sprite shapes understood by the overlay shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SpriteShape {
    /// Round core with a soft halo.
    Glow = 0,
    /// Horizontal streak fading toward +x.
    Trail = 1,
}

/// One overlay quad, laid out for a storage buffer (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OverlaySprite {
    /// Physical pixels from the top-left corner.
    pub center: [f32; 2],
    /// Half width and half height in physical pixels.
    pub half_extent: [f32; 2],
    /// Straight-alpha color.
    pub color: [f32; 4],
    /// x = [`SpriteShape`], y = core radius in pixels, zw unused.
    pub shape: [f32; 4],
}

impl OverlaySprite {
    fn glow(center: Vec2, core: f32, halo: f32, opacity: f32) -> Self {
        let extent = core + halo;
        Self {
            center: center.to_array(),
            half_extent: [extent, extent],
            color: [1.0, 1.0, 1.0, opacity],
            shape: [SpriteShape::Glow as u32 as f32, core, 0.0, 0.0],
        }
    }

    fn trail(center: Vec2, half_extent: Vec2, opacity: f32) -> Self {
        Self {
            center: center.to_array(),
            half_extent: half_extent.to_array(),
            color: [1.0, 1.0, 1.0, opacity],
            shape: [SpriteShape::Trail as u32 as f32, 0.0, 0.0, 0.0],
        }
    }
}

/// Opacity and scale of a twinkling star at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Twinkle {
    pub opacity: f32,
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwinkleStar {
    /// Fraction of the viewport, each axis in `[0, 1)`.
    pub position: Vec2,
    /// Diameter in logical pixels, `[1, 4)`.
    pub size: f32,
    /// Seconds per cycle, `[2, 5)`.
    pub period: f32,
    /// Seconds before the first cycle, `[0, 2)`.
    pub delay: f32,
    /// Opacity shown until the delay has passed, `[0.3, 1)`.
    pub resting_opacity: f32,
}

impl TwinkleStar {
    fn generate(rng: &mut impl Rng) -> Self {
        let position = Vec2::new(rng.random::<f32>(), rng.random::<f32>());
        let size = rng.random_range(1.0..4.0);
        let period = rng.random_range(2.0..5.0);
        let delay = rng.random_range(0.0..2.0);
        let resting_opacity = rng.random_range(TWINKLE_MIN_OPACITY..1.0);
        Self {
            position,
            size,
            period,
            delay,
            resting_opacity,
        }
    }

    /// Dim at the ends of a cycle, brightest and largest halfway through.
    pub fn twinkle_at(&self, t: f32) -> Twinkle {
        if t < self.delay {
            return Twinkle {
                opacity: self.resting_opacity,
                scale: 1.0,
            };
        }
        let phase = ((t - self.delay) / self.period).fract();
        let rise = if phase < 0.5 {
            phase * 2.0
        } else {
            (1.0 - phase) * 2.0
        };
        let k = ease_in_out(rise);
        Twinkle {
            opacity: TWINKLE_MIN_OPACITY + (1.0 - TWINKLE_MIN_OPACITY) * k,
            scale: 1.0 + (TWINKLE_PEAK_SCALE - 1.0) * k,
        }
    }
}

/// Position and opacity of a shooting star at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Streak {
    /// Logical pixels travelled from the start point.
    pub offset: Vec2,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShootingStar {
    /// Fraction of the viewport: x in `[0, 1)`, y in `[0, 0.5)`.
    pub start: Vec2,
    /// Seconds per pass, `[2, 5)`.
    pub duration: f32,
    /// Seconds before the first pass, `[0, 10)`.
    pub delay: f32,
}

impl ShootingStar {
    fn generate(rng: &mut impl Rng) -> Self {
        let start = Vec2::new(rng.random::<f32>(), rng.random::<f32>() * 0.5);
        let duration = rng.random_range(2.0..5.0);
        let delay = rng.random_range(0.0..10.0);
        Self {
            start,
            duration,
            delay,
        }
    }

    /// Linear travel along [`SHOOTING_TRAVEL`], fading at both ends.
    /// `None` while invisible.
    pub fn streak_at(&self, t: f32) -> Option<Streak> {
        if t < self.delay {
            return None;
        }
        let phase = ((t - self.delay) / self.duration).fract();
        let opacity = if phase < SHOOTING_FADE {
            phase / SHOOTING_FADE
        } else if phase > 1.0 - SHOOTING_FADE {
            (1.0 - phase) / SHOOTING_FADE
        } else {
            1.0
        };
        (opacity > 0.0).then_some(Streak {
            offset: SHOOTING_TRAVEL * phase,
            opacity,
        })
    }
}

/// The whole overlay and its clock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StarOverlay {
    layers: Vec<Vec<TwinkleStar>>,
    shooting: Vec<ShootingStar>,
    time: f32,
}

impl StarOverlay {
    pub fn generate(rng: &mut impl Rng) -> Self {
        let layers = (0..STAR_LAYERS)
            .map(|_| (0..STARS_PER_LAYER).map(|_| TwinkleStar::generate(rng)).collect())
            .collect();
        let shooting = (0..SHOOTING_STARS)
            .map(|_| ShootingStar::generate(rng))
            .collect();
        Self {
            layers,
            shooting,
            time: 0.0,
        }
    }

    pub fn from_parts(layers: Vec<Vec<TwinkleStar>>, shooting: Vec<ShootingStar>) -> Self {
        Self {
            layers,
            shooting,
            time: 0.0,
        }
    }

    pub fn layers(&self) -> &[Vec<TwinkleStar>] {
        &self.layers
    }

    pub fn shooting_stars(&self) -> &[ShootingStar] {
        &self.shooting
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty) && self.shooting.is_empty()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance the overlay clock, in seconds since the loop started.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Quads for the current time in a `viewport` of physical pixels.
    /// `pixel_ratio` converts logical sizes to physical ones.
    pub fn sprites(&self, viewport: (u32, u32), pixel_ratio: f32) -> Vec<OverlaySprite> {
        let (width, height) = viewport;
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let size = Vec2::new(width as f32, height as f32);
        let t = self.time;

        let mut sprites = Vec::with_capacity(MAX_OVERLAY_SPRITES);
        for star in self.layers.iter().flatten() {
            let twinkle = star.twinkle_at(t);
            sprites.push(OverlaySprite::glow(
                star.position * size,
                star.size * 0.5 * twinkle.scale * pixel_ratio,
                STAR_GLOW * pixel_ratio,
                twinkle.opacity,
            ));
        }
        for star in &self.shooting {
            let Some(streak) = star.streak_at(t) else {
                continue;
            };
            let top_left = star.start * size + streak.offset * pixel_ratio;
            let head = top_left + Vec2::splat(SHOOTING_HEAD * 0.5 * pixel_ratio);
            sprites.push(OverlaySprite::glow(
                head,
                SHOOTING_HEAD * 0.5 * pixel_ratio,
                SHOOTING_GLOW * pixel_ratio,
                streak.opacity,
            ));
            let half_trail = (SHOOTING_TRAIL * 0.5 * pixel_ratio).max(Vec2::splat(0.5));
            sprites.push(OverlaySprite::trail(
                top_left + half_trail,
                half_trail,
                streak.opacity,
            ));
        }
        sprites
    }
}
