//! Linear and radial color ramps.

use crate::color::Rgba;

/// A color at a normalized offset along a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Ordered color stops, sampled with premultiplied interpolation so that
/// fading toward transparent black does not darken the ramp.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Build a gradient. Stops are sorted by offset; ties keep insertion order.
    pub fn new(stops: impl IntoIterator<Item = ColorStop>) -> Self {
        let mut stops: Vec<ColorStop> = stops.into_iter().collect();
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { stops }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at `t`, clamped to the first and last stops.
    pub fn sample(&self, t: f32) -> Rgba {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Rgba::TRANSPARENT;
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                if span <= f32::EPSILON {
                    return b.color;
                }
                let f = (t - a.offset) / span;
                let pa = a.color.premultiplied();
                let pb = b.color.premultiplied();
                let mixed = std::array::from_fn(|i| pa[i] + (pb[i] - pa[i]) * f);
                return Rgba::from_premultiplied(mixed);
            }
        }
        last.color
    }
}

/// Gradient projected along the segment `start → end`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub ramp: Gradient,
}

impl LinearGradient {
    pub fn new(start: [f32; 2], end: [f32; 2], ramp: Gradient) -> Self {
        Self { start, end, ramp }
    }

    pub fn color_at(&self, x: f32, y: f32) -> Rgba {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f32::EPSILON {
            return self.ramp.sample(0.0);
        }
        let t = ((x - self.start[0]) * dx + (y - self.start[1]) * dy) / len_sq;
        self.ramp.sample(t)
    }
}

/// Concentric radial gradient from `center` out to `radius`.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    pub center: [f32; 2],
    pub radius: f32,
    pub ramp: Gradient,
}

impl RadialGradient {
    pub fn new(center: [f32; 2], radius: f32, ramp: Gradient) -> Self {
        Self {
            center,
            radius,
            ramp,
        }
    }

    pub fn color_at(&self, x: f32, y: f32) -> Rgba {
        if self.radius <= f32::EPSILON {
            return self.ramp.sample(1.0);
        }
        let d = ((x - self.center[0]).powi(2) + (y - self.center[1]).powi(2)).sqrt();
        self.ramp.sample(d / self.radius)
    }
}
