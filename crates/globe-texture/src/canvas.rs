//! A small 2D painter over an RGBA8 buffer.
//!
//! Every primitive composites source-over with analytic edge coverage, so
//! sub-pixel stars still leave a mark.

use image::RgbaImage;

use crate::color::Rgba;
use crate::gradient::{LinearGradient, RadialGradient};
use crate::raster::{RasterImage, WrapMode};

/// What a primitive is filled with.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

impl Paint {
    fn color_at(&self, x: f32, y: f32) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear(g) => g.color_at(x, y),
            Paint::Radial(g) => g.color_at(x, y),
        }
    }
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Paint::Solid(c)
    }
}

impl From<LinearGradient> for Paint {
    fn from(g: LinearGradient) -> Self {
        Paint::Linear(g)
    }
}

impl From<RadialGradient> for Paint {
    fn from(g: RadialGradient) -> Self {
        Paint::Radial(g)
    }
}

/// Mutable drawing target. Call [`Canvas::finish`] to freeze it.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// A fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Straight-alpha color of a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Rgba::from_rgba8(p.0))
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| p.0 = [0; 4]);
    }

    /// Paint the whole canvas.
    pub fn fill(&mut self, paint: &Paint) {
        self.fill_rect(0.0, 0.0, self.width() as f32, self.height() as f32, paint);
    }

    /// Fill an axis-aligned rectangle with fractional edge coverage.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, x1) = (x, x + w);
        let (y0, y1) = (y, y + h);
        let Some((px0, px1, py0, py1)) = self.clip_bounds(x0, x1, y0, y1) else {
            return;
        };

        for py in py0..py1 {
            let cov_y = overlap(py as f32, y0, y1);
            for px in px0..px1 {
                let coverage = overlap(px as f32, x0, x1) * cov_y;
                let color = paint.color_at(px as f32 + 0.5, py as f32 + 0.5);
                self.blend(px, py, color, coverage);
            }
        }
    }

    /// Fill an ellipse with radii `(rx, ry)` rotated by `rotation` radians.
    pub fn fill_ellipse(
        &mut self,
        center: [f32; 2],
        radii: [f32; 2],
        rotation: f32,
        paint: &Paint,
    ) {
        let [cx, cy] = center;
        let [rx, ry] = radii;
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let reach = rx.max(ry) + 1.0;
        let Some((px0, px1, py0, py1)) =
            self.clip_bounds(cx - reach, cx + reach, cy - reach, cy + reach)
        else {
            return;
        };
        let (sin, cos) = rotation.sin_cos();

        for py in py0..py1 {
            for px in px0..px1 {
                let sx = px as f32 + 0.5;
                let sy = py as f32 + 0.5;
                let dx = sx - cx;
                let dy = sy - cy;
                // Into the ellipse's own frame.
                let lx = dx * cos + dy * sin;
                let ly = -dx * sin + dy * cos;

                let coverage = ellipse_coverage(lx, ly, rx, ry);
                if coverage > 0.0 {
                    self.blend(px, py, paint.color_at(sx, sy), coverage);
                }
            }
        }
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, center: [f32; 2], radius: f32, paint: &Paint) {
        self.fill_ellipse(center, [radius, radius], 0.0, paint);
    }

    /// Stroke a straight segment with round caps.
    pub fn stroke_line(&mut self, from: [f32; 2], to: [f32; 2], width: f32, color: Rgba) {
        let half = width * 0.5;
        if half <= 0.0 {
            return;
        }
        let Some((px0, px1, py0, py1)) = self.clip_bounds(
            from[0].min(to[0]) - half - 1.0,
            from[0].max(to[0]) + half + 1.0,
            from[1].min(to[1]) - half - 1.0,
            from[1].max(to[1]) + half + 1.0,
        ) else {
            return;
        };

        for py in py0..py1 {
            for px in px0..px1 {
                let d = distance_to_segment([px as f32 + 0.5, py as f32 + 0.5], from, to);
                let coverage = (half - d + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    /// Freeze the canvas into an immutable raster.
    pub fn finish(self, wrap_u: WrapMode, wrap_v: WrapMode) -> RasterImage {
        RasterImage::from_image(self.image, wrap_u, wrap_v)
    }

    /// Pixel index ranges covering `[x0, x1) × [y0, y1)`, clipped to the canvas.
    fn clip_bounds(&self, x0: f32, x1: f32, y0: f32, y1: f32) -> Option<(u32, u32, u32, u32)> {
        let w = self.width() as f32;
        let h = self.height() as f32;
        let px0 = x0.floor().clamp(0.0, w) as u32;
        let px1 = x1.ceil().clamp(0.0, w) as u32;
        let py0 = y0.floor().clamp(0.0, h) as u32;
        let py1 = y1.ceil().clamp(0.0, h) as u32;
        (px0 < px1 && py0 < py1).then_some((px0, px1, py0, py1))
    }

    /// Source-over composite of `src` scaled by `coverage`.
    fn blend(&mut self, x: u32, y: u32, src: Rgba, coverage: f32) {
        let sa = src.a * coverage;
        if sa <= 0.0 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x, y);
        let dst = Rgba::from_rgba8(pixel.0);

        let out_a = sa + dst.a * (1.0 - sa);
        if out_a <= f32::EPSILON {
            return;
        }
        let mix = |s: f32, d: f32| (s * sa + d * dst.a * (1.0 - sa)) / out_a;
        let out = Rgba::new(
            mix(src.r, dst.r),
            mix(src.g, dst.g),
            mix(src.b, dst.b),
            out_a,
        );
        pixel.0 = out.to_rgba8();
    }
}

/// Length of `[p, p + 1] ∩ [lo, hi]`.
fn overlap(p: f32, lo: f32, hi: f32) -> f32 {
    ((p + 1.0).min(hi) - p.max(lo)).clamp(0.0, 1.0)
}

/// Approximate area coverage of a pixel centered at local `(lx, ly)`.
///
/// Uses the first-order distance to the boundary of the implicit
/// `(lx/rx)² + (ly/ry)² = 1`.
fn ellipse_coverage(lx: f32, ly: f32, rx: f32, ry: f32) -> f32 {
    let nx = lx / rx;
    let ny = ly / ry;
    let nd = (nx * nx + ny * ny).sqrt();
    if nd <= f32::EPSILON {
        return (rx.min(ry) + 0.5).clamp(0.0, 1.0);
    }
    let grad = ((nx / rx).powi(2) + (ny / ry).powi(2)).sqrt() / nd;
    let dist = (1.0 - nd) / grad;
    (dist + 0.5).clamp(0.0, 1.0)
}

fn distance_to_segment(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len_sq).clamp(0.0, 1.0)
    };
    let cx = a[0] + ab[0] * t - p[0];
    let cy = a[1] + ab[1] * t - p[1];
    (cx * cx + cy * cy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{ColorStop, Gradient};

    fn opaque(c: Option<Rgba>) -> bool {
        c.is_some_and(|c| c.a > 0.99)
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = Canvas::new(8, 8);
        assert_eq!(canvas.pixel(3, 3), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_fill_covers_everything() {
        let mut canvas = Canvas::new(16, 8);
        canvas.fill(&Rgba::hex(0x8080ff).into());
        let raster = canvas.finish(WrapMode::Repeat, WrapMode::Repeat);
        assert!(
            raster
                .as_bytes()
                .chunks_exact(4)
                .all(|p| p == [0x80, 0x80, 0xff, 0xff])
        );
    }

    #[test]
    fn test_rect_partial_coverage() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(0.0, 0.0, 1.5, 4.0, &Rgba::WHITE.into());
        assert!(opaque(canvas.pixel(0, 0)));
        let half = canvas.pixel(1, 0).unwrap();
        assert!((half.a - 0.5).abs() < 0.01);
        assert_eq!(canvas.pixel(2, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_rect_is_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(-10.0, 2.0, 100.0, 100.0, &Rgba::WHITE.into());
        assert_eq!(canvas.pixel(0, 1), Some(Rgba::TRANSPARENT));
        assert!(opaque(canvas.pixel(3, 3)));
    }

    #[test]
    fn test_ellipse_interior_and_exterior() {
        let mut canvas = Canvas::new(64, 64);
        canvas.fill_ellipse([32.0, 32.0], [20.0, 5.0], 0.0, &Rgba::WHITE.into());
        assert!(opaque(canvas.pixel(32, 32)));
        assert!(opaque(canvas.pixel(45, 32)));
        assert_eq!(canvas.pixel(32, 45), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_rotated_ellipse_follows_rotation() {
        let mut canvas = Canvas::new(64, 64);
        canvas.fill_ellipse(
            [32.0, 32.0],
            [20.0, 3.0],
            std::f32::consts::FRAC_PI_2,
            &Rgba::WHITE.into(),
        );
        assert!(opaque(canvas.pixel(31, 47)));
        assert_eq!(canvas.pixel(47, 31), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_tiny_circle_leaves_a_mark() {
        let mut canvas = Canvas::new(8, 8);
        canvas.fill_circle([4.5, 4.5], 0.5, &Rgba::WHITE.into());
        assert!(canvas.pixel(4, 4).unwrap().a > 0.3);
    }

    #[test]
    fn test_source_over_blends_alpha() {
        let mut canvas = Canvas::new(2, 2);
        canvas.fill(&Rgba::BLACK.into());
        canvas.fill(&Rgba::WHITE.with_alpha(0.5).into());
        let c = canvas.pixel(0, 0).unwrap();
        assert!((c.r - 0.5).abs() < 0.01);
        assert!((c.a - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_radial_paint_fades_out() {
        let mut canvas = Canvas::new(64, 64);
        let gradient = RadialGradient::new(
            [32.0, 32.0],
            30.0,
            Gradient::new([
                ColorStop::new(0.0, Rgba::WHITE),
                ColorStop::new(1.0, Rgba::WHITE.with_alpha(0.0)),
            ]),
        );
        canvas.fill_circle([32.0, 32.0], 30.0, &gradient.into());
        let center = canvas.pixel(32, 32).unwrap().a;
        let edge = canvas.pixel(58, 32).unwrap().a;
        assert!(center > 0.9);
        assert!(edge < 0.2);
    }

    #[test]
    fn test_round_capped_stroke() {
        let mut canvas = Canvas::new(32, 16);
        canvas.stroke_line([4.0, 8.0], [24.0, 8.0], 4.0, Rgba::WHITE);
        assert!(opaque(canvas.pixel(14, 7)));
        // Round cap extends past the endpoint by half the width.
        assert!(canvas.pixel(25, 7).unwrap().a > 0.5);
        assert_eq!(canvas.pixel(14, 1), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_clear_resets() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill(&Rgba::WHITE.into());
        canvas.clear();
        assert_eq!(canvas.pixel(2, 2), Some(Rgba::TRANSPARENT));
    }
}
