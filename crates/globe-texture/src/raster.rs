//! Finished RGBA8 rasters and their PNG export.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::{self, FilterType};

/// How texture coordinates outside `[0, 1]` are resolved along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// Errors that can occur while exporting a raster.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// A fixed-size RGBA8 image with straight alpha.
///
/// Produced once by a [`Canvas`](crate::Canvas) and never modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
    wrap_u: WrapMode,
    wrap_v: WrapMode,
}

impl RasterImage {
    pub(crate) fn from_image(pixels: RgbaImage, wrap_u: WrapMode, wrap_v: WrapMode) -> Self {
        Self {
            pixels,
            wrap_u,
            wrap_v,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Wrap modes along U (horizontal) and V (vertical).
    pub fn wrap(&self) -> (WrapMode, WrapMode) {
        (self.wrap_u, self.wrap_v)
    }

    /// RGBA bytes of the pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Row-major RGBA8 bytes, ready for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Bytes per row of [`as_bytes`](Self::as_bytes).
    pub fn bytes_per_row(&self) -> u32 {
        self.width() * 4
    }

    /// Half-size copy for the next mip level, or `None` once the raster is 1x1.
    ///
    /// Odd extents round down; neither side drops below one texel.
    pub fn half_size(&self) -> Option<RasterImage> {
        if self.width() <= 1 && self.height() <= 1 {
            return None;
        }
        let width = (self.width() / 2).max(1);
        let height = (self.height() / 2).max(1);
        let pixels = imageops::resize(&self.pixels, width, height, FilterType::Triangle);
        Some(Self::from_image(pixels, self.wrap_u, self.wrap_v))
    }

    /// Encode the raster as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> Result<(), RasterError> {
        self.pixels
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| RasterError::Encode {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RasterImage {
        let img = RgbaImage::from_fn(4, 2, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        RasterImage::from_image(img, WrapMode::Repeat, WrapMode::ClampToEdge)
    }

    #[test]
    fn test_dimensions_and_layout() {
        let raster = checker();
        assert_eq!(raster.width(), 4);
        assert_eq!(raster.height(), 2);
        assert_eq!(raster.bytes_per_row(), 16);
        assert_eq!(raster.as_bytes().len(), 32);
        assert_eq!(raster.wrap(), (WrapMode::Repeat, WrapMode::ClampToEdge));
    }

    #[test]
    fn test_pixel_lookup_is_bounds_checked() {
        let raster = checker();
        assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(4, 0), None);
    }

    #[test]
    fn test_half_size_chain_ends_at_one_texel() {
        let mut sizes = vec![(checker().width(), checker().height())];
        let mut level = checker();
        while let Some(next) = level.half_size() {
            sizes.push((next.width(), next.height()));
            assert_eq!(next.wrap(), level.wrap());
            level = next;
        }
        assert_eq!(sizes, vec![(4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_half_size_averages_checker_to_grey() {
        let half = checker().half_size().unwrap();
        let [r, g, b, a] = half.pixel(0, 0).unwrap();
        assert!((100..=155).contains(&r), "{r}");
        assert_eq!((r, g), (g, b));
        assert_eq!(a, 255);
    }

    #[test]
    fn test_save_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let raster = checker();
        raster.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 2));
        assert_eq!(loaded.as_raw().as_slice(), raster.as_bytes());
    }

    #[test]
    fn test_save_png_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("x.png");
        let err = checker().save_png(&path).unwrap_err();
        assert!(matches!(err, RasterError::Encode { .. }));
    }
}
