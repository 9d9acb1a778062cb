//! Raster images to sampled GPU textures.
//!
//! Every level of the mip chain is filtered on the CPU by
//! [`RasterImage::half_size`] and written with `write_texture`; the sampler
//! follows the raster's wrap modes.

use globe_texture::{RasterImage, WrapMode};

/// How the texel values are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureRole {
    /// Albedo-like data authored in sRGB.
    Color,
    /// Normals, specular strength and other linear data.
    Data,
}

impl TextureRole {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureRole::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureRole::Data => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// An uploaded raster with its view and sampler.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("raster {name} is empty ({width}x{height})")]
    ZeroDimensions {
        name: String,
        width: u32,
        height: u32,
    },

    #[error("raster {name} holds {actual} bytes, {width}x{height} RGBA8 needs {expected}")]
    DataSizeMismatch {
        name: String,
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

/// Levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Sampler address mode for a raster wrap mode.
pub fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn check_raster(name: &str, image: &RasterImage) -> Result<(), TextureError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions {
            name: name.to_string(),
            width,
            height,
        });
    }
    let expected = width as usize * height as usize * 4;
    let actual = image.as_bytes().len();
    if actual != expected {
        return Err(TextureError::DataSizeMismatch {
            name: name.to_string(),
            actual,
            expected,
            width,
            height,
        });
    }
    Ok(())
}

fn write_level(queue: &wgpu::Queue, texture: &wgpu::Texture, level: u32, image: &RasterImage) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_bytes(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.bytes_per_row()),
            rows_per_image: Some(image.height()),
        },
        wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        },
    );
}

/// Upload `image` and its mip chain with a trilinear sampler.
pub fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    name: &str,
    image: &RasterImage,
    role: TextureRole,
) -> Result<GpuTexture, TextureError> {
    check_raster(name, image)?;
    let (width, height) = (image.width(), image.height());
    let format = role.format();
    let mip_levels = mip_level_count(width, height);

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(name),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: mip_levels,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    write_level(queue, &texture, 0, image);
    let mut level = 1;
    let mut next = image.half_size();
    while let Some(smaller) = next {
        write_level(queue, &texture, level, &smaller);
        next = smaller.half_size();
        level += 1;
    }

    let (wrap_u, wrap_v) = image.wrap();
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{name}-sampler")),
        address_mode_u: address_mode(wrap_u),
        address_mode_v: address_mode(wrap_v),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    log::debug!("Texture {name}: {width}x{height}, {level} levels, {format:?}");

    Ok(GpuTexture {
        texture,
        view,
        sampler,
        dimensions: (width, height),
        format,
        mip_level_count: mip_levels,
    })
}

/// Headless device for GPU tests, or `None` on machines without an adapter.
#[cfg(test)]
pub(crate) fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .ok()?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("globe-test-device"),
        ..Default::default()
    }))
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use globe_texture::Canvas;

    fn raster(width: u32, height: u32, wrap_v: WrapMode) -> RasterImage {
        Canvas::new(width, height).finish(WrapMode::Repeat, wrap_v)
    }

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(4, 2), 3);
        assert_eq!(mip_level_count(64, 32), 7);
        assert_eq!(mip_level_count(1024, 512), 11);
        assert_eq!(mip_level_count(2048, 1024), 12);
    }

    #[test]
    fn test_mip_count_matches_half_size_chain() {
        let mut levels = 1;
        let mut next = raster(16, 4, WrapMode::ClampToEdge).half_size();
        while let Some(level) = next {
            levels += 1;
            next = level.half_size();
        }
        assert_eq!(levels, mip_level_count(16, 4));
    }

    #[test]
    fn test_roles_pick_srgb_for_color_only() {
        assert_eq!(TextureRole::Color.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(TextureRole::Data.format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn test_wrap_modes_map_to_address_modes() {
        assert_eq!(address_mode(WrapMode::Repeat), wgpu::AddressMode::Repeat);
        assert_eq!(
            address_mode(WrapMode::ClampToEdge),
            wgpu::AddressMode::ClampToEdge
        );
    }

    #[test]
    fn test_check_raster_accepts_canvas_output() {
        assert!(check_raster("galaxy", &raster(8, 4, WrapMode::Repeat)).is_ok());
    }

    #[test]
    fn test_upload_builds_full_mip_chain() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let image = raster(64, 32, WrapMode::ClampToEdge);

        let tex = upload_texture(&device, &queue, "galaxy", &image, TextureRole::Color).unwrap();

        assert_eq!(tex.dimensions, (64, 32));
        assert_eq!(tex.mip_level_count, 7);
        assert_eq!(tex.format, wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn test_upload_single_texel_data_texture() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let image = raster(1, 1, WrapMode::Repeat);

        let tex = upload_texture(&device, &queue, "specular", &image, TextureRole::Data).unwrap();

        assert_eq!(tex.mip_level_count, 1);
        assert_eq!(tex.format, wgpu::TextureFormat::Rgba8Unorm);
    }
}
