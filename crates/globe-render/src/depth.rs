//! Reverse-Z depth target shared by every scene pipeline.
//!
//! Near maps to 1.0 and far to 0.0: the buffer clears to 0.0 and a fragment
//! passes when its depth is `GreaterEqual` to the stored value.

pub struct DepthBuffer {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    size: (u32, u32),
    sample_count: u32,
}

impl DepthBuffer {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const CLEAR_VALUE: f32 = 0.0;
    pub const COMPARE_FUNCTION: wgpu::CompareFunction = wgpu::CompareFunction::GreaterEqual;

    /// Allocate a depth target. Zero extents become 1; `sample_count` must
    /// match the color target it is paired with.
    pub fn new(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> Self {
        let size = (width.max(1), height.max(1));
        let sample_count = sample_count.max(1);
        let texture = device.create_texture(&Self::descriptor(size, sample_count));
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
            sample_count,
        }
    }

    pub fn descriptor(size: (u32, u32), sample_count: u32) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some("globe-depth"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        }
    }

    /// Reallocate for a new surface size; keeps the texture when the clamped
    /// size is unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.size != (width.max(1), height.max(1)) {
            *self = Self::new(device, width, height, self.sample_count);
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Pass attachment that clears to the far plane.
    pub fn attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(Self::CLEAR_VALUE),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    /// Pipeline depth state. Without `depth_test` every fragment passes.
    pub fn pipeline_state(depth_write: bool, depth_test: bool) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: Self::FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: if depth_test {
                Self::COMPARE_FUNCTION
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;

    #[test]
    fn test_pipeline_state_flags() {
        let opaque = DepthBuffer::pipeline_state(true, true);
        assert!(opaque.depth_write_enabled);
        assert_eq!(opaque.depth_compare, wgpu::CompareFunction::GreaterEqual);
        assert_eq!(opaque.format, wgpu::TextureFormat::Depth32Float);

        let overlay = DepthBuffer::pipeline_state(false, false);
        assert!(!overlay.depth_write_enabled);
        assert_eq!(overlay.depth_compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn test_resize_tracks_clamped_size() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut depth = DepthBuffer::new(&device, 0, 0, 4);
        assert_eq!(depth.size(), (1, 1));

        depth.resize(&device, 1920, 1080);
        assert_eq!(depth.size(), (1920, 1080));
        depth.resize(&device, 0, 5);
        assert_eq!(depth.size(), (1, 5));
        assert_eq!(depth.sample_count(), 4);
    }

    #[test]
    fn test_attachment_clears_to_far_plane() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let depth = DepthBuffer::new(&device, 4, 4, 1);
        let ops = depth.attachment().depth_ops.unwrap();
        assert!(matches!(ops.load, wgpu::LoadOp::Clear(v) if v == 0.0));
        assert!(depth.attachment().stencil_ops.is_none());
    }
}
