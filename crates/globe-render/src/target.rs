//! Multisampled color target resolved into the surface each frame.
//!
//! With a sample count of 1 the pass renders straight into the surface view
//! and no extra texture exists.

/// Multisample state for a pipeline drawing into a target with `sample_count`
/// samples.
pub fn multisample_state(sample_count: u32) -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: sample_count.max(1),
        mask: !0,
        alpha_to_coverage_enabled: false,
    }
}

struct MsaaTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct ColorTarget {
    msaa: Option<MsaaTexture>,
    format: wgpu::TextureFormat,
    sample_count: u32,
    size: (u32, u32),
}

impl ColorTarget {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let size = (width.max(1), height.max(1));
        let sample_count = sample_count.max(1);
        let msaa = (sample_count > 1).then(|| {
            let texture = device.create_texture(&Self::descriptor(format, size, sample_count));
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            MsaaTexture {
                _texture: texture,
                view,
            }
        });
        Self {
            msaa,
            format,
            sample_count,
            size,
        }
    }

    /// Descriptor of the multisampled texture for a clamped `size`.
    pub fn descriptor(
        format: wgpu::TextureFormat,
        size: (u32, u32),
        sample_count: u32,
    ) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some("globe-msaa-color"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        }
    }

    /// Reallocate after a surface resize; a no-op when the clamped size is
    /// unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.size != (width.max(1), height.max(1)) {
            *self = Self::new(device, self.format, width, height, self.sample_count);
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn is_multisampled(&self) -> bool {
        self.msaa.is_some()
    }

    /// Attachment that clears to `clear` and ends up in `surface_view`.
    ///
    /// Multisampled samples are resolved into the surface and discarded.
    pub fn attachment<'a>(
        &'a self,
        surface_view: &'a wgpu::TextureView,
        clear: wgpu::Color,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        let (view, resolve_target) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(surface_view)),
            None => (surface_view, None),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: store_op(self.sample_count),
            },
            depth_slice: None,
        }
    }
}

fn store_op(sample_count: u32) -> wgpu::StoreOp {
    if sample_count > 1 {
        wgpu::StoreOp::Discard
    } else {
        wgpu::StoreOp::Store
    }
}
