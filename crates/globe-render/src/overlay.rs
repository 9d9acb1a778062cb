//! Screen-space star overlay: instanced quads read from a storage buffer and
//! alpha-blended over the scene after every mesh.

use bytemuck::{Pod, Zeroable};
use globe_scene::{MAX_OVERLAY_SPRITES, OverlaySprite};
use wgpu::util::DeviceExt;

use crate::depth::DepthBuffer;
use crate::target::multisample_state;

pub const OVERLAY_SHADER_SOURCE: &str = include_str!("shaders/overlay.wgsl");

/// Surface size in physical pixels, padded to 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 4],
}

impl ViewportUniform {
    fn new((width, height): (u32, u32)) -> Self {
        Self {
            size: [width.max(1) as f32, height.max(1) as f32, 0.0, 0.0],
        }
    }
}

pub struct OverlayPipeline {
    pipeline: wgpu::RenderPipeline,
    sprites: wgpu::Buffer,
    viewport: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl OverlayPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay-shader"),
            source: wgpu::ShaderSource::Wgsl(OVERLAY_SHADER_SOURCE.into()),
        });

        let initial = vec![OverlaySprite::zeroed(); MAX_OVERLAY_SPRITES];
        let sprites = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay-sprites"),
            contents: bytemuck::cast_slice(&initial),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        let viewport = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay-viewport"),
            contents: bytemuck::bytes_of(&ViewportUniform::new((1, 1))),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay-bind-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: sprites.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: viewport.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay-pipeline-layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::pipeline_state(false, false)),
            multisample: multisample_state(sample_count),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        log::info!("Overlay pipeline ready ({MAX_OVERLAY_SPRITES} sprites, {sample_count}x)");

        Self {
            pipeline,
            sprites,
            viewport,
            bind_group,
        }
    }

    /// Upload this frame's sprites. Returns how many will be drawn.
    pub fn write(
        &self,
        queue: &wgpu::Queue,
        sprites: &[OverlaySprite],
        viewport: (u32, u32),
    ) -> u32 {
        let count = sprites.len().min(MAX_OVERLAY_SPRITES);
        if count < sprites.len() {
            log::warn!("Dropping {} overlay sprites", sprites.len() - count);
        }
        queue.write_buffer(
            &self.viewport,
            0,
            bytemuck::bytes_of(&ViewportUniform::new(viewport)),
        );
        if count > 0 {
            queue.write_buffer(&self.sprites, 0, bytemuck::cast_slice(&sprites[..count]));
        }
        count as u32
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, count: u32) {
        if count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..4, 0..count);
    }
}
