//! Render pipelines derived from surface materials, and the uniform buffers
//! they bind.
//!
//! Group 0 is shared by every pipeline and holds the camera and the lights.
//! Group 1 is per mesh: the [`MeshUniform`] at binding 0, then the program
//! uniform (if the family has one), then the textures and one sampler.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use globe_scene::{
    Blending, Camera, CameraUniform, LightRig, LightsUniform, Mesh, Side, SurfaceMaterial,
};
use wgpu::util::DeviceExt;

use crate::buffer::vertex_layout;
use crate::depth::DepthBuffer;
use crate::shader::ShaderFamily;
use crate::target::multisample_state;

/// Per-mesh uniform, 80 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
    /// Material scalars. Phong: normal scale xy, shininess. Lambert:
    /// opacity, alpha test. Unused by the custom programs.
    pub params: [f32; 4],
}

impl MeshUniform {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let params = match &mesh.material {
            SurfaceMaterial::Phong(p) => [p.normal_scale.x, p.normal_scale.y, p.shininess, 0.0],
            SurfaceMaterial::Lambert(l) => [l.opacity, l.alpha_test, 0.0, 0.0],
            SurfaceMaterial::Shader(_) => [0.0; 4],
        };
        Self {
            model: mesh.model_matrix().to_cols_array_2d(),
            params,
        }
    }
}

/// Camera and light buffers with their bind group (group 0).
pub struct FrameBindings {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bind-group-layout"),
            entries: &[
                uniform_entry(0, std::mem::size_of::<CameraUniform>()),
                uniform_entry(1, std::mem::size_of::<LightsUniform>()),
            ],
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-uniform"),
            contents: bytemuck::bytes_of(&CameraUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights-uniform"),
            contents: bytemuck::bytes_of(&LightsUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            layout,
            bind_group,
            camera_buffer,
            lights_buffer,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, camera: &Camera, lights: &LightRig) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera.to_uniform()));
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(&lights.to_uniform()));
    }
}

fn uniform_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

/// Size of the program uniform for families that have one.
pub fn program_uniform_size(family: ShaderFamily) -> usize {
    match family {
        ShaderFamily::Atmosphere => std::mem::size_of::<globe_scene::AtmosphereUniformsGpu>(),
        ShaderFamily::Galaxy => std::mem::size_of::<globe_scene::GalaxyUniformsGpu>(),
        ShaderFamily::Phong | ShaderFamily::Lambert => 0,
    }
}

/// Group 1 layout entries for `family`, in binding order.
pub fn material_layout_entries(family: ShaderFamily) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = vec![uniform_entry(0, std::mem::size_of::<MeshUniform>())];
    if family.has_program_uniform() {
        entries.push(uniform_entry(1, program_uniform_size(family)));
    }

    let roles = family.texture_roles();
    for _ in roles {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: entries.len() as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
    }
    if !roles.is_empty() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: entries.len() as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

/// Faces to discard for a material side.
pub fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

pub fn blend_state(blending: Blending) -> Option<wgpu::BlendState> {
    match blending {
        Blending::Opaque => None,
        Blending::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        Blending::Additive => {
            let additive = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: additive,
                alpha: additive,
            })
        }
    }
}

/// Depth state honoring the material's write and test flags.
pub fn depth_state(material: &SurfaceMaterial) -> wgpu::DepthStencilState {
    let depth_test = match material {
        SurfaceMaterial::Shader(s) => s.depth_test,
        _ => true,
    };
    DepthBuffer::pipeline_state(material.depth_write(), depth_test)
}

/// A pipeline plus the group 1 layout its bind groups are built against.
pub struct MaterialPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub material_layout: wgpu::BindGroupLayout,
    pub family: ShaderFamily,
}

impl MaterialPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        frame_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
        material: &SurfaceMaterial,
    ) -> Self {
        let family = ShaderFamily::for_material(material);
        let name = family.name();

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{name}-bind-group-layout")),
            entries: &material_layout_entries(family),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{name}-pipeline-layout")),
            bind_group_layouts: &[frame_layout, &material_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{name}-pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: cull_mode(material.side()),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth_state(material)),
            multisample: multisample_state(sample_count),
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: blend_state(material.blending()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            material_layout,
            family,
        }
    }
}
