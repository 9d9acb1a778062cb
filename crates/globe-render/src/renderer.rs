//! The scene renderer: per-mesh GPU resources and the frame draw.

use std::collections::HashMap;
use std::sync::Arc;

use globe_scene::{Mesh, MeshKind, RenderState};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::buffer::MeshBuffer;
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
use crate::overlay::OverlayPipeline;
use crate::pipeline::{FrameBindings, MaterialPipeline, MeshUniform};
use crate::shader::{ShaderFamily, ShaderLibrary};
use crate::target::ColorTarget;
use crate::texture::{GpuTexture, TextureError, upload_texture};

/// Background color behind the galaxy sphere.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("{0:?} mesh is already uploaded")]
    AlreadyUploaded(MeshKind),

    #[error("{0:?} material samples {1} textures, expected {2}")]
    TextureCount(MeshKind, usize, usize),

    #[error("renderer has been disposed")]
    Disposed,
}

/// What the lifecycle needs from a renderer.
pub trait SceneRenderer {
    /// Reconfigure the surface and render targets for a new size.
    fn resize(&mut self, width: u32, height: u32);

    /// Create the GPU resources for one mesh.
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<(), RenderError>;

    /// Draw every uploaded mesh in [`MeshKind::DRAW_ORDER`], then the star
    /// overlay.
    fn draw(&mut self, state: &RenderState) -> Result<(), RenderError>;

    /// Release one mesh's resources. Returns whether any existed.
    fn release_mesh(&mut self, kind: MeshKind) -> bool;

    /// Release the surface and device. Later draws fail with
    /// [`RenderError::Disposed`].
    fn dispose(&mut self);
}

/// GPU resources of one uploaded mesh.
struct GpuMesh {
    buffer: MeshBuffer,
    pipeline: MaterialPipeline,
    mesh_uniform: wgpu::Buffer,
    program_uniform: Option<wgpu::Buffer>,
    bind_group: wgpu::BindGroup,
    textures: Vec<GpuTexture>,
}

/// Everything tied to the device; dropped as a unit on dispose.
struct GpuState {
    context: RenderContext,
    color: ColorTarget,
    depth: DepthBuffer,
    frame: FrameBindings,
    shaders: ShaderLibrary,
    overlay: OverlayPipeline,
}

/// wgpu-backed [`SceneRenderer`].
pub struct GpuRenderer {
    gpu: Option<GpuState>,
    meshes: HashMap<MeshKind, GpuMesh>,
    /// Physical pixels per logical pixel, for overlay sizes.
    pixel_ratio: f32,
}

impl GpuRenderer {
    pub fn new(context: RenderContext) -> Self {
        let (width, height) = context.size();
        let device = &context.device;
        let samples = context.sample_count;
        let color = ColorTarget::new(device, context.surface_format, width, height, samples);
        let depth = DepthBuffer::new(device, width, height, samples);
        let frame = FrameBindings::new(device);
        let overlay = OverlayPipeline::new(device, context.surface_format, samples);

        Self {
            gpu: Some(GpuState {
                context,
                color,
                depth,
                frame,
                shaders: ShaderLibrary::new(),
                overlay,
            }),
            meshes: HashMap::new(),
            pixel_ratio: 1.0,
        }
    }

    /// Create the device and surface for `window` and wrap them.
    pub fn from_window(
        window: Arc<Window>,
        vsync: bool,
        msaa_samples: u32,
    ) -> Result<Self, RenderContextError> {
        let pixel_ratio = window.scale_factor() as f32;
        init_render_context_blocking(window, vsync, msaa_samples)
            .map(|context| Self::new(context).with_pixel_ratio(pixel_ratio))
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio.max(f32::EPSILON);
        self
    }

    /// MSAA samples per pixel, or `None` once disposed.
    pub fn sample_count(&self) -> Option<u32> {
        self.gpu.as_ref().map(|gpu| gpu.context.sample_count)
    }

    /// Surface size, or `None` once disposed.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.gpu.as_ref().map(|gpu| gpu.context.size())
    }

    pub fn is_uploaded(&self, kind: MeshKind) -> bool {
        self.meshes.contains_key(&kind)
    }
}

impl SceneRenderer for GpuRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        gpu.context.resize(width, height);
        let (width, height) = gpu.context.size();
        gpu.color.resize(&gpu.context.device, width, height);
        gpu.depth.resize(&gpu.context.device, width, height);
        log::debug!("Renderer resized to {width}x{height}");
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<(), RenderError> {
        let gpu = self.gpu.as_mut().ok_or(RenderError::Disposed)?;
        if self.meshes.contains_key(&mesh.kind) {
            return Err(RenderError::AlreadyUploaded(mesh.kind));
        }

        let device = &gpu.context.device;
        let label = mesh.kind.label();
        let family = ShaderFamily::for_material(&mesh.material);

        let rasters = mesh.material.textures();
        let roles = family.texture_roles();
        if rasters.len() != roles.len() {
            return Err(RenderError::TextureCount(
                mesh.kind,
                rasters.len(),
                roles.len(),
            ));
        }
        let textures = rasters
            .iter()
            .zip(roles)
            .enumerate()
            .map(|(i, (image, role))| {
                upload_texture(
                    device,
                    &gpu.context.queue,
                    &format!("{label}-texture-{i}"),
                    image,
                    *role,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let module = gpu.shaders.get_or_load(device, family);
        let pipeline = MaterialPipeline::new(
            device,
            &module,
            &gpu.frame.layout,
            gpu.context.surface_format,
            gpu.context.sample_count,
            &mesh.material,
        );

        let mesh_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-mesh-uniform")),
            contents: bytemuck::bytes_of(&MeshUniform::from_mesh(mesh)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let program_uniform = mesh.material.program().map(|program| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-program-uniform")),
                contents: &program.uniform_bytes(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: mesh_uniform.as_entire_binding(),
        }];
        if let Some(buffer) = &program_uniform {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: buffer.as_entire_binding(),
            });
        }
        for texture in &textures {
            entries.push(wgpu::BindGroupEntry {
                binding: entries.len() as u32,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }
        // All textures of a material share wrap modes; the first sampler serves them all.
        if let Some(first) = textures.first() {
            entries.push(wgpu::BindGroupEntry {
                binding: entries.len() as u32,
                resource: wgpu::BindingResource::Sampler(&first.sampler),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout: &pipeline.material_layout,
            entries: &entries,
        });

        let buffer = MeshBuffer::from_geometry(device, label, &mesh.geometry);
        log::info!(
            "Uploaded {label}: {} vertices, {} indices, {} textures ({})",
            buffer.vertex_count,
            buffer.index_count,
            textures.len(),
            family.name()
        );

        self.meshes.insert(
            mesh.kind,
            GpuMesh {
                buffer,
                pipeline,
                mesh_uniform,
                program_uniform,
                bind_group,
                textures,
            },
        );
        Ok(())
    }

    fn draw(&mut self, state: &RenderState) -> Result<(), RenderError> {
        let gpu = self.gpu.as_ref().ok_or(RenderError::Disposed)?;
        let queue = &gpu.context.queue;

        let output = match gpu.context.get_current_texture() {
            Ok(output) => output,
            Err(SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame {}", state.frame);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.frame.write(queue, &state.camera, state.scene.lights());
        for (kind, gpu_mesh) in &self.meshes {
            let Some(mesh) = state.scene.mesh(*kind) else {
                continue;
            };
            queue.write_buffer(
                &gpu_mesh.mesh_uniform,
                0,
                bytemuck::bytes_of(&MeshUniform::from_mesh(mesh)),
            );
            if let (Some(buffer), Some(program)) =
                (&gpu_mesh.program_uniform, mesh.material.program())
            {
                queue.write_buffer(buffer, 0, &program.uniform_bytes());
            }
        }
        let viewport = gpu.context.size();
        let sprites = state.overlay.sprites(viewport, self.pixel_ratio);
        let overlay_count = gpu.overlay.write(queue, &sprites, viewport);

        let mut encoder = gpu
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-pass"),
                color_attachments: &[Some(gpu.color.attachment(&view, CLEAR_COLOR))],
                depth_stencil_attachment: Some(gpu.depth.attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_bind_group(0, &gpu.frame.bind_group, &[]);
            for kind in MeshKind::DRAW_ORDER {
                let Some(gpu_mesh) = self.meshes.get(&kind) else {
                    continue;
                };
                if state.scene.mesh(kind).is_none() {
                    continue;
                }
                pass.set_pipeline(&gpu_mesh.pipeline.pipeline);
                pass.set_bind_group(1, &gpu_mesh.bind_group, &[]);
                gpu_mesh.buffer.bind(&mut pass);
                gpu_mesh.buffer.draw(&mut pass);
            }
            gpu.overlay.draw(&mut pass, overlay_count);
        }

        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn release_mesh(&mut self, kind: MeshKind) -> bool {
        match self.meshes.remove(&kind) {
            Some(gpu_mesh) => {
                log::debug!(
                    "Released {} ({} textures)",
                    kind.label(),
                    gpu_mesh.textures.len()
                );
                true
            }
            None => false,
        }
    }

    fn dispose(&mut self) {
        if self.gpu.take().is_some() {
            log::info!("Renderer disposed");
        }
    }
}
