//! wgpu rendering for the contact globe: device and surface management,
//! texture upload, material pipelines, multisampled targets and the per-frame
//! scene and star overlay draw.

pub mod buffer;
pub mod depth;
pub mod gpu;
pub mod overlay;
pub mod pipeline;
pub mod renderer;
pub mod shader;
pub mod target;
pub mod texture;

pub use buffer::{MeshBuffer, vertex_layout};
pub use depth::DepthBuffer;
pub use gpu::{
    RenderContext, RenderContextError, SurfaceError, init_render_context_blocking,
    pick_sample_count,
};
pub use overlay::{OVERLAY_SHADER_SOURCE, OverlayPipeline};
pub use pipeline::{FrameBindings, MaterialPipeline, MeshUniform};
pub use renderer::{CLEAR_COLOR, GpuRenderer, RenderError, SceneRenderer};
pub use shader::{ShaderFamily, ShaderLibrary};
pub use target::{ColorTarget, multisample_state};
pub use texture::{
    GpuTexture, TextureError, TextureRole, address_mode, mip_level_count, upload_texture,
};
