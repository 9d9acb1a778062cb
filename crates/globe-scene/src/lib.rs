//! Scene description for the contact globe.
//!
//! Meshes, materials, shader uniforms, lights, the camera and the
//! screen-space star overlay. Nothing here touches the GPU; `globe-render`
//! consumes these types.

mod camera;
mod geometry;
mod lighting;
mod material;
mod mesh;
mod overlay;
mod render_state;
mod scene;
mod shader;

pub use camera::{Camera, CameraUniform};
pub use geometry::{SphereGeometry, Vertex};
pub use lighting::{
    DirectionalLightUniform, Light, LightKind, LightRig, LightsUniform, MAX_DIRECTIONAL_LIGHTS,
};
pub use material::{
    Blending, LambertMaterial, PhongMaterial, ShaderMaterial, Side, SurfaceMaterial,
};
pub use mesh::{Mesh, MeshKind};
pub use overlay::{
    MAX_OVERLAY_SPRITES, OverlaySprite, SHOOTING_FADE, SHOOTING_STARS, SHOOTING_TRAVEL,
    STAR_LAYERS, STARS_PER_LAYER, ShootingStar, SpriteShape, StarOverlay, Streak,
    TWINKLE_MIN_OPACITY, TWINKLE_PEAK_SCALE, Twinkle, TwinkleStar, ease_in_out,
};
pub use render_state::RenderState;
pub use scene::{
    ATMOSPHERE_RADIUS, BACKGROUND_RADIUS, CLOUD_RADIUS, PLANET_RADIUS, Scene, SceneBuilder,
    SceneError,
};
pub use shader::{
    AtmosphereUniforms, AtmosphereUniformsGpu, GalaxyUniforms, GalaxyUniformsGpu, ShaderProgram,
    hex_rgb, srgb_to_linear,
};
