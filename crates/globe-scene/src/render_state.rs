use crate::camera::Camera;
use crate::overlay::StarOverlay;
use crate::scene::Scene;

/// Everything a frame reads: the scene, its camera, the star overlay and
/// the clock.
///
/// Owned by the frame loop, mutated in its update step and lent immutably
/// to the renderer.
#[derive(Debug)]
pub struct RenderState {
    pub scene: Scene,
    pub camera: Camera,
    /// Drawn over the scene; empty when disabled.
    pub overlay: StarOverlay,
    /// Seconds since the loop started.
    pub elapsed: f32,
    /// Frames drawn so far.
    pub frame: u64,
}

impl RenderState {
    pub fn new(scene: Scene, camera: Camera) -> Self {
        Self {
            scene,
            camera,
            overlay: StarOverlay::default(),
            elapsed: 0.0,
            frame: 0,
        }
    }

    pub fn with_overlay(mut self, overlay: StarOverlay) -> Self {
        self.overlay = overlay;
        self
    }
}
