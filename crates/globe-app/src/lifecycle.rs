//! Mount and unmount of the globe component.
//!
//! Everything the globe owns is created in [`GlobeComponent::mount`] and
//! released in [`GlobeComponent::unmount`]. Unmount is guarded step by step,
//! so it is safe to call twice or after a mount that failed halfway.

use std::rc::Rc;

use glam::Vec3;
use globe_config::SceneConfig;
use globe_render::{RenderContextError, RenderError, SceneRenderer};
use globe_scene::{
    Camera, LightRig, MeshKind, RenderState, Scene, SceneBuilder, SceneError, StarOverlay,
};
use globe_texture::TextureSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::frame_loop::{Clock, FrameLoop, LoopError, LoopState, SystemClock};
use crate::host::{AnimationHandle, Host, ListenerId};

/// Produces the texture set from a seeded generator.
pub type TextureSource = fn(&mut ChaCha8Rng) -> TextureSet;

fn synthesize_textures(rng: &mut ChaCha8Rng) -> TextureSet {
    TextureSet::synthesize(rng)
}

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("globe is already mounted")]
    AlreadyMounted,

    #[error("failed to create render context: {0}")]
    Context(#[from] RenderContextError),

    #[error("failed to upload mesh: {0}")]
    Upload(#[from] RenderError),

    #[error("failed to build scene: {0}")]
    Scene(#[from] SceneError),

    #[error("failed to start render loop: {0}")]
    Loop(#[from] LoopError),
}

/// Scene parameters fixed at mount.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobeSettings {
    /// `None` draws a fresh seed on every mount.
    pub seed: Option<u64>,
    pub planet_segments: u32,
    pub background_segments: u32,
    pub camera_distance: f32,
    pub fov_degrees: f32,
    pub star_overlay: bool,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self::from(&SceneConfig::default())
    }
}

impl From<&SceneConfig> for GlobeSettings {
    fn from(scene: &SceneConfig) -> Self {
        Self {
            seed: scene.seed,
            planet_segments: scene.planet_segments,
            background_segments: scene.background_segments,
            camera_distance: scene.camera_distance,
            fov_degrees: scene.fov_degrees,
            star_overlay: scene.star_overlay,
        }
    }
}

/// The configured seed, or a random one.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::rng().random())
}

/// The procedural globe as a mountable component.
pub struct GlobeComponent {
    settings: GlobeSettings,
    clock: Rc<dyn Clock>,
    textures: TextureSource,
    renderer: Option<Box<dyn SceneRenderer>>,
    frame_loop: Option<FrameLoop>,
    resize_listener: Option<ListenerId>,
    /// Meshes whose GPU resources exist, in upload order.
    uploaded: Vec<MeshKind>,
}

impl GlobeComponent {
    pub fn new(settings: GlobeSettings) -> Self {
        Self {
            settings,
            clock: Rc::new(SystemClock::new()),
            textures: synthesize_textures,
            renderer: None,
            frame_loop: None,
            resize_listener: None,
            uploaded: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_texture_source(mut self, textures: TextureSource) -> Self {
        self.textures = textures;
        self
    }

    pub fn settings(&self) -> &GlobeSettings {
        &self.settings
    }

    pub fn is_mounted(&self) -> bool {
        self.renderer.is_some() || self.frame_loop.is_some()
    }

    pub fn render_state(&self) -> Option<&RenderState> {
        self.frame_loop.as_ref().map(FrameLoop::render_state)
    }

    pub fn loop_state(&self) -> Option<LoopState> {
        self.frame_loop.as_ref().map(FrameLoop::state)
    }

    /// Build the scene, upload it and start the loop.
    ///
    /// `factory` receives the host's surface size and returns the renderer.
    /// On failure everything created so far is torn down before returning.
    pub fn mount<F>(&mut self, host: &mut dyn Host, factory: F) -> Result<(), MountError>
    where
        F: FnOnce((u32, u32)) -> Result<Box<dyn SceneRenderer>, MountError>,
    {
        if self.is_mounted() {
            return Err(MountError::AlreadyMounted);
        }
        if let Err(e) = self.try_mount(host, factory) {
            warn!("Mount failed, tearing down: {e}");
            self.unmount(host);
            return Err(e);
        }
        Ok(())
    }

    fn try_mount<F>(&mut self, host: &mut dyn Host, factory: F) -> Result<(), MountError>
    where
        F: FnOnce((u32, u32)) -> Result<Box<dyn SceneRenderer>, MountError>,
    {
        let (width, height) = host.surface_size();
        let renderer = self.renderer.insert(factory((width, height))?);

        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        let eye = Vec3::new(0.0, 0.0, self.settings.camera_distance);
        let camera = Camera::new(eye, self.settings.fov_degrees, aspect);

        let seed = resolve_seed(self.settings.seed);
        info!(seed, "Synthesizing textures");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let textures = (self.textures)(&mut rng);

        let builder = SceneBuilder {
            planet_segments: self.settings.planet_segments,
            background_segments: self.settings.background_segments,
            eye,
        };
        let mut scene = Scene::new();
        scene.add(builder.background(textures.galaxy))?;
        scene.add(builder.planet(textures.color, textures.bump, textures.specular))?;
        scene.add(builder.clouds(textures.clouds))?;
        scene.add(builder.atmosphere())?;
        scene.set_lights(LightRig::contact_page());

        for mesh in scene.meshes() {
            renderer.upload_mesh(mesh)?;
            self.uploaded.push(mesh.kind);
        }

        let mut state = RenderState::new(scene, camera);
        if self.settings.star_overlay {
            state = state.with_overlay(StarOverlay::generate(&mut rng));
        }
        let frame_loop = self
            .frame_loop
            .insert(FrameLoop::new(state, Rc::clone(&self.clock)));
        frame_loop.start(host)?;

        self.resize_listener = Some(host.add_resize_listener());
        info!(
            "Globe mounted at {width}x{height} with {} meshes",
            self.uploaded.len()
        );
        Ok(())
    }

    /// Stop the loop and release everything. Never fails; repeat calls do
    /// nothing.
    pub fn unmount(&mut self, host: &mut dyn Host) {
        if !self.is_mounted() && self.resize_listener.is_none() && self.uploaded.is_empty() {
            return;
        }

        let mut frame_loop = self.frame_loop.take();
        if let Some(frame_loop) = frame_loop.as_mut() {
            frame_loop.stop(host);
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.dispose();
        }
        if let Some(id) = self.resize_listener.take() {
            host.remove_resize_listener(id);
        }
        for kind in self.uploaded.drain(..) {
            let released = self
                .renderer
                .as_mut()
                .is_some_and(|renderer| renderer.release_mesh(kind));
            if !released {
                debug!("{} had no GPU resources to release", kind.label());
            }
        }
        self.renderer = None;
        drop(frame_loop);
        info!("Globe unmounted");
    }

    /// Deliver a scheduled frame. Returns whether it ran.
    pub fn on_frame(
        &mut self,
        handle: AnimationHandle,
        host: &mut dyn Host,
    ) -> Result<bool, LoopError> {
        let (Some(frame_loop), Some(renderer)) = (self.frame_loop.as_mut(), self.renderer.as_mut())
        else {
            return Ok(false);
        };
        frame_loop.on_frame(handle, host, &mut **renderer)
    }

    /// Match the camera and surface to a new size. Skipped when unmounted.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        let (Some(frame_loop), Some(renderer)) = (self.frame_loop.as_mut(), self.renderer.as_mut())
        else {
            debug!("Resize to {width}x{height} skipped, globe not mounted");
            return;
        };
        frame_loop
            .render_state_mut()
            .camera
            .set_aspect_ratio(width as f32, height as f32);
        renderer.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_loop::{CLOUD_SPIN, PLANET_SPIN};
    use crate::test_support::{ManualClock, MockRenderer, RecordingHost, RendererLog, cached_textures};
    use globe_scene::{SHOOTING_STARS, STAR_LAYERS, STARS_PER_LAYER};
    use std::cell::RefCell;

    fn component(clock: Rc<ManualClock>) -> GlobeComponent {
        GlobeComponent::new(GlobeSettings {
            seed: Some(7),
            planet_segments: 8,
            background_segments: 8,
            ..GlobeSettings::default()
        })
        .with_clock(clock)
        .with_texture_source(cached_textures)
    }

    fn mock_factory(
        log: &Rc<RefCell<RendererLog>>,
    ) -> impl FnOnce((u32, u32)) -> Result<Box<dyn SceneRenderer>, MountError> + use<> {
        let log = Rc::clone(log);
        move |_| Ok(Box::new(MockRenderer::new(log)) as Box<dyn SceneRenderer>)
    }

    fn new_log() -> Rc<RefCell<RendererLog>> {
        Rc::new(RefCell::new(RendererLog::default()))
    }

    #[test]
    fn test_settings_from_scene_config() {
        let settings = GlobeSettings::default();
        assert_eq!(settings.seed, None);
        assert_eq!(settings.planet_segments, 128);
        assert_eq!(settings.background_segments, 64);
        assert_eq!(settings.camera_distance, 12.0);
        assert_eq!(settings.fov_degrees, 75.0);
        assert!(settings.star_overlay);
    }

    #[test]
    fn test_resolve_seed_keeps_configured_value() {
        assert_eq!(resolve_seed(Some(42)), 42);
    }

    #[test]
    fn test_mount_builds_four_meshes_in_order() {
        let mut host = RecordingHost::new(1280, 720);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));

        globe.mount(&mut host, mock_factory(&log)).unwrap();

        assert!(globe.is_mounted());
        assert_eq!(globe.loop_state(), Some(LoopState::Running));
        assert_eq!(log.borrow().uploaded, MeshKind::DRAW_ORDER.to_vec());
        assert_eq!(host.outstanding(), 1);
        assert_eq!(host.listeners.len(), 1);

        let state = globe.render_state().unwrap();
        assert!((state.camera.aspect_ratio - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(state.camera.position, Vec3::new(0.0, 0.0, 12.0));
        assert_eq!(state.scene.lights().lights().len(), 4);
    }

    #[test]
    fn test_mount_seeds_star_overlay() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));
        globe.mount(&mut host, mock_factory(&log)).unwrap();
        let first = globe.render_state().unwrap().overlay.clone();
        globe.unmount(&mut host);
        globe.mount(&mut host, mock_factory(&log)).unwrap();

        let overlay = &globe.render_state().unwrap().overlay;
        assert_eq!(overlay.layers().len(), STAR_LAYERS);
        assert!(overlay.layers().iter().all(|l| l.len() == STARS_PER_LAYER));
        assert_eq!(overlay.shooting_stars().len(), SHOOTING_STARS);
        assert_eq!(*overlay, first);
    }

    #[test]
    fn test_star_overlay_can_be_disabled() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = GlobeComponent::new(GlobeSettings {
            seed: Some(7),
            planet_segments: 8,
            background_segments: 8,
            star_overlay: false,
            ..GlobeSettings::default()
        })
        .with_clock(Rc::new(ManualClock::default()))
        .with_texture_source(cached_textures);

        globe.mount(&mut host, mock_factory(&log)).unwrap();

        assert!(globe.render_state().unwrap().overlay.is_empty());
    }

    #[test]
    fn test_mount_twice_is_rejected() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));

        globe.mount(&mut host, mock_factory(&log)).unwrap();
        let again = globe.mount(&mut host, mock_factory(&log));

        assert!(matches!(again, Err(MountError::AlreadyMounted)));
        assert!(globe.is_mounted());
        assert_eq!(log.borrow().uploaded.len(), 4);
    }

    #[test]
    fn test_mount_frames_unmount_end_to_end() {
        let clock = Rc::new(ManualClock::default());
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::clone(&clock));
        globe.mount(&mut host, mock_factory(&log)).unwrap();

        for i in 1..=3 {
            clock.set(i as f32 / 60.0);
            let handle = host.deliver().unwrap();
            assert!(globe.on_frame(handle, &mut host).unwrap());
        }
        globe.unmount(&mut host);

        let log = log.borrow();
        assert_eq!(log.draws, 3);
        for window in log.drawn_rotations.windows(2) {
            for ((kind, before), (_, after)) in window[0].iter().zip(&window[1]) {
                let expected = match kind {
                    MeshKind::Planet => PLANET_SPIN,
                    MeshKind::Clouds => CLOUD_SPIN,
                    _ => 0.0,
                };
                assert!((after - before - expected).abs() < 1e-6, "{kind:?}");
            }
        }

        let mut released = log.released.clone();
        released.sort();
        assert_eq!(released, MeshKind::DRAW_ORDER.to_vec());
        assert_eq!(log.disposed, 1);
        assert_eq!(host.outstanding(), 0);
        assert!(host.listeners.is_empty());
        assert!(!globe.is_mounted());
    }

    #[test]
    fn test_unmount_order() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));
        globe.mount(&mut host, mock_factory(&log)).unwrap();
        log.borrow_mut().calls.clear();

        globe.unmount(&mut host);

        assert_eq!(host.cancelled, 1);
        assert_eq!(host.listeners_removed, 1);
        assert_eq!(
            log.borrow().calls,
            vec![
                "dispose",
                "release:Background",
                "release:Planet",
                "release:Clouds",
                "release:Atmosphere",
            ]
        );
    }

    #[test]
    fn test_unmount_is_idempotent() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));

        // Before any mount.
        globe.unmount(&mut host);

        globe.mount(&mut host, mock_factory(&log)).unwrap();
        globe.unmount(&mut host);
        globe.unmount(&mut host);

        let log = log.borrow();
        assert_eq!(log.disposed, 1);
        assert_eq!(log.released.len(), 4);
        assert_eq!(host.cancelled, 1);
        assert_eq!(host.listeners_removed, 1);
    }

    #[test]
    fn test_no_leaked_handles_over_cycles() {
        let clock = Rc::new(ManualClock::default());
        let mut host = RecordingHost::new(640, 480);
        let mut globe = component(Rc::clone(&clock));

        for cycle in 0..10 {
            let log = new_log();
            globe.mount(&mut host, mock_factory(&log)).unwrap();
            for frame in 0..cycle {
                clock.set(frame as f32);
                let handle = host.deliver().unwrap();
                globe.on_frame(handle, &mut host).unwrap();
            }
            globe.unmount(&mut host);

            assert_eq!(host.outstanding(), 0, "cycle {cycle}");
            assert!(host.listeners.is_empty(), "cycle {cycle}");
            assert_eq!(log.borrow().released.len(), 4);
        }
        assert_eq!(host.cancelled, 10);
    }

    #[test]
    fn test_late_frame_after_unmount_is_noop() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));
        globe.mount(&mut host, mock_factory(&log)).unwrap();
        let handle = host.deliver().unwrap();

        globe.unmount(&mut host);

        assert!(!globe.on_frame(handle, &mut host).unwrap());
        assert_eq!(log.borrow().draws, 0);
        assert_eq!(host.outstanding(), 0);
    }

    #[test]
    fn test_resize_sets_exact_aspect_and_surface() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));
        globe.mount(&mut host, mock_factory(&log)).unwrap();

        globe.on_resize(1920, 1080);

        let aspect = globe.render_state().unwrap().camera.aspect_ratio;
        assert_eq!(aspect, 1920.0 / 1080.0);
        assert_eq!(log.borrow().resizes, vec![(1920, 1080)]);
    }

    #[test]
    fn test_zero_height_resize_keeps_aspect() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));
        globe.mount(&mut host, mock_factory(&log)).unwrap();

        globe.on_resize(800, 0);

        let aspect = globe.render_state().unwrap().camera.aspect_ratio;
        assert_eq!(aspect, 800.0 / 600.0);
        assert_eq!(log.borrow().resizes, vec![(800, 0)]);
    }

    #[test]
    fn test_resize_before_mount_and_after_unmount_is_skipped() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));

        globe.on_resize(1024, 768);
        globe.mount(&mut host, mock_factory(&log)).unwrap();
        globe.unmount(&mut host);
        globe.on_resize(1024, 768);

        assert!(log.borrow().resizes.is_empty());
    }

    #[test]
    fn test_failed_upload_is_cleaned_up() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));
        let factory = {
            let log = Rc::clone(&log);
            move |_| {
                let mut renderer = MockRenderer::new(log);
                renderer.fail_upload = Some(MeshKind::Clouds);
                Ok(Box::new(renderer) as Box<dyn SceneRenderer>)
            }
        };

        let result = globe.mount(&mut host, factory);

        assert!(matches!(result, Err(MountError::Upload(_))));
        assert!(!globe.is_mounted());
        let log = log.borrow();
        assert_eq!(log.uploaded, vec![MeshKind::Background, MeshKind::Planet]);
        assert_eq!(log.released, vec![MeshKind::Background, MeshKind::Planet]);
        assert_eq!(log.disposed, 1);
        assert_eq!(host.requested, 0);
        assert!(host.listeners.is_empty());
    }

    #[test]
    fn test_failed_factory_leaves_component_unmounted() {
        let mut host = RecordingHost::new(800, 600);
        let mut globe = component(Rc::new(ManualClock::default()));

        let result = globe.mount(&mut host, |_| {
            Err(MountError::Context(RenderContextError::NoAdapter))
        });

        assert!(matches!(
            result,
            Err(MountError::Context(RenderContextError::NoAdapter))
        ));
        assert!(!globe.is_mounted());
        assert_eq!(host.requested, 0);
    }

    #[test]
    fn test_draw_error_surfaces_through_component() {
        let mut host = RecordingHost::new(800, 600);
        let log = new_log();
        let mut globe = component(Rc::new(ManualClock::default()));
        let factory = {
            let log = Rc::clone(&log);
            move |_| {
                let mut renderer = MockRenderer::new(log);
                renderer.fail_draw = true;
                Ok(Box::new(renderer) as Box<dyn SceneRenderer>)
            }
        };
        globe.mount(&mut host, factory).unwrap();

        let handle = host.deliver().unwrap();
        assert!(globe.on_frame(handle, &mut host).is_err());
        assert_eq!(globe.loop_state(), Some(LoopState::Stopped));

        globe.unmount(&mut host);
        assert_eq!(log.borrow().released.len(), 4);
    }
}
