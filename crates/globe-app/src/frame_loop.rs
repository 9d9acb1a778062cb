//! Self-rescheduling render loop.
//!
//! Each delivered frame updates the scene from the clock, draws it and asks
//! the host for the next frame. The loop only ever holds one live
//! [`AnimationHandle`]; frames delivered with any other handle are stale.

use std::rc::Rc;
use std::time::Instant;

use glam::Vec3;
use globe_render::{RenderError, SceneRenderer};
use globe_scene::{MeshKind, RenderState, ShaderProgram};
use tracing::{debug, warn};

use crate::host::{AnimationHandle, Host};

/// Planet spin per frame, radians.
pub const PLANET_SPIN: f32 = 0.008;
/// Cloud spin per frame, radians. Faster than the planet.
pub const CLOUD_SPIN: f32 = 0.010;

/// Monotonic time source for the loop.
pub trait Clock {
    /// Seconds since the clock started.
    fn elapsed(&self) -> f32;
}

/// Wall clock starting at construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Created, not yet started.
    Idle,
    Running,
    /// Stopped for good.
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("render loop was stopped and cannot restart")]
    AlreadyStopped,

    #[error("render loop is already running")]
    AlreadyRunning,

    #[error("draw failed: {0}")]
    Draw(#[from] RenderError),
}

/// Advance the scene to time `t`: spin, shader clocks, star overlay,
/// camera drift.
pub fn update(state: &mut RenderState, t: f32) {
    state.elapsed = t;

    if let Some(planet) = state.scene.mesh_mut(MeshKind::Planet) {
        planet.rotation_y += PLANET_SPIN;
    }
    if let Some(clouds) = state.scene.mesh_mut(MeshKind::Clouds) {
        clouds.rotation_y += CLOUD_SPIN;
    }

    let eye = state.camera.position;
    if let Some(atmosphere) = state.scene.mesh_mut(MeshKind::Atmosphere)
        && let Some(program) = atmosphere.material.program_mut()
    {
        if let ShaderProgram::Atmosphere(uniforms) = program {
            uniforms.view_vector = eye;
        }
        program.set_time(t);
    }
    if let Some(background) = state.scene.mesh_mut(MeshKind::Background)
        && let Some(program) = background.material.program_mut()
    {
        program.set_time(t);
    }
    state.overlay.set_time(t);

    state.camera.position.x = (t * 0.1).cos() * 0.1;
    state.camera.position.y = (t * 0.05).sin() * 0.05;
    state.camera.look_at(Vec3::ZERO);
}

/// The loop driver. Owns the [`RenderState`] it updates and lends to the
/// renderer.
pub struct FrameLoop {
    state: LoopState,
    pending: Option<AnimationHandle>,
    render_state: RenderState,
    clock: Rc<dyn Clock>,
}

impl FrameLoop {
    pub fn new(render_state: RenderState, clock: Rc<dyn Clock>) -> Self {
        Self {
            state: LoopState::Idle,
            pending: None,
            render_state,
            clock,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The live handle, if a frame is scheduled.
    pub fn pending(&self) -> Option<AnimationHandle> {
        self.pending
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn render_state_mut(&mut self) -> &mut RenderState {
        &mut self.render_state
    }

    /// Schedule the first frame.
    pub fn start(&mut self, host: &mut dyn Host) -> Result<(), LoopError> {
        match self.state {
            LoopState::Idle => {}
            LoopState::Running => return Err(LoopError::AlreadyRunning),
            LoopState::Stopped => return Err(LoopError::AlreadyStopped),
        }
        self.pending = Some(host.request_frame());
        self.state = LoopState::Running;
        Ok(())
    }

    /// Run one frame if `handle` is the live one. Returns whether it ran.
    ///
    /// A draw error stops the loop without scheduling another frame.
    pub fn on_frame(
        &mut self,
        handle: AnimationHandle,
        host: &mut dyn Host,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<bool, LoopError> {
        if self.state != LoopState::Running || self.pending != Some(handle) {
            debug!("Ignoring stale frame {:?}", handle);
            return Ok(false);
        }
        self.pending = None;

        let t = self.clock.elapsed();
        update(&mut self.render_state, t);

        if let Err(e) = renderer.draw(&self.render_state) {
            warn!("Draw failed, stopping render loop: {e}");
            self.state = LoopState::Stopped;
            return Err(e.into());
        }
        self.render_state.frame += 1;

        self.pending = Some(host.request_frame());
        Ok(true)
    }

    /// Cancel the pending frame and stop for good.
    pub fn stop(&mut self, host: &mut dyn Host) {
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        self.state = LoopState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ManualClock, MockRenderer, RecordingHost, RendererLog, small_state};
    use globe_scene::StarOverlay;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::cell::RefCell;

    fn running_loop(clock: Rc<ManualClock>, host: &mut RecordingHost) -> FrameLoop {
        let mut frame_loop = FrameLoop::new(small_state(), clock);
        frame_loop.start(host).unwrap();
        frame_loop
    }

    #[test]
    fn test_update_spins_planet_and_clouds() {
        let mut state = small_state();
        update(&mut state, 0.0);
        update(&mut state, 0.016);

        let planet = state.scene.mesh(MeshKind::Planet).unwrap().rotation_y;
        let clouds = state.scene.mesh(MeshKind::Clouds).unwrap().rotation_y;
        assert!((planet - 0.016).abs() < 1e-6);
        assert!((clouds - 0.020).abs() < 1e-6);
        assert_eq!(state.scene.mesh(MeshKind::Atmosphere).unwrap().rotation_y, 0.0);
    }

    #[test]
    fn test_update_writes_shader_clocks_and_view_vector() {
        let mut state = small_state();
        let eye = state.camera.position;
        update(&mut state, 2.5);

        let Some(ShaderProgram::Atmosphere(u)) = state
            .scene
            .mesh(MeshKind::Atmosphere)
            .unwrap()
            .material
            .program()
        else {
            panic!("expected atmosphere program");
        };
        assert_eq!(u.time, 2.5);
        assert_eq!(u.view_vector, eye);

        let Some(ShaderProgram::Galaxy { uniforms, .. }) = state
            .scene
            .mesh(MeshKind::Background)
            .unwrap()
            .material
            .program()
        else {
            panic!("expected galaxy program");
        };
        assert_eq!(uniforms.time, 2.5);
        assert_eq!(state.elapsed, 2.5);
    }

    #[test]
    fn test_update_advances_star_overlay() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut state = small_state().with_overlay(StarOverlay::generate(&mut rng));
        let before = state.overlay.sprites((800, 600), 1.0);

        update(&mut state, 2.75);

        assert_eq!(state.overlay.time(), 2.75);
        assert_ne!(state.overlay.sprites((800, 600), 1.0), before);
    }

    #[test]
    fn test_camera_drift_stays_in_bounds_and_faces_origin() {
        let mut state = small_state();
        for i in 0..2000 {
            let t = i as f32 * 0.37;
            update(&mut state, t);
            let p = state.camera.position;
            assert!(p.x.abs() <= 0.1 + 1e-6);
            assert!(p.y.abs() <= 0.05 + 1e-6);
            assert_eq!(p.z, 12.0);
            let to_origin = (-p).normalize();
            assert!(state.camera.forward().dot(to_origin) > 0.9999);
        }
    }

    #[test]
    fn test_camera_drift_at_time_zero() {
        let mut state = small_state();
        update(&mut state, 0.0);
        assert!((state.camera.position.x - 0.1).abs() < 1e-6);
        assert!(state.camera.position.y.abs() < 1e-6);
    }

    #[test]
    fn test_frame_runs_update_draw_then_reschedules() {
        let clock = Rc::new(ManualClock::default());
        let mut host = RecordingHost::new(800, 600);
        let log = Rc::new(RefCell::new(RendererLog::default()));
        let mut renderer = MockRenderer::new(Rc::clone(&log));
        let mut frame_loop = running_loop(Rc::clone(&clock), &mut host);
        assert_eq!(frame_loop.state(), LoopState::Running);

        clock.set(1.0);
        let handle = host.deliver().unwrap();
        assert!(frame_loop.on_frame(handle, &mut host, &mut renderer).unwrap());

        assert_eq!(log.borrow().draws, 1);
        assert_eq!(frame_loop.render_state().frame, 1);
        assert_eq!(frame_loop.render_state().elapsed, 1.0);
        assert_eq!(host.outstanding(), 1);
        assert_ne!(frame_loop.pending(), Some(handle));
    }

    #[test]
    fn test_stale_handle_is_ignored() {
        let clock = Rc::new(ManualClock::default());
        let mut host = RecordingHost::new(800, 600);
        let log = Rc::new(RefCell::new(RendererLog::default()));
        let mut renderer = MockRenderer::new(Rc::clone(&log));
        let mut frame_loop = running_loop(clock, &mut host);

        let first = host.deliver().unwrap();
        frame_loop.on_frame(first, &mut host, &mut renderer).unwrap();

        // Replaying the already-consumed handle does nothing.
        assert!(!frame_loop.on_frame(first, &mut host, &mut renderer).unwrap());
        assert_eq!(log.borrow().draws, 1);
        assert_eq!(host.requested, 2);
    }

    #[test]
    fn test_frame_after_stop_is_ignored() {
        let clock = Rc::new(ManualClock::default());
        let mut host = RecordingHost::new(800, 600);
        let log = Rc::new(RefCell::new(RendererLog::default()));
        let mut renderer = MockRenderer::new(Rc::clone(&log));
        let mut frame_loop = running_loop(clock, &mut host);

        let pending = frame_loop.pending().unwrap();
        frame_loop.stop(&mut host);

        assert_eq!(host.cancelled, 1);
        assert_eq!(host.outstanding(), 0);
        assert!(!frame_loop.on_frame(pending, &mut host, &mut renderer).unwrap());
        assert_eq!(log.borrow().draws, 0);
    }

    #[test]
    fn test_no_restart_after_stop() {
        let clock = Rc::new(ManualClock::default());
        let mut host = RecordingHost::new(800, 600);
        let mut frame_loop = running_loop(clock, &mut host);

        assert!(matches!(
            frame_loop.start(&mut host),
            Err(LoopError::AlreadyRunning)
        ));
        frame_loop.stop(&mut host);
        assert!(matches!(
            frame_loop.start(&mut host),
            Err(LoopError::AlreadyStopped)
        ));
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert_eq!(host.requested, 1);
    }

    #[test]
    fn test_draw_error_stops_without_rescheduling() {
        let clock = Rc::new(ManualClock::default());
        let mut host = RecordingHost::new(800, 600);
        let log = Rc::new(RefCell::new(RendererLog::default()));
        let mut renderer = MockRenderer::new(log);
        renderer.fail_draw = true;
        let mut frame_loop = running_loop(clock, &mut host);

        let handle = host.deliver().unwrap();
        let result = frame_loop.on_frame(handle, &mut host, &mut renderer);

        assert!(matches!(result, Err(LoopError::Draw(RenderError::Disposed))));
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert_eq!(frame_loop.pending(), None);
        assert_eq!(host.outstanding(), 0);
        assert_eq!(host.requested, 1);
    }
}
