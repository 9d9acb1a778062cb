//! Hand-driven host, clock and renderer for loop and lifecycle tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::OnceLock;

use globe_render::{RenderError, SceneRenderer};
use globe_scene::{Camera, LightRig, Mesh, MeshKind, RenderState, Scene, SceneBuilder};
use globe_texture::{Canvas, RasterImage, TextureSet, WrapMode};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::frame_loop::Clock;
use crate::host::{AnimationHandle, Host, ListenerId};

/// Clock whose time only moves when a test sets it.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<f32>,
}

impl ManualClock {
    pub fn set(&self, t: f32) {
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> f32 {
        self.now.get()
    }
}

/// Host that records scheduling and delivers frames on demand.
pub struct RecordingHost {
    pub size: (u32, u32),
    next_id: u64,
    outstanding: HashSet<AnimationHandle>,
    pub requested: u32,
    pub cancelled: u32,
    pub listeners: Vec<ListenerId>,
    pub listeners_removed: u32,
}

impl RecordingHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            next_id: 0,
            outstanding: HashSet::new(),
            requested: 0,
            cancelled: 0,
            listeners: Vec::new(),
            listeners_removed: 0,
        }
    }

    /// Fire the most recently scheduled frame, as a browser or window would.
    pub fn deliver(&mut self) -> Option<AnimationHandle> {
        let latest = self.outstanding.iter().max_by_key(|h| h.0).copied()?;
        self.outstanding.remove(&latest);
        Some(latest)
    }

    /// Frames requested but neither delivered nor cancelled.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }
}

impl Host for RecordingHost {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn request_frame(&mut self) -> AnimationHandle {
        self.next_id += 1;
        self.requested += 1;
        let handle = AnimationHandle(self.next_id);
        self.outstanding.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: AnimationHandle) {
        if self.outstanding.remove(&handle) {
            self.cancelled += 1;
        }
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        let before = self.listeners.len();
        self.listeners.retain(|l| *l != id);
        if self.listeners.len() < before {
            self.listeners_removed += 1;
        }
    }
}

/// Everything a [`MockRenderer`] was asked to do.
#[derive(Debug, Default)]
pub struct RendererLog {
    /// Calls in order, e.g. `"upload:Planet"`, `"draw"`, `"dispose"`.
    pub calls: Vec<String>,
    pub uploaded: Vec<MeshKind>,
    pub released: Vec<MeshKind>,
    pub resizes: Vec<(u32, u32)>,
    pub draws: u32,
    pub disposed: u32,
    /// Rotation of every mesh at each draw, in draw order.
    pub drawn_rotations: Vec<Vec<(MeshKind, f32)>>,
}

/// Renderer that records calls into a shared log.
pub struct MockRenderer {
    pub log: Rc<RefCell<RendererLog>>,
    pub fail_draw: bool,
    pub fail_upload: Option<MeshKind>,
}

impl MockRenderer {
    pub fn new(log: Rc<RefCell<RendererLog>>) -> Self {
        Self {
            log,
            fail_draw: false,
            fail_upload: None,
        }
    }
}

impl SceneRenderer for MockRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        let mut log = self.log.borrow_mut();
        log.calls.push("resize".to_string());
        log.resizes.push((width, height));
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<(), RenderError> {
        if self.fail_upload == Some(mesh.kind) {
            return Err(RenderError::Disposed);
        }
        let mut log = self.log.borrow_mut();
        log.calls.push(format!("upload:{:?}", mesh.kind));
        log.uploaded.push(mesh.kind);
        Ok(())
    }

    fn draw(&mut self, state: &RenderState) -> Result<(), RenderError> {
        if self.fail_draw {
            return Err(RenderError::Disposed);
        }
        let mut log = self.log.borrow_mut();
        log.calls.push("draw".to_string());
        log.draws += 1;
        let rotations = MeshKind::DRAW_ORDER
            .iter()
            .filter_map(|kind| state.scene.mesh(*kind).map(|m| (*kind, m.rotation_y)))
            .collect();
        log.drawn_rotations.push(rotations);
        Ok(())
    }

    fn release_mesh(&mut self, kind: MeshKind) -> bool {
        let mut log = self.log.borrow_mut();
        log.calls.push(format!("release:{kind:?}"));
        let live = log.uploaded.contains(&kind) && !log.released.contains(&kind);
        if live {
            log.released.push(kind);
        }
        live
    }

    fn dispose(&mut self) {
        let mut log = self.log.borrow_mut();
        log.calls.push("dispose".to_string());
        log.disposed += 1;
    }
}

pub fn tiny_raster() -> RasterImage {
    Canvas::new(4, 2).finish(WrapMode::Repeat, WrapMode::Repeat)
}

/// A full four-mesh scene with coarse spheres and blank rasters.
pub fn small_state() -> RenderState {
    let builder = SceneBuilder {
        planet_segments: 8,
        background_segments: 8,
        ..SceneBuilder::default()
    };
    let mut scene = Scene::new();
    for mesh in [
        builder.background(tiny_raster()),
        builder.planet(tiny_raster(), tiny_raster(), tiny_raster()),
        builder.clouds(tiny_raster()),
        builder.atmosphere(),
    ] {
        scene.add(mesh).unwrap();
    }
    scene.set_lights(LightRig::contact_page());
    let camera = Camera::new(glam::Vec3::new(0.0, 0.0, 12.0), 75.0, 16.0 / 9.0);
    RenderState::new(scene, camera)
}

/// Synthesizes once per test binary; later calls clone the cached set.
pub fn cached_textures(_rng: &mut ChaCha8Rng) -> TextureSet {
    static CACHE: OnceLock<TextureSet> = OnceLock::new();
    CACHE
        .get_or_init(|| TextureSet::synthesize(&mut ChaCha8Rng::seed_from_u64(7)))
        .clone()
}
