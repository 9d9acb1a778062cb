//! Window creation and event handling via winit.
//!
//! [`GlobeApp`] implements winit's [`ApplicationHandler`] and hosts one
//! [`GlobeComponent`]. Frame scheduling maps onto `request_redraw`, F5
//! re-reads `config.ron`, and [`run`] starts the event loop.

use std::sync::Arc;

use globe_config::{Config, WindowConfig};
use globe_render::{GpuRenderer, SceneRenderer};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::frame_loop::LoopError;
use crate::host::{AnimationHandle, Host, ListenerId};
use crate::lifecycle::{GlobeComponent, GlobeSettings, MountError};
use crate::reload::{ConfigSource, ReloadEffect};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to mount globe: {0}")]
    Mount(#[from] MountError),

    #[error("render loop failed: {0}")]
    Frame(#[from] LoopError),
}

/// Returns [`WindowAttributes`] for the given window settings.
pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64));
    if config.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// [`Host`] backed by a winit window.
///
/// At most one frame is outstanding: requesting a frame replaces the pending
/// handle, and cancelling clears it so a late `RedrawRequested` is dropped.
#[derive(Debug, Default)]
pub struct WinitHost {
    window: Option<Arc<Window>>,
    size: (u32, u32),
    next_handle: u64,
    pending: Option<AnimationHandle>,
    next_listener: u64,
    listeners: Vec<ListenerId>,
}

impl WinitHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    /// Adopt `window` and its current physical size.
    pub fn attach(&mut self, window: Arc<Window>) {
        let inner = window.inner_size();
        self.size = (inner.width, inner.height);
        self.window = Some(window);
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    /// The pending frame, consumed by the redraw that delivers it.
    pub fn take_pending(&mut self) -> Option<AnimationHandle> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<AnimationHandle> {
        self.pending
    }

    pub fn has_resize_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }
}

impl Host for WinitHost {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn request_frame(&mut self) -> AnimationHandle {
        self.next_handle += 1;
        let handle = AnimationHandle(self.next_handle);
        self.pending = Some(handle);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        handle
    }

    fn cancel_frame(&mut self, handle: AnimationHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|l| *l != id);
    }
}

/// Whether `event` is a fresh press of the config reload key.
fn is_reload_key(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && event.physical_key == PhysicalKey::Code(KeyCode::F5)
}

/// Application state: the window host, the globe and the first fatal error.
pub struct GlobeApp {
    config: Config,
    source: Option<ConfigSource>,
    host: WinitHost,
    component: GlobeComponent,
    error: Option<AppError>,
}

impl GlobeApp {
    pub fn new(config: Config) -> Self {
        let host = WinitHost::new(config.window.width, config.window.height);
        let component = GlobeComponent::new(GlobeSettings::from(&config.scene));
        Self {
            config,
            source: None,
            host,
            component,
            error: None,
        }
    }

    /// Enable F5 reloads from `source`.
    pub fn with_config_source(mut self, source: ConfigSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> &WinitHost {
        &self.host
    }

    pub fn component(&self) -> &GlobeComponent {
        &self.component
    }

    /// The error that ended the event loop, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!("{err}");
        self.component.unmount(&mut self.host);
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    /// Re-read `config.ron` and adopt it. Debug settings apply at once; the
    /// caller remounts when the returned effect asks for it. `None` when
    /// nothing changed or the file could not be read.
    pub fn apply_reload(&mut self) -> Option<ReloadEffect> {
        let Some(source) = self.source.as_mut() else {
            debug!("No config file to reload");
            return None;
        };
        let fresh = match source.reload() {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                info!("Config unchanged in {}", source.dir().display());
                return None;
            }
            Err(e) => {
                warn!("Config reload failed, keeping current settings: {e}");
                return None;
            }
        };
        let effect = ReloadEffect::between(&self.config, &fresh);
        if effect.needs_restart {
            info!("Window size, fullscreen and title changes apply on next start");
        }
        self.config = fresh;
        Some(effect)
    }

    /// Build the renderer for `window` and mount the globe on it.
    fn mount(&mut self, event_loop: &ActiveEventLoop, window: Arc<Window>) {
        let vsync = self.config.window.vsync;
        let msaa_samples = self.config.render.msaa_samples;
        let mounted = self.component.mount(&mut self.host, move |_| {
            let renderer = GpuRenderer::from_window(window, vsync, msaa_samples)?;
            Ok(Box::new(renderer) as Box<dyn SceneRenderer>)
        });
        if let Err(e) = mounted {
            self.fail(event_loop, e.into());
        }
    }

    fn reload(&mut self, event_loop: &ActiveEventLoop) {
        let Some(effect) = self.apply_reload() else {
            return;
        };
        let Some(window) = self.host.window().cloned() else {
            return;
        };
        if effect.remount {
            info!("Rebuilding globe with reloaded settings");
            self.component.unmount(&mut self.host);
            self.component = GlobeComponent::new(GlobeSettings::from(&self.config.scene));
            self.mount(event_loop, window);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(handle) = self.host.take_pending() else {
            return;
        };
        match self.component.on_frame(handle, &mut self.host) {
            Ok(true) => {
                let interval = self.config.debug.frame_log_interval;
                if interval > 0
                    && let Some(state) = self.component.render_state()
                    && state.frame % interval == 0
                {
                    debug!("Frame {} at t={:.2}s", state.frame, state.elapsed);
                }
            }
            Ok(false) => {}
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for GlobeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.window().is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes(&self.config.window)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        };
        self.host.attach(Arc::clone(&window));
        let (width, height) = self.host.surface_size();
        info!(
            "Window created: {width}x{height} (scale: {:.2})",
            window.scale_factor()
        );

        self.mount(event_loop, window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.component.unmount(&mut self.host);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.host.set_size(size.width, size.height);
                if self.host.has_resize_listeners() {
                    self.component.on_resize(size.width, size.height);
                    info!("Window resized to {}x{}", size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::KeyboardInput { event, .. } if is_reload_key(&event) => {
                self.reload(event_loop);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.component.is_mounted() {
            warn!("Event loop exiting with globe still mounted");
        }
        self.component.unmount(&mut self.host);
    }
}

/// Creates an event loop and runs the globe with the given config. With a
/// `source`, F5 reloads the config file.
///
/// Blocks until the window is closed or a fatal error ends the loop.
#[instrument(skip(config, source))]
pub fn run(config: Config, source: Option<ConfigSource>) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = GlobeApp::new(config);
    if let Some(source) = source {
        app = app.with_config_source(source);
    }
    event_loop.run_app(&mut app)?;
    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
