//! Device, queue and window surface for the globe renderer.

use std::sync::Arc;
use winit::window::Window;

#[derive(Debug, thiserror::Error)]
pub enum RenderContextError {
    #[error("no GPU adapter can present to this window")]
    NoAdapter,

    #[error("GPU device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("window surface creation failed: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// The adapter lists no formats for the surface.
    #[error("window surface has no usable format on this adapter")]
    UnsupportedSurface,
}

/// Frame acquisition failures that survive one reconfigure attempt.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("surface lost")]
    Lost,

    #[error("out of memory")]
    OutOfMemory,

    /// The frame should be skipped, not treated as fatal.
    #[error("timed out acquiring surface texture")]
    Timeout,
}

/// The GPU side of one window.
pub struct RenderContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    /// MSAA samples shared by the color target, depth buffer and pipelines.
    pub sample_count: u32,
}

impl RenderContext {
    /// Pick an adapter that can present to `window` and configure its surface
    /// at the window's current size. `msaa_samples` is lowered to the largest
    /// count the adapter supports.
    pub async fn new(
        window: Arc<Window>,
        vsync: bool,
        msaa_samples: u32,
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let inner = window.inner_size();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderContextError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("Adapter: {} on {:?}", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("globe-device"),
                required_features: adapter.features()
                    & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let surface_config = surface_configuration(&caps, inner.width, inner.height, vsync)?;
        surface.configure(&device, &surface_config);

        let adapter_specific = device
            .features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
        let color_flags = adapter.get_texture_format_features(surface_config.format).flags;
        let depth_flags = adapter
            .get_texture_format_features(wgpu::TextureFormat::Depth32Float)
            .flags;
        let sample_count = pick_sample_count(msaa_samples, |count| {
            (adapter_specific || count == 4)
                && color_flags.sample_count_supported(count)
                && depth_flags.sample_count_supported(count)
        });
        if sample_count != msaa_samples.max(1) {
            log::warn!("{msaa_samples}x MSAA unsupported, using {sample_count}x");
        }
        log::info!(
            "Surface {}x{} as {:?}, present {:?}, {sample_count}x MSAA",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            surface_config.present_mode
        );

        Ok(Self {
            surface_format: surface_config.format,
            sample_count,
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
        })
    }

    /// Reconfigure the surface. Zero extents become 1.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = clamp_extent(width, height);
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Next frame to draw into. A lost or outdated surface is reconfigured
    /// and acquired once more.
    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, SurfaceError> {
        let err = match self.surface.get_current_texture() {
            Ok(frame) => return Ok(frame),
            Err(err) => err,
        };
        match err {
            wgpu::SurfaceError::Timeout => Err(SurfaceError::Timeout),
            wgpu::SurfaceError::OutOfMemory => Err(SurfaceError::OutOfMemory),
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Other => {
                log::warn!("Surface {err:?}, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                self.surface
                    .get_current_texture()
                    .map_err(|_| SurfaceError::Lost)
            }
        }
    }
}

/// Blocking wrapper around [`RenderContext::new`].
pub fn init_render_context_blocking(
    window: Arc<Window>,
    vsync: bool,
    msaa_samples: u32,
) -> Result<RenderContext, RenderContextError> {
    pollster::block_on(RenderContext::new(window, vsync, msaa_samples))
}

/// The largest of 16, 8, 4 and 2 samples not above `requested` that
/// `supported` accepts, else 1.
pub fn pick_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    [16, 8, 4, 2]
        .into_iter()
        .filter(|&count| count <= requested)
        .find(|&count| supported(count))
        .unwrap_or(1)
}

fn clamp_extent(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

/// Surface configuration from the adapter's capabilities.
fn surface_configuration(
    caps: &wgpu::SurfaceCapabilities,
    width: u32,
    height: u32,
    vsync: bool,
) -> Result<wgpu::SurfaceConfiguration, RenderContextError> {
    let format = pick_surface_format(&caps.formats).ok_or(RenderContextError::UnsupportedSurface)?;
    let (width, height) = clamp_extent(width, height);
    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: pick_present_mode(&caps.present_modes, vsync),
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: Vec::new(),
        desired_maximum_frame_latency: 2,
    })
}

/// The surface's first sRGB format, else its first format.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| formats.first().copied())
}

/// `Fifo` with vsync; otherwise the lowest-latency mode the surface offers.
fn pick_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    use wgpu::PresentMode::{Fifo, Immediate, Mailbox};

    let preference: &[wgpu::PresentMode] = if vsync {
        &[Fifo]
    } else {
        &[Mailbox, Immediate, Fifo]
    };
    preference
        .iter()
        .copied()
        .find(|mode| modes.contains(mode))
        .unwrap_or(Fifo)
}
