//! WebGPU rendering module
//!
//! Two independent pipelines, both drawing a fullscreen triangle and doing
//! all the work in the fragment shader:
//! - `scene`: SDF rendering of the game (cannon, enemies, projectiles, particles)
//! - `water`: the standalone water shader demo

pub mod scene;
pub mod water;

pub use scene::SceneRenderState;
pub use water::WaterRenderState;

/// Request a device with the limits both pipelines need.
pub(crate) async fn request_device(adapter: &wgpu::Adapter) -> (wgpu::Device, wgpu::Queue) {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("render-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        })
        .await
        .expect("Failed to create device")
}

/// Configure the surface with an sRGB format when one is available.
pub(crate) fn configure_surface(
    surface: &wgpu::Surface<'_>,
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> wgpu::SurfaceConfiguration {
    let surface_caps = surface.get_capabilities(adapter);
    log::info!("Surface formats: {:?}", surface_caps.formats);

    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .copied()
        .unwrap_or(surface_caps.formats[0]);

    log::info!("Using surface format: {:?}", surface_format);

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width,
        height,
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: surface_caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(device, &config);
    config
}
