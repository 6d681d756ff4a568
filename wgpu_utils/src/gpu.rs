use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

/// The handles the renderer keeps once the gpu is up: instance → adapter → device → configured surface.
pub struct Gpu {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub adapter_info: wgpu::AdapterInfo,
}

/// Brings up the gpu for `window`.
///
/// Creates the instance and a surface for the window, requests a high performance adapter that can
/// present to it, requests the device and its queue, and configures the surface in the adapter's
/// preferred format. The adapter and the device are inspected and logged on the way.
///
/// # Errors
///
/// Fails if the surface can't be created, if no compatible adapter exists, if the device request is
/// refused or if the adapter can't present to the surface at all.
pub async fn setup_gpu(window: Arc<Window>, present_mode: wgpu::PresentMode) -> Result<Gpu> {
    let instance = create_instance();

    // The surface keeps its own handle on the window, so it can outlive the borrow here
    let surface = instance
        .create_surface(window.clone())
        .context("Failed to create surface")?;

    log::info!("Requesting adapter...");
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .context("Could not get WebGPU adapter")?;
    let adapter_info = adapter.get_info();
    log::info!("Got adapter: {}", adapter_info.name);
    inspect_adapter(&adapter);

    log::info!("Requesting device...");
    let (device, queue) = request_device(&adapter).await?;
    log::info!("Got device");
    inspect_device(&device);

    let surface_caps = surface.get_capabilities(&adapter);
    let format = preferred_format(&surface_caps.formats).context("Surface is not supported by the adapter")?;
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    let size = window.inner_size();
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        // a surface can't be configured with a zero extent, e.g. for a minimised window
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: choose_present_mode(&surface_caps.present_modes, present_mode),
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &config);
    log::info!("Surface configured: {}x{} {:?} {:?}", config.width, config.height, config.format, config.present_mode);

    Ok(Gpu {
        surface,
        device,
        queue,
        config,
        size,
        adapter_info,
    })
}

/// Requests an adapter and a device without any surface, for work that never reaches the screen.
///
/// Returns `Ok(None)` when the system has no usable adapter.
pub async fn request_headless_device() -> Result<Option<(wgpu::Adapter, wgpu::Device, wgpu::Queue)>> {
    let instance = create_instance();
    let Some(adapter) = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
    else {
        log::warn!("No WebGPU adapter available");
        return Ok(None);
    };

    let (device, queue) = request_device(&adapter).await?;
    Ok(Some((adapter, device, queue)))
}

/// Blocking [`request_headless_device`] for tests: logs a warning and returns `None` when there is no gpu.
pub fn headless_device_or_skip() -> Option<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    match pollster::block_on(request_headless_device()) {
        Ok(Some(handles)) => Some(handles),
        Ok(None) => {
            log::warn!("No gpu available, skipping");
            None
        }
        Err(error) => {
            log::warn!("No usable gpu ({:#}), skipping", error);
            None
        }
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("My Device"),
                required_features: wgpu::Features::empty(),
                // Keep the default limits but allow whatever texture size the adapter supports
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
            },
            None,
        )
        .await
        .context("Could not get WebGPU device")?;

    device.on_uncaptured_error(Box::new(|error| {
        log::error!("Uncaptured device error: {}", error);
    }));
    device.set_device_lost_callback(|reason, message| {
        if message.is_empty() {
            log::error!("Device lost: reason: {:?}", reason);
        } else {
            log::error!("Device lost: reason: {:?} ({})", reason, message);
        }
    });

    Ok((device, queue))
}

/// The format the surface prefers, which is the first one it reports.
pub fn preferred_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats.first().copied()
}

/// Uses `requested` when the surface supports it and falls back to `Fifo`, which every surface supports.
pub fn choose_present_mode(supported: &[wgpu::PresentMode], requested: wgpu::PresentMode) -> wgpu::PresentMode {
    let automatic = matches!(requested, wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync);
    if automatic || supported.contains(&requested) {
        requested
    } else {
        log::warn!("Present mode {:?} is not supported, falling back to Fifo", requested);
        wgpu::PresentMode::Fifo
    }
}

/// Logs the features, limits and properties of an adapter.
pub fn inspect_adapter(adapter: &wgpu::Adapter) {
    log::info!("Adapter features:");
    for feature in adapter.features().iter() {
        log::info!(" - {:?}", feature);
    }

    log::info!("Adapter limits:");
    log_limits(&adapter.limits());

    let info = adapter.get_info();
    log::info!("Adapter properties:");
    log::info!(" - vendorID: {}", info.vendor);
    log::info!(" - deviceID: {}", info.device);
    log::info!(" - name: {}", info.name);
    if !info.driver_info.is_empty() {
        log::info!(" - driverDescription: {} {}", info.driver, info.driver_info);
    }
    log::info!(" - adapterType: {:?}", info.device_type);
    log::info!(" - backendType: {:?}", info.backend);
}

/// Logs the features and limits the device was actually created with.
pub fn inspect_device(device: &wgpu::Device) {
    log::info!("Device features:");
    for feature in device.features().iter() {
        log::info!(" - {:?}", feature);
    }

    log::info!("Device limits:");
    log_limits(&device.limits());
}

fn log_limits(limits: &wgpu::Limits) {
    log::info!(" - maxTextureDimension1D: {}", limits.max_texture_dimension_1d);
    log::info!(" - maxTextureDimension2D: {}", limits.max_texture_dimension_2d);
    log::info!(" - maxTextureDimension3D: {}", limits.max_texture_dimension_3d);
    log::info!(" - maxTextureArrayLayers: {}", limits.max_texture_array_layers);
    log::info!(" - maxBindGroups: {}", limits.max_bind_groups);
    log::info!(
        " - maxDynamicUniformBuffersPerPipelineLayout: {}",
        limits.max_dynamic_uniform_buffers_per_pipeline_layout
    );
    log::info!(
        " - maxDynamicStorageBuffersPerPipelineLayout: {}",
        limits.max_dynamic_storage_buffers_per_pipeline_layout
    );
    log::info!(" - maxSampledTexturesPerShaderStage: {}", limits.max_sampled_textures_per_shader_stage);
    log::info!(" - maxSamplersPerShaderStage: {}", limits.max_samplers_per_shader_stage);
    log::info!(" - maxStorageTexturesPerShaderStage: {}", limits.max_storage_textures_per_shader_stage);
    log::info!(" - maxUniformBuffersPerShaderStage: {}", limits.max_uniform_buffers_per_shader_stage);
    log::info!(" - maxUniformBufferBindingSize: {}", limits.max_uniform_buffer_binding_size);
    log::info!(" - maxStorageBufferBindingSize: {}", limits.max_storage_buffer_binding_size);
    log::info!(" - minUniformBufferOffsetAlignment: {}", limits.min_uniform_buffer_offset_alignment);
    log::info!(" - minStorageBufferOffsetAlignment: {}", limits.min_storage_buffer_offset_alignment);
    log::info!(" - maxVertexBuffers: {}", limits.max_vertex_buffers);
    log::info!(" - maxVertexAttributes: {}", limits.max_vertex_attributes);
    log::info!(" - maxVertexBufferArrayStride: {}", limits.max_vertex_buffer_array_stride);
    log::info!(" - maxInterStageShaderComponents: {}", limits.max_inter_stage_shader_components);
    log::info!(" - maxComputeWorkgroupStorageSize: {}", limits.max_compute_workgroup_storage_size);
    log::info!(" - maxComputeInvocationsPerWorkgroup: {}", limits.max_compute_invocations_per_workgroup);
    log::info!(" - maxComputeWorkgroupSizeX: {}", limits.max_compute_workgroup_size_x);
    log::info!(" - maxComputeWorkgroupSizeY: {}", limits.max_compute_workgroup_size_y);
    log::info!(" - maxComputeWorkgroupSizeZ: {}", limits.max_compute_workgroup_size_z);
    log::info!(" - maxComputeWorkgroupsPerDimension: {}", limits.max_compute_workgroups_per_dimension);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_format_is_first() {
        let formats = [wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Bgra8Unorm];
        assert_eq!(preferred_format(&formats), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(preferred_format(&[]), None);
    }

    #[test]
    fn test_present_mode_supported() {
        let supported = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox];
        assert_eq!(choose_present_mode(&supported, wgpu::PresentMode::Mailbox), wgpu::PresentMode::Mailbox);
    }

    #[test]
    fn test_present_mode_fallback() {
        let supported = [wgpu::PresentMode::Fifo];
        assert_eq!(choose_present_mode(&supported, wgpu::PresentMode::Immediate), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn test_present_mode_automatic_is_kept() {
        // the automatic modes are resolved by wgpu itself and never appear in the capabilities
        let supported = [wgpu::PresentMode::Fifo];
        assert_eq!(choose_present_mode(&supported, wgpu::PresentMode::AutoNoVsync), wgpu::PresentMode::AutoNoVsync);
    }

    #[test]
    fn test_headless_device_limits() {
        let Some((adapter, device, _queue)) = headless_device_or_skip() else { return };
        inspect_adapter(&adapter);
        inspect_device(&device);
        assert!(device.limits().max_bind_groups >= 4);
        assert_eq!(device.limits().max_texture_dimension_2d, adapter.limits().max_texture_dimension_2d);
    }
}
