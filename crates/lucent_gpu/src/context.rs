//! Shared GPU device
//!
//! One adapter, one device and one queue per [`GpuContext`]. The capturer and
//! the pipeline clone the `Arc`s so every upload and every draw goes through
//! the same queue in submission order.

use std::sync::Arc;

use crate::error::PipelineError;

/// Adapter, device and queue shared by the capturer and the pipeline
#[derive(Clone, Debug)]
pub struct GpuContext {
    instance: Arc<wgpu::Instance>,
    adapter: Arc<wgpu::Adapter>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Acquire a device, blocking the calling thread until it is ready
    pub fn new() -> Result<Self, PipelineError> {
        pollster::block_on(Self::new_async())
    }

    /// Acquire a device without a surface (headless rendering and tests)
    pub async fn new_async() -> Result<Self, PipelineError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                // Glass runs continuously next to the app's own rendering
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(PipelineError::AdapterNotFound)?;

        let info = adapter.get_info();
        tracing::info!(
            "GPU adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Lucent GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    // Prefer lower memory over throughput; capture textures are
                    // small and shared GPU memory counts against the app.
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        Ok(Self::from_parts(instance, adapter, device, queue))
    }

    /// Wrap a device the host already owns
    pub fn from_parts(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
    ) -> Self {
        Self {
            instance: Arc::new(instance),
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        }
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Get the preferred backend for the current platform
    ///
    /// Using the primary backend instead of all backends reduces memory usage
    /// by avoiding initialization of multiple GPU driver stacks.
    pub fn preferred_backends() -> wgpu::Backends {
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        {
            wgpu::Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            wgpu::Backends::DX12
        }
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            wgpu::Backends::VULKAN
        }
        #[cfg(not(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "windows",
            target_os = "linux",
            target_os = "android"
        )))]
        {
            wgpu::Backends::PRIMARY
        }
    }
}

/// Run `create` inside out-of-memory and validation error scopes.
///
/// Failed allocations come back as an error instead of reaching the device's
/// uncaptured error handler, which panics.
pub(crate) fn with_error_scopes<T>(
    device: &wgpu::Device,
    create: impl FnOnce() -> T,
) -> Result<T, wgpu::Error> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let validation = pollster::block_on(device.pop_error_scope());
    let oom = pollster::block_on(device.pop_error_scope());
    match validation.or(oom) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}
