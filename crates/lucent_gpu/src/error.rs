//! GPU error types

use lucent_core::PixelSize;
use thiserror::Error;

/// The GPU path is unavailable; the effect degrades to disabled
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("shader compilation failed: {0}")]
    Shader(String),

    #[error("GPU resource creation failed: {0}")]
    Resource(String),
}

/// A single capture could not produce a texture.
///
/// Never leaves the capturer; every variant is absorbed into a miss.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CaptureError {
    #[error("failed to allocate capture buffers for {size}: {reason}")]
    Allocation { size: PixelSize, reason: String },

    #[error("capture region is degenerate ({size})")]
    Degenerate { size: PixelSize },

    #[error("capture source is detached")]
    Detached,
}
