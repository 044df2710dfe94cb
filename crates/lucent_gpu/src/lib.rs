//! Lucent GPU Pipeline
//!
//! Backdrop capture and glass compositing using wgpu.
//!
//! Per frame, [`BackdropCapturer`] paints whatever sits behind a view into a
//! persistent texture, and [`GlassPipeline`] runs the glass shader over it
//! into a [`PresentationSurface`]. Both share one device and one queue from
//! [`GpuContext`], so an upload is always sampled after it lands.

pub mod blur;
pub mod capture;
pub mod context;
pub mod error;
pub mod limiter;
pub mod pipeline;
pub mod primitives;
pub mod shaders;
pub mod surface;

pub use capture::{BackdropCapturer, CaptureDevice, CaptureStats, SharedTexture, WgpuCaptureDevice};
pub use context::GpuContext;
pub use error::{CaptureError, PipelineError};
pub use limiter::{InFlightLimiter, InFlightSlot, MAX_IN_FLIGHT};
pub use pipeline::{FrameOutcome, GlassPipeline, GlassRenderer, SkipReason};
pub use surface::{AcquireError, Drawable, OffscreenSurface, PresentationSurface, WindowSurface};
