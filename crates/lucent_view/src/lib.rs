//! Lucent View
//!
//! The host-facing layer of the glass pipeline. A view that wants glass owns
//! an [`EffectSurface`], forwards its lifecycle (attach, detach, layout,
//! frame ticks) to it, and the surface drives capture and compositing.
//!
//! - [`EffectSurface`]: lifecycle, layout and frame pacing around a capturer
//!   and a renderer
//! - [`GlassKnob`]: the knob control, with activation cross-fade and drag squeeze
//! - [`BackdropProvider`]: optional zero-copy source of backdrop textures
//! - [`logging`]: `tracing-subscriber` setup for hosts and demos
//!
//! # Example
//!
//! ```ignore
//! use lucent_view::{logging, EffectSurface};
//!
//! logging::init();
//! let mut glass = EffectSurface::with_gpu(&gpu, source, surface, host, &settings);
//! glass.attach();
//! glass.layout(bounds);
//! glass.start_rendering();
//!
//! // from the host's per-frame callback
//! glass.on_frame(Instant::now());
//! ```

pub mod controller;
pub mod knob;
pub mod logging;
pub mod provider;

pub use controller::{EffectSurface, WgpuEffectSurface};
pub use knob::{
    squeeze_for_velocity, GlassKnob, KnobPose, ACTIVATION_DURATION, ACTIVE_SCALE, MAX_SQUEEZE,
};
pub use provider::{BackdropProvider, CachingProvider, TextureCache};

pub use lucent_core::{
    CaptureSettings, CaptureSource, CompositorHost, EffectConfiguration, LayerChange, LayerRole,
    Rect, SurfaceState,
};
pub use lucent_gpu::{FrameOutcome, SkipReason};
