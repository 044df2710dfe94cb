//! Lucent Core
//!
//! Platform-independent building blocks for the liquid glass pipeline:
//!
//! - **Configuration**: the immutable [`EffectConfiguration`] snapshot and
//!   capture [`Settings`]
//! - **Geometry**: points, sizes, rects and the affine transform hosts report
//! - **Shape math**: the CPU reference of the glass shader's SDF, lens and
//!   tone curves
//! - **State machine**: surface lifecycle (`Detached` / `Idle` / `Active`)
//! - **Host contracts**: what a view must provide to be captured and laid out
//!
//! # Example
//!
//! ```rust
//! use lucent_core::shape::rounded_rect_sdf;
//! use lucent_core::Point;
//!
//! // Center of a 200x44 capsule sits 22pt inside the boundary.
//! let d = rounded_rect_sdf(Point::new(0.0, 0.0), (100.0, 22.0), 22.0);
//! assert!((d + 22.0).abs() < 1e-4);
//! ```

pub mod config;
pub mod error;
pub mod fsm;
pub mod geometry;
pub mod host;
pub mod paint;
pub mod shape;
pub mod ticker;
pub mod transaction;

pub use config::{CaptureSettings, EffectConfiguration, Settings};
pub use error::{Error, Result};
pub use fsm::{StateMachine, SurfaceEvent, SurfaceState};
pub use geometry::{PixelSize, Point, Rect, Size, Transform};
pub use host::{CaptureRegion, CaptureSource, CompositorHost, LayerChange, LayerRole};
pub use paint::PaintBuffer;
pub use ticker::FrameTicker;
pub use transaction::LayoutTransaction;
