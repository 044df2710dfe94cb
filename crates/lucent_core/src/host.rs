//! Contracts the host UI framework implements
//!
//! Lucent never walks a view hierarchy itself. A view that wants glass hands
//! the controller a [`CaptureSource`] (what is behind me, and how to paint
//! it) and a [`CompositorHost`] (where my layers go).

use crate::geometry::{PixelSize, Rect, Transform};
use crate::paint::PaintBuffer;

/// The region a capture covers, resolved to pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureRegion {
    /// View bounds mapped into global (window) points
    pub global_rect: Rect,
    /// Target bitmap size in pixels
    pub pixel_size: PixelSize,
    /// Pixels per global point in the target bitmap
    pub pixels_per_point: f32,
}

/// A view whose backdrop can be captured
///
/// All methods are called on the UI thread.
pub trait CaptureSource {
    /// Current bounds in view-local points
    fn bounds(&self) -> Rect;

    /// Transform from view-local points to global points
    fn transform(&self) -> Transform;

    /// Display pixel density (points to pixels)
    fn scale_factor(&self) -> f32;

    /// Whether the view is currently in a displayed hierarchy
    fn is_attached(&self) -> bool;

    /// Hide or restore the view itself for the duration of a capture.
    ///
    /// Must take effect without implicit animation.
    fn set_capture_hidden(&self, hidden: bool);

    /// Rasterize everything visible within `region` into `target`
    /// synchronously. `target` is already cleared and sized to
    /// `region.pixel_size`.
    fn rasterize(&self, target: &mut PaintBuffer, region: &CaptureRegion);
}

/// Layers the controller positions on every layout pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// The presentation surface carrying the composited glass
    Glass,
    /// The opaque overlay shown while a knob is inactive
    InactiveOverlay,
}

/// One geometry mutation inside a layout transaction
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerChange {
    Frame { layer: LayerRole, frame: Rect },
    Opacity { layer: LayerRole, opacity: f32 },
    Scale { layer: LayerRole, x: f32, y: f32 },
    DrawableSize { layer: LayerRole, size: PixelSize },
}

/// The platform compositor the controller's layers live in
pub trait CompositorHost {
    /// Apply a batch of changes atomically, with implicit animation disabled
    fn apply_layout(&self, changes: &[LayerChange]);
}
