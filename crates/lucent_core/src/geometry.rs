//! Geometry primitives
//!
//! Points and sizes are in points (logical units) unless the type says
//! otherwise; [`PixelSize`] is always device pixels.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }

    /// Scale to device pixels, rounding to the nearest pixel.
    ///
    /// Negative or NaN products collapse to zero.
    pub fn to_pixels(self, scale: f32) -> PixelSize {
        let px = |v: f32| {
            let scaled = (v * scale).round();
            if scaled.is_finite() && scaled > 0.0 {
                scaled as u32
            } else {
                0
            }
        };
        PixelSize {
            width: px(self.width),
            height: px(self.height),
        }
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width * 0.5,
            self.origin.y + self.size.height * 0.5,
        )
    }

    /// True when either dimension is non-positive (or NaN)
    pub fn is_degenerate(&self) -> bool {
        !(self.size.width > 0.0 && self.size.height > 0.0)
    }
}

/// Affine transform from view-local points to global (window) points
///
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0   1 |
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub elements: [f32; 6],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(a * p.x + c * p.y + tx, b * p.x + d * p.y + ty)
    }

    /// Bounding box of `rect` after the transform
    pub fn map_rect(&self, rect: Rect) -> Rect {
        let corners = [
            self.apply(rect.origin),
            self.apply(Point::new(rect.origin.x + rect.width(), rect.origin.y)),
            self.apply(Point::new(rect.origin.x, rect.origin.y + rect.height())),
            self.apply(Point::new(
                rect.origin.x + rect.width(),
                rect.origin.y + rect.height(),
            )),
        ];
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for c in corners {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Size in device pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Reject empty sizes with [`Error::InvalidSize`]
    pub fn validated(self) -> Result<Self> {
        if self.is_empty() {
            return Err(Error::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

impl std::fmt::Display for PixelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
