//! CPU reference of the glass shader's shape and color math
//!
//! Every function here has a WGSL twin in `lucent_gpu::shaders::GLASS_SHADER`
//! with the same name and constants, so the shading model can be pinned by
//! unit tests without a GPU.

use crate::geometry::Point;

/// Step used for the central-difference SDF gradient (pixels)
pub const GRADIENT_EPSILON: f32 = 0.5;

/// Light mode: how far shadows are lifted toward white
pub const LIGHT_LIFT: f32 = 0.18;
/// Light mode: how strongly bright pixels resist the lift
pub const LIGHT_DAMPING: f32 = 0.6;
/// Dark mode: the gray everything is compressed toward
pub const DARK_FLOOR: f32 = 0.12;
/// Dark mode: fraction of the original contrast that survives
pub const DARK_MIX: f32 = 0.8;

/// Rim light arrives from the top-left corner (screen space, y down)
pub const LIGHT_DIRECTION: Point = Point {
    x: -std::f32::consts::FRAC_1_SQRT_2,
    y: -std::f32::consts::FRAC_1_SQRT_2,
};

/// Signed distance from `p` (relative to the shape center) to a rounded
/// rectangle with the given half extents and corner radius.
///
/// Negative inside, zero on the boundary, positive outside.
pub fn rounded_rect_sdf(p: Point, half_size: (f32, f32), radius: f32) -> f32 {
    let qx = p.x.abs() - half_size.0 + radius;
    let qy = p.y.abs() - half_size.1 + radius;
    let outside = Point::new(qx.max(0.0), qy.max(0.0)).length();
    qx.max(qy).min(0.0) + outside - radius
}

/// Outward unit normal of the SDF at `p`, from central differences.
///
/// Falls back to straight up where the field is flat.
pub fn sdf_gradient(p: Point, half_size: (f32, f32), radius: f32) -> Point {
    let e = GRADIENT_EPSILON;
    let dx = rounded_rect_sdf(Point::new(p.x + e, p.y), half_size, radius)
        - rounded_rect_sdf(Point::new(p.x - e, p.y), half_size, radius);
    let dy = rounded_rect_sdf(Point::new(p.x, p.y + e), half_size, radius)
        - rounded_rect_sdf(Point::new(p.x, p.y - e), half_size, radius);
    let g = Point::new(dx, dy);
    let len = g.length();
    if len < 1e-4 {
        return Point::new(0.0, -1.0);
    }
    Point::new(g.x / len, g.y / len)
}

/// Distance into the shape normalized over the edge band: 0 on the boundary,
/// 1 once `edge_width` or more inside.
pub fn edge_norm(distance: f32, edge_width: f32) -> f32 {
    if edge_width <= 0.0 {
        return 1.0;
    }
    (-distance / edge_width).clamp(0.0, 1.0)
}

/// Lens falloff `1 - sqrt(1 - (1 - norm)^2)`: 1 at the boundary, 0 past the
/// edge band.
pub fn lens_falloff(norm: f32) -> f32 {
    let t = 1.0 - norm.clamp(0.0, 1.0);
    1.0 - (1.0 - t * t).max(0.0).sqrt()
}

/// Chromatic aberration weight: quadratic, strongest at the edge, zero at
/// the center.
pub fn aberration_weight(norm: f32) -> f32 {
    let t = 1.0 - norm.clamp(0.0, 1.0);
    t * t
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn luma(c: [f32; 3]) -> f32 {
    0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2]
}

/// Tone curve applied to linear color before the rim term
pub fn tone_map(color: [f32; 3], is_dark: bool) -> [f32; 3] {
    if is_dark {
        return color.map(|c| (DARK_FLOOR + (c - DARK_FLOOR) * DARK_MIX).clamp(0.0, 1.0));
    }
    let l = luma(color).clamp(0.0, 1.0);
    let damping = 1.0 - l * l * LIGHT_DAMPING;
    color.map(|c| (c + (1.0 - c) * LIGHT_LIFT * damping).clamp(0.0, 1.0))
}

/// Rim light contribution as (strength, color) for a pixel with outward
/// normal `normal` at normalized edge depth `norm`.
pub fn rim_light(normal: Point, norm: f32, intensity: f32) -> (f32, [f32; 3]) {
    const WHITE_RIM: [f32; 3] = [1.0, 1.0, 1.0];
    const BLUE_RIM: [f32; 3] = [0.55, 0.7, 1.0];

    let facing = normal.x * LIGHT_DIRECTION.x + normal.y * LIGHT_DIRECTION.y;
    let t = facing * 0.5 + 0.5;
    let color = [0, 1, 2].map(|i| BLUE_RIM[i] + (WHITE_RIM[i] - BLUE_RIM[i]) * t);
    let strength = (1.0 - norm.clamp(0.0, 1.0)).powi(3) * intensity.max(0.0);
    (strength, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_sdf_zero_on_corner_arcs() {
        let (hx, hy, r) = (100.0, 22.0, 12.0);
        let off = r * std::f32::consts::FRAC_1_SQRT_2;
        for (sx, sy) in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            let p = Point::new(sx * (hx - r + off), sy * (hy - r + off));
            assert!(rounded_rect_sdf(p, (hx, hy), r).abs() < EPS, "{p:?}");
        }
    }

    #[test]
    fn test_sdf_zero_on_straight_edges() {
        assert!(rounded_rect_sdf(Point::new(100.0, 0.0), (100.0, 22.0), 12.0).abs() < EPS);
        assert!(rounded_rect_sdf(Point::new(0.0, -22.0), (100.0, 22.0), 12.0).abs() < EPS);
    }

    #[test]
    fn test_sdf_center_is_minus_min_half_extent() {
        for r in [0.0, 5.0, 22.0] {
            let d = rounded_rect_sdf(Point::ZERO, (100.0, 22.0), r);
            assert!((d + 22.0).abs() < EPS, "r={r}: {d}");
        }
    }

    #[test]
    fn test_sdf_far_outside_matches_corner_distance() {
        // Sharp corners: exactly Euclidean distance to the corner.
        let p = Point::new(400.0, 300.0);
        let expected = Point::new(400.0 - 100.0, 300.0 - 22.0).length();
        assert!((rounded_rect_sdf(p, (100.0, 22.0), 0.0) - expected).abs() < 1e-3);

        // Rounded corners: within the corner cut-off of the Euclidean value.
        let rounded = rounded_rect_sdf(p, (100.0, 22.0), 8.0);
        assert!((rounded - expected).abs() < 8.0);
        assert!(rounded > expected - 8.0 * (1.0 - std::f32::consts::FRAC_1_SQRT_2) - 1e-3);
    }

    #[test]
    fn test_gradient_points_outward() {
        let n = sdf_gradient(Point::new(99.0, 0.0), (100.0, 22.0), 12.0);
        assert!((n.x - 1.0).abs() < 1e-3 && n.y.abs() < 1e-3);
        let n = sdf_gradient(Point::new(0.0, -21.0), (100.0, 22.0), 12.0);
        assert!((n.y + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_lens_falloff_endpoints() {
        assert!((lens_falloff(0.0) - 1.0).abs() < EPS);
        assert!(lens_falloff(1.0).abs() < EPS);
        // Monotonically decreasing into the shape
        let mut prev = f32::MAX;
        for i in 0..=10 {
            let v = lens_falloff(i as f32 / 10.0);
            assert!(v <= prev);
            prev = v;
        }
    }

    #[test]
    fn test_edge_norm_band() {
        assert_eq!(edge_norm(0.0, 10.0), 0.0);
        assert_eq!(edge_norm(-5.0, 10.0), 0.5);
        assert_eq!(edge_norm(-50.0, 10.0), 1.0);
        assert_eq!(edge_norm(-1.0, 0.0), 1.0);
    }

    #[test]
    fn test_aberration_zero_at_center() {
        assert_eq!(aberration_weight(1.0), 0.0);
        assert_eq!(aberration_weight(0.0), 1.0);
        assert!((aberration_weight(0.5) - 0.25).abs() < EPS);
    }

    #[test]
    fn test_light_tone_lifts_without_blowing_out() {
        let dark_in = tone_map([0.0, 0.0, 0.0], false);
        assert!((dark_in[0] - LIGHT_LIFT).abs() < EPS);

        // Bright pixels are lifted less than dark ones.
        let mid = tone_map([0.5; 3], false)[0] - 0.5;
        let bright = tone_map([0.9; 3], false)[0] - 0.9;
        assert!(bright < mid);
        assert!(tone_map([1.0; 3], false).iter().all(|c| *c <= 1.0));
    }

    #[test]
    fn test_dark_tone_avoids_pure_black() {
        let out = tone_map([0.0; 3], true);
        assert!(out.iter().all(|c| *c > 0.0));
        let white = tone_map([1.0; 3], true);
        assert!(white.iter().all(|c| *c < 1.0));
    }

    #[test]
    fn test_srgb_roundtrip_midpoint() {
        let v = linear_to_srgb(srgb_to_linear(0.5));
        assert!((v - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_rim_light_strongest_at_top_left_edge() {
        let top_left = Point::new(
            -std::f32::consts::FRAC_1_SQRT_2,
            -std::f32::consts::FRAC_1_SQRT_2,
        );
        let (strength, color) = rim_light(top_left, 0.0, 1.0);
        assert!((strength - 1.0).abs() < EPS);
        assert!(color.iter().all(|c| (*c - 1.0).abs() < EPS));

        let (_, away) = rim_light(Point::new(-top_left.x, -top_left.y), 0.0, 1.0);
        assert!(away[2] > away[0]);

        let (inner, _) = rim_light(top_left, 1.0, 1.0);
        assert_eq!(inner, 0.0);
    }
}
