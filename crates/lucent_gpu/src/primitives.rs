//! GPU uniform layouts
//!
//! Defines GPU-ready data structures that match the shader uniform layouts.
//! All structures use `#[repr(C)]` and implement `bytemuck::Pod` for safe
//! GPU buffer copies.

use lucent_core::{EffectConfiguration, PixelSize};

/// Blur radii at or below this are treated as "no blur"
pub const BLUR_EPSILON: f32 = 0.01;

/// Largest half-kernel the blur shader evaluates (center + 63 taps)
pub const MAX_BLUR_WEIGHTS: usize = 64;

/// Gaussian support is cut at three standard deviations
const SIGMA_SUPPORT: f32 = 3.0;

/// Largest sigma whose 3-sigma support still fits in the kernel
pub const MAX_BLUR_SIGMA: f32 = (MAX_BLUR_WEIGHTS - 1) as f32 / SIGMA_SUPPORT;

/// Uniforms for the glass shader
///
/// Memory layout (48 bytes total):
/// - size: `vec2<f32>` (8 bytes) - surface size in pixels
/// - corner_radius, edge_width, distortion_strength, is_dark, scale, _pad:
///   6 x `f32` (24 bytes)
/// - aux: `vec4<f32>` (16 bytes) - shadow radius (px), shadow opacity,
///   chroma multiplier, rim intensity
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderUniforms {
    pub size: [f32; 2],
    /// Corner radius in pixels, clamped to what the shape can hold
    pub corner_radius: f32,
    /// Edge band width in pixels
    pub edge_width: f32,
    pub distortion_strength: f32,
    /// 1.0 for dark appearance, 0.0 for light
    pub is_dark: f32,
    /// Device pixels per point
    pub scale: f32,
    pub _pad: f32,
    pub aux: [f32; 4],
}

impl RenderUniforms {
    /// Resolve a configuration against the drawable it will be drawn into
    pub fn new(cfg: &EffectConfiguration, scale: f32, size: PixelSize) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let width = size.width as f32;
        let height = size.height as f32;

        let shadow_radius = cfg.aux[0].max(0.0) * scale;
        let max_radius = ((width.min(height) * 0.5) - shadow_radius).max(0.0);

        Self {
            size: [width, height],
            corner_radius: (cfg.corner_radius * scale).clamp(0.0, max_radius),
            edge_width: cfg.edge_width.max(0.0) * scale,
            distortion_strength: cfg.distortion_strength.max(0.0),
            is_dark: if cfg.is_dark { 1.0 } else { 0.0 },
            scale,
            _pad: 0.0,
            aux: [shadow_radius, cfg.aux[1], cfg.aux[2], cfg.aux[3]],
        }
    }
}

/// Uniforms for one separable Gaussian pass
///
/// Memory layout (288 bytes total):
/// - direction: `vec2<f32>` (8 bytes) - (1, 0) or (0, 1)
/// - texel_size: `vec2<f32>` (8 bytes) - inverse texture size
/// - taps: `u32` (4 bytes) - samples on each side of the center
/// - _pad: 3 x `u32` (12 bytes)
/// - weights: `array<vec4<f32>, 16>` (256 bytes) - half kernel, center first
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniforms {
    pub direction: [f32; 2],
    pub texel_size: [f32; 2],
    pub taps: u32,
    pub _pad: [u32; 3],
    pub weights: [[f32; 4]; MAX_BLUR_WEIGHTS / 4],
}

impl BlurUniforms {
    pub fn horizontal(size: PixelSize, sigma: f32) -> Self {
        Self::new([1.0, 0.0], size, sigma)
    }

    pub fn vertical(size: PixelSize, sigma: f32) -> Self {
        Self::new([0.0, 1.0], size, sigma)
    }

    fn new(direction: [f32; 2], size: PixelSize, sigma: f32) -> Self {
        let (taps, half) = gaussian_weights(sigma);
        let mut weights = [[0.0; 4]; MAX_BLUR_WEIGHTS / 4];
        for (i, w) in half.iter().enumerate() {
            weights[i / 4][i % 4] = *w;
        }
        Self {
            direction,
            texel_size: [
                1.0 / size.width.max(1) as f32,
                1.0 / size.height.max(1) as f32,
            ],
            taps,
            _pad: [0; 3],
            weights,
        }
    }

    pub fn weight(&self, i: usize) -> f32 {
        self.weights[i / 4][i % 4]
    }
}

/// Half of a normalized Gaussian kernel for `sigma` (pixels).
///
/// Returns the tap count on each side and the weights, center first, such
/// that `w[0] + 2 * sum(w[1..=taps]) == 1`. Sigma is capped at
/// [`MAX_BLUR_SIGMA`]; a non-positive sigma yields the identity kernel.
pub fn gaussian_weights(sigma: f32) -> (u32, [f32; MAX_BLUR_WEIGHTS]) {
    let mut weights = [0.0f32; MAX_BLUR_WEIGHTS];
    if sigma.is_nan() || sigma <= BLUR_EPSILON {
        weights[0] = 1.0;
        return (0, weights);
    }

    let sigma = sigma.min(MAX_BLUR_SIGMA);
    let taps = ((sigma * SIGMA_SUPPORT).ceil() as usize).clamp(1, MAX_BLUR_WEIGHTS - 1);
    let denom = 2.0 * sigma * sigma;

    let mut total = 0.0;
    for (i, w) in weights.iter_mut().enumerate().take(taps + 1) {
        let x = i as f32;
        *w = (-(x * x) / denom).exp();
        total += if i == 0 { *w } else { 2.0 * *w };
    }
    for w in weights.iter_mut().take(taps + 1) {
        *w /= total;
    }

    (taps as u32, weights)
}
