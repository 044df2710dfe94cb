//! Glass effect configuration
//!
//! [`EffectConfiguration`] is an immutable snapshot. Hosts build a new value
//! and hand it over wholesale; nothing mutates a configuration in place once
//! the controller holds it.
//!
//! [`Settings`] bundles a configuration with capture tuning and can be loaded
//! from TOML presets. Capture tuning can also be overridden at startup from
//! the environment:
//!
//! - `LUCENT_DOWNSAMPLE=0.5`
//! - `LUCENT_TARGET_FPS=120`
//! - `LUCENT_MAX_FRAME_LATENCY=2`

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Smallest downsample factor the capturer accepts
pub const MIN_DOWNSAMPLE: f32 = 0.1;
/// Largest downsample factor (full resolution)
pub const MAX_DOWNSAMPLE: f32 = 1.0;

fn env_f32(name: &str) -> Option<f32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
}

/// Visual parameters of one glass panel
///
/// Lengths are in points; the pipeline scales them to pixels.
///
/// `aux` carries free-form shader parameters:
/// - `aux[0]`: drop shadow radius in points (0 disables the shadow)
/// - `aux[1]`: drop shadow opacity
/// - `aux[2]`: chromatic aberration strength multiplier
/// - `aux[3]`: rim light intensity multiplier
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfiguration {
    pub corner_radius: f32,
    pub is_dark: bool,
    pub edge_width: f32,
    pub distortion_strength: f32,
    /// Gaussian sigma in pixels; 0 disables the blur pass
    pub blur_radius: f32,
    pub aux: [f32; 4],
}

impl Default for EffectConfiguration {
    fn default() -> Self {
        Self {
            corner_radius: 16.0,
            is_dark: false,
            edge_width: 10.0,
            distortion_strength: 0.6,
            blur_radius: 0.0,
            aux: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

impl EffectConfiguration {
    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self.sanitized()
    }

    pub fn with_dark(mut self, is_dark: bool) -> Self {
        self.is_dark = is_dark;
        self
    }

    pub fn with_edge_width(mut self, width: f32) -> Self {
        self.edge_width = width;
        self.sanitized()
    }

    pub fn with_distortion_strength(mut self, strength: f32) -> Self {
        self.distortion_strength = strength;
        self.sanitized()
    }

    pub fn with_blur_radius(mut self, radius: f32) -> Self {
        self.blur_radius = radius;
        self.sanitized()
    }

    /// Drop shadow radius (points) and opacity
    pub fn with_shadow(mut self, radius: f32, opacity: f32) -> Self {
        self.aux[0] = radius;
        self.aux[1] = opacity.clamp(0.0, 1.0);
        self.sanitized()
    }

    pub fn with_aux(mut self, aux: [f32; 4]) -> Self {
        self.aux = aux;
        self.sanitized()
    }

    /// Clamp every length to be non-negative and replace NaN with zero.
    ///
    /// Non-finite `aux` entries fall back to their defaults so that a
    /// sanitized configuration always compares equal to itself.
    pub fn sanitized(mut self) -> Self {
        let clean = |v: f32| if v.is_nan() { 0.0 } else { v.max(0.0) };
        self.corner_radius = clean(self.corner_radius);
        self.edge_width = clean(self.edge_width);
        self.distortion_strength = clean(self.distortion_strength);
        self.blur_radius = clean(self.blur_radius);

        let defaults = Self::default().aux;
        for (value, default) in self.aux.iter_mut().zip(defaults) {
            if !value.is_finite() {
                *value = default;
            }
        }
        self.aux[0] = self.aux[0].max(0.0);
        self.aux[1] = self.aux[1].clamp(0.0, 1.0);
        self
    }
}

/// How the backdrop is sampled and how often it is refreshed
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Resolution multiplier applied on top of the display scale
    pub downsample: f32,
    /// Upper bound on redraws per second while active
    pub target_fps: u32,
    /// Frames the presentation surface may queue (2 = triple buffering)
    pub max_frame_latency: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            downsample: 1.0,
            target_fps: 60,
            max_frame_latency: 2,
        }
    }
}

impl CaptureSettings {
    /// Downsample factor clamped to the supported range
    pub fn downsample(&self) -> f32 {
        clamp_downsample(self.downsample)
    }

    /// Apply `LUCENT_*` environment overrides, clamped to valid ranges
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_f32("LUCENT_DOWNSAMPLE") {
            self.downsample = v;
        }
        if let Some(v) = env_u32("LUCENT_TARGET_FPS") {
            self.target_fps = v;
        }
        if let Some(v) = env_u32("LUCENT_MAX_FRAME_LATENCY") {
            self.max_frame_latency = v;
        }

        self.downsample = clamp_downsample(self.downsample);
        self.target_fps = self.target_fps.clamp(1, 240);
        self.max_frame_latency = self.max_frame_latency.clamp(1, 3);

        tracing::info!(
            "capture settings: downsample={}, target_fps={}, max_frame_latency={}",
            self.downsample,
            self.target_fps,
            self.max_frame_latency
        );

        self
    }
}

/// Clamp a downsample factor into `[MIN_DOWNSAMPLE, MAX_DOWNSAMPLE]`
pub fn clamp_downsample(factor: f32) -> f32 {
    if factor.is_nan() {
        return MAX_DOWNSAMPLE;
    }
    factor.clamp(MIN_DOWNSAMPLE, MAX_DOWNSAMPLE)
}

/// A full preset: effect look plus capture tuning
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub effect: EffectConfiguration,
    pub capture: CaptureSettings,
}

impl Settings {
    /// Parse a TOML preset; missing keys fall back to defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(source)?;
        Ok(Self {
            effect: settings.effect.sanitized(),
            capture: CaptureSettings {
                downsample: clamp_downsample(settings.capture.downsample),
                ..settings.capture
            },
        })
    }
}
