//! Glass knob
//!
//! A knob shows an opaque inactive layer at rest. On activation the glass
//! fades in over it and both grow; while dragging, the knob squeezes along
//! the drag axis in proportion to velocity and springs back on release.
//! Rendering runs only while the glass is visible.

use std::time::Instant;

use lucent_animation::{AnimationScheduler, Easing, Spring, SpringConfig, SpringId, Tween, TweenId};
use lucent_core::{CaptureSource, LayerChange, LayerRole, LayoutTransaction, Rect};
use lucent_gpu::{CaptureDevice, FrameOutcome, GlassRenderer};

use crate::controller::EffectSurface;

/// Cross-fade and scale-up duration in seconds
pub const ACTIVATION_DURATION: f32 = 0.2;

/// Knob scale while active
pub const ACTIVE_SCALE: f32 = 1.35;

/// Squeeze at or above the maximum drag velocity
pub const MAX_SQUEEZE: f32 = 0.3;

/// Scale factors settle to within this
const SQUEEZE_EPSILON: f32 = 1e-3;

/// Vertical squeeze for a drag velocity: `1 - clamp(|v| / max, 0, 1) * 0.3`
pub fn squeeze_for_velocity(velocity: f32, max_velocity: f32) -> f32 {
    if velocity.is_nan() || max_velocity.is_nan() || max_velocity <= 0.0 {
        return 1.0;
    }
    let factor = (velocity.abs() / max_velocity).clamp(0.0, 1.0);
    1.0 - factor * MAX_SQUEEZE
}

/// Layer properties of the knob at one instant
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnobPose {
    pub glass_opacity: f32,
    pub overlay_opacity: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl KnobPose {
    fn changes(&self) -> [LayerChange; 4] {
        [
            LayerChange::Opacity {
                layer: LayerRole::Glass,
                opacity: self.glass_opacity,
            },
            LayerChange::Opacity {
                layer: LayerRole::InactiveOverlay,
                opacity: self.overlay_opacity,
            },
            LayerChange::Scale {
                layer: LayerRole::Glass,
                x: self.scale_x,
                y: self.scale_y,
            },
            LayerChange::Scale {
                layer: LayerRole::InactiveOverlay,
                x: self.scale_x,
                y: self.scale_y,
            },
        ]
    }
}

/// A knob control with a glass active state
pub struct GlassKnob<S, D, R>
where
    S: CaptureSource + ?Sized,
    D: CaptureDevice,
    R: GlassRenderer<Texture = D::Texture>,
{
    surface: EffectSurface<S, D, R>,
    animations: AnimationScheduler,
    /// 0 shows the inactive layer, 1 the glass
    presence: TweenId,
    scale: TweenId,
    squeeze_x: SpringId,
    squeeze_y: SpringId,
    active: bool,
    applied: Option<KnobPose>,
}

impl<S, D, R> GlassKnob<S, D, R>
where
    S: CaptureSource + ?Sized,
    D: CaptureDevice,
    R: GlassRenderer<Texture = D::Texture>,
{
    pub fn new(surface: EffectSurface<S, D, R>) -> Self {
        let mut animations = AnimationScheduler::new();
        let presence = animations.add_tween(Tween::at(0.0, ACTIVATION_DURATION, Easing::EaseOut));
        let scale = animations.add_tween(Tween::at(1.0, ACTIVATION_DURATION, Easing::EaseOut));
        let spring = Spring::new(SpringConfig::squeeze(), 1.0).with_epsilon(SQUEEZE_EPSILON);
        let squeeze_x = animations.add_spring(spring);
        let squeeze_y = animations.add_spring(spring);

        Self {
            surface,
            animations,
            presence,
            scale,
            squeeze_x,
            squeeze_y,
            active: false,
            applied: None,
        }
    }

    pub fn surface(&self) -> &EffectSurface<S, D, R> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut EffectSurface<S, D, R> {
        &mut self.surface
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Target vertical squeeze (1.0 when not dragging)
    pub fn squeeze(&self) -> f32 {
        self.animations
            .spring(self.squeeze_y)
            .map_or(1.0, |spring| spring.target())
    }

    /// Current layer properties
    pub fn pose(&self) -> KnobPose {
        let presence = self.tween_value(self.presence, 0.0);
        let scale = self.tween_value(self.scale, 1.0);
        let spring_value = |id| self.animations.spring(id).map_or(1.0, Spring::value);
        KnobPose {
            glass_opacity: presence,
            overlay_opacity: 1.0 - presence,
            scale_x: scale * spring_value(self.squeeze_x),
            scale_y: scale * spring_value(self.squeeze_y),
        }
    }

    /// Whether any transition or squeeze is still moving
    pub fn is_animating(&self) -> bool {
        self.animations.has_active_animations()
    }

    /// Switch between the inactive layer and the glass
    pub fn set_active(&mut self, active: bool) {
        if active == self.active {
            return;
        }
        self.active = active;
        let (presence, scale) = if active { (1.0, ACTIVE_SCALE) } else { (0.0, 1.0) };
        if let Some(tween) = self.animations.tween_mut(self.presence) {
            tween.animate_to(presence);
        }
        if let Some(tween) = self.animations.tween_mut(self.scale) {
            tween.animate_to(scale);
        }
        if active {
            self.surface.start_rendering();
        } else {
            self.end_drag();
        }
        tracing::debug!("glass knob active: {}", active);
    }

    /// Squeeze for the current drag velocity (points per second)
    pub fn set_drag_velocity(&mut self, velocity: f32, max_velocity: f32) {
        self.set_squeeze(squeeze_for_velocity(velocity, max_velocity));
    }

    /// Spring back to the resting shape
    pub fn end_drag(&mut self) {
        self.set_squeeze(1.0);
    }

    fn set_squeeze(&mut self, squeeze: f32) {
        if let Some(spring) = self.animations.spring_mut(self.squeeze_y) {
            spring.set_target(squeeze);
        }
        if let Some(spring) = self.animations.spring_mut(self.squeeze_x) {
            spring.set_target(2.0 - squeeze);
        }
    }

    /// Lay out the glass and the inactive layer together
    pub fn layout(&mut self, bounds: Rect) {
        self.surface.layout_with(
            bounds,
            [LayerChange::Frame {
                layer: LayerRole::InactiveOverlay,
                frame: bounds.size.to_rect(),
            }],
        );
        self.applied = None;
        self.apply_pose();
    }

    /// Per-frame callback: advance animations, push the pose, then let the
    /// surface render if due
    pub fn on_frame(&mut self, now: Instant) -> Option<FrameOutcome> {
        self.animations.tick(now);
        self.apply_pose();

        // Keep rendering until the glass has faded out
        if !self.active && self.surface.is_active() && !self.presence_running() {
            self.surface.stop_rendering();
        }
        self.surface.on_frame(now)
    }

    fn apply_pose(&mut self) {
        let pose = self.pose();
        if self.applied == Some(pose) {
            return;
        }
        let mut transaction = LayoutTransaction::begin(self.surface.host());
        for change in pose.changes() {
            transaction.push(change);
        }
        transaction.commit();
        self.applied = Some(pose);
    }

    fn presence_running(&self) -> bool {
        self.animations
            .tween(self.presence)
            .is_some_and(Tween::is_running)
    }

    fn tween_value(&self, id: TweenId, default: f32) -> f32 {
        self.animations.tween(id).map_or(default, Tween::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squeeze_at_half_velocity() {
        assert!((squeeze_for_velocity(500.0, 1000.0) - 0.85).abs() < 1e-6);
        assert!((squeeze_for_velocity(-500.0, 1000.0) - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_squeeze_clamps() {
        assert_eq!(squeeze_for_velocity(0.0, 1000.0), 1.0);
        assert!((squeeze_for_velocity(5000.0, 1000.0) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_squeeze_degenerate_inputs() {
        assert_eq!(squeeze_for_velocity(100.0, 0.0), 1.0);
        assert_eq!(squeeze_for_velocity(f32::NAN, 1000.0), 1.0);
    }

    #[test]
    fn test_pose_changes_cover_both_layers() {
        let pose = KnobPose {
            glass_opacity: 0.25,
            overlay_opacity: 0.75,
            scale_x: 1.1,
            scale_y: 0.9,
        };
        let changes = pose.changes();
        assert!(changes.contains(&LayerChange::Opacity {
            layer: LayerRole::InactiveOverlay,
            opacity: 0.75,
        }));
        assert!(changes.contains(&LayerChange::Scale {
            layer: LayerRole::Glass,
            x: 1.1,
            y: 0.9,
        }));
    }
}
