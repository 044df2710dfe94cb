//! Animation scheduler
//!
//! Owns every live spring and tween of a control and advances them together.
//! The host drives it from the same frame callback that drives rendering.

use std::time::Instant;

use slotmap::{new_key_type, SlotMap};

use crate::spring::Spring;
use crate::tween::Tween;

new_key_type! {
    pub struct SpringId;
    pub struct TweenId;
}

/// Largest step fed to the integrators; longer gaps (app suspended, debugger)
/// are clamped so springs don't explode on resume.
const MAX_STEP: f32 = 1.0 / 20.0;

/// The animation scheduler that ticks all active animations
pub struct AnimationScheduler {
    springs: SlotMap<SpringId, Spring>,
    tweens: SlotMap<TweenId, Tween>,
    last_frame: Option<Instant>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            springs: SlotMap::with_key(),
            tweens: SlotMap::with_key(),
            last_frame: None,
        }
    }

    pub fn add_spring(&mut self, spring: Spring) -> SpringId {
        self.springs.insert(spring)
    }

    pub fn spring(&self, id: SpringId) -> Option<&Spring> {
        self.springs.get(id)
    }

    pub fn spring_mut(&mut self, id: SpringId) -> Option<&mut Spring> {
        self.springs.get_mut(id)
    }

    pub fn add_tween(&mut self, tween: Tween) -> TweenId {
        self.tweens.insert(tween)
    }

    pub fn tween(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.get(id)
    }

    pub fn tween_mut(&mut self, id: TweenId) -> Option<&mut Tween> {
        self.tweens.get_mut(id)
    }

    /// Tick all animations by wall-clock time since the previous tick
    pub fn tick(&mut self, now: Instant) {
        let dt = match self.last_frame {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame = Some(now);
        self.step(dt);
    }

    /// Advance all animations by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if dt > MAX_STEP {
            tracing::trace!("clamping animation step of {:.3}s", dt);
        }
        let dt = dt.clamp(0.0, MAX_STEP);
        if dt == 0.0 {
            return;
        }
        for (_, spring) in self.springs.iter_mut() {
            spring.step(dt);
        }
        for (_, tween) in self.tweens.iter_mut() {
            tween.tick(dt);
        }
    }

    /// Check if any animations are still active
    pub fn has_active_animations(&self) -> bool {
        self.springs.iter().any(|(_, s)| !s.is_settled())
            || self.tweens.iter().any(|(_, t)| t.is_running())
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}
