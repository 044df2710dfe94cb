//! Fixed-duration eased transitions
//!
//! A tween runs from its current value to a target over a set duration.
//! Retargeting mid-flight restarts from wherever the value is now, so a knob
//! that is released halfway through its activation fades back smoothly.

use crate::easing::Easing;

/// A single eased value transition
#[derive(Clone, Copy, Debug)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl Tween {
    /// A settled tween resting at `value`
    pub fn at(value: f32, duration_secs: f32, easing: Easing) -> Self {
        Self {
            from: value,
            to: value,
            duration: duration_secs.max(0.0),
            elapsed: duration_secs.max(0.0),
            easing,
        }
    }

    /// Start animating from the current value toward `target`
    pub fn animate_to(&mut self, target: f32) {
        if (target - self.to).abs() < f32::EPSILON && !self.is_running() {
            return;
        }
        self.from = self.value();
        self.to = target;
        self.elapsed = 0.0;
    }

    /// Jump to `value` without animating
    pub fn snap_to(&mut self, value: f32) {
        self.from = value;
        self.to = value;
        self.elapsed = self.duration;
    }

    /// Advance by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if self.is_running() {
            self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn value(&self) -> f32 {
        let eased = self.easing.apply(self.progress());
        self.from + (self.to - self.from) * eased
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_running(&self) -> bool {
        self.elapsed < self.duration
    }
}
