//! Rate-limited frame ticker
//!
//! Replaces an implicit display-link subscription with an explicit object:
//! the host calls [`FrameTicker::tick`] from its per-frame callback on the UI
//! thread, and the ticker decides whether enough wall-clock time has passed
//! to render again.

use std::time::{Duration, Instant};

/// Decides which host frame callbacks become renders
#[derive(Clone, Debug)]
pub struct FrameTicker {
    running: bool,
    min_interval: Duration,
    last_render: Option<Instant>,
    target_fps: u32,
}

impl FrameTicker {
    pub fn new(target_fps: u32) -> Self {
        let mut ticker = Self {
            running: false,
            min_interval: Duration::ZERO,
            last_render: None,
            target_fps: 0,
        };
        ticker.set_target_fps(target_fps);
        ticker
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        let fps = fps.max(1);
        self.target_fps = fps;
        self.min_interval = Duration::from_secs_f64(1.0 / fps as f64);
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop immediately; no tick returns true after this until `start`
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Record a render that happened outside the tick path
    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_render = Some(now);
    }

    /// Returns true (and records `now`) when a render is due
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        let due = match self.last_render {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        };
        if due {
            self.last_render = Some(now);
        }
        due
    }
}

impl Default for FrameTicker {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_ticker_never_fires() {
        let mut ticker = FrameTicker::new(60);
        assert!(!ticker.tick(Instant::now()));
    }

    #[test]
    fn test_rate_limited_to_target() {
        let mut ticker = FrameTicker::new(60);
        ticker.start();
        let t0 = Instant::now();

        assert!(ticker.tick(t0));
        // A 120 Hz display calls back every ~8.3ms; only every other one renders.
        assert!(!ticker.tick(t0 + Duration::from_micros(8_333)));
        assert!(ticker.tick(t0 + Duration::from_micros(16_700)));
    }

    #[test]
    fn test_stop_is_immediate() {
        let mut ticker = FrameTicker::new(30);
        ticker.start();
        let t0 = Instant::now();
        assert!(ticker.tick(t0));
        ticker.stop();
        assert!(!ticker.tick(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let ticker = FrameTicker::new(0);
        assert_eq!(ticker.target_fps(), 1);
        assert_eq!(ticker.min_interval(), Duration::from_secs(1));
    }
}
