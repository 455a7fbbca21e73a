//! Eased programmatic scrolling.
//!
//! The host owns one [`ScrollTweener`] per scroll container and calls
//! [`ScrollTweener::tick`] from its frame loop, applying the returned offset.

use std::time::{Duration, Instant};

use crate::config::TimelineConfig;

/// `easeOutQuint(t, b, c, d)`: starts fast, settles at `b + c` when `t == d`.
pub fn ease_out_quint(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (t.powi(5) + 1.0) + b
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    started: Instant,
    duration: Duration,
}

impl Tween {
    pub fn new(from: f64, to: f64, started: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    pub fn is_done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        if self.is_done(now) {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        ease_out_quint(
            elapsed,
            self.from,
            self.to - self.from,
            self.duration.as_secs_f64(),
        )
    }
}

/// Tracks the last started tween. Starting a new one replaces it.
#[derive(Debug, Clone)]
pub struct ScrollTweener {
    duration: Duration,
    last: Option<Tween>,
}

impl Default for ScrollTweener {
    fn default() -> Self {
        Self::from_config(&TimelineConfig::default())
    }
}

impl ScrollTweener {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last: None,
        }
    }

    pub fn from_config(config: &TimelineConfig) -> Self {
        Self::new(Duration::from_millis(config.tween_duration_ms))
    }

    pub fn scroll_to(&mut self, current: f64, y: f64, now: Instant) {
        self.last = Some(Tween::new(current, y, now, self.duration));
    }

    /// Scroll relative to `current`. With `append_to_last`, a delta in the
    /// same direction as the running tween extends that tween's target, so
    /// repeated page-downs accumulate instead of restarting from wherever the
    /// animation happens to be.
    pub fn scroll_by(&mut self, current: f64, delta: f64, append_to_last: bool, now: Instant) {
        let mut from_target = current;
        if append_to_last && let Some(last) = self.last {
            let running_up = last.to < current;
            let going_up = delta < 0.0;
            if running_up == going_up {
                from_target = last.to;
            }
        }
        self.scroll_to(current, from_target + delta, now);
    }

    /// Offset to apply this frame, if a tween is running. The final frame
    /// returns the exact target and clears the tween.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let tween = self.last?;
        if tween.is_done(now) {
            self.last = None;
        }
        Some(tween.value_at(now))
    }

    pub fn cancel(&mut self) {
        self.last = None;
    }

    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    pub fn target(&self) -> Option<f64> {
        self.last.map(|t| t.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn easing_hits_both_end_points() {
        assert_eq!(ease_out_quint(0.0, 10.0, 90.0, 350.0), 10.0);
        assert_eq!(ease_out_quint(350.0, 10.0, 90.0, 350.0), 100.0);
        // Front-loaded: more than half the distance in the first fifth.
        assert!(ease_out_quint(70.0, 0.0, 100.0, 350.0) > 50.0);
    }

    #[test]
    fn tick_runs_to_target_then_stops() {
        let t0 = Instant::now();
        let mut tweener = ScrollTweener::default();
        tweener.scroll_to(0.0, 500.0, t0);

        let mid = tweener.tick(t0 + 100 * MS).expect("running");
        assert!(mid > 0.0 && mid < 500.0);
        assert_eq!(tweener.tick(t0 + 350 * MS), Some(500.0));
        assert!(!tweener.is_active());
        assert_eq!(tweener.tick(t0 + 400 * MS), None);
    }

    #[test]
    fn appending_in_same_direction_extends_target() {
        let t0 = Instant::now();
        let mut tweener = ScrollTweener::default();
        tweener.scroll_by(0.0, 95.0, true, t0);
        tweener.scroll_by(40.0, 95.0, true, t0 + 50 * MS);
        assert_eq!(tweener.target(), Some(190.0));

        // Reversing starts from the current offset.
        tweener.scroll_by(60.0, -95.0, true, t0 + 60 * MS);
        assert_eq!(tweener.target(), Some(-35.0));

        tweener.scroll_by(60.0, 10.0, false, t0 + 70 * MS);
        assert_eq!(tweener.target(), Some(70.0));
    }

    #[test]
    fn cancel_drops_running_tween() {
        let t0 = Instant::now();
        let mut tweener = ScrollTweener::default();
        tweener.scroll_to(0.0, 100.0, t0);
        tweener.cancel();
        assert_eq!(tweener.tick(t0 + MS), None);
    }
}
