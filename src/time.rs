//! Simulation clock.
//!
//! The renderer measures wall-clock time; the simulation only sees the
//! deltas it is handed. [`Clock`] turns those raw deltas into the step that
//! is actually integrated:
//!
//! - negative, NaN or infinite deltas become 0
//! - deltas above `max_delta` are clamped (tab resumed after a long pause)
//! - the result is scaled by the time scale (the speed setting)
//! - while paused the step is 0 and elapsed time stands still
//!
//! ```ignore
//! let mut clock = Clock::new(0.05);
//! let step = clock.advance(raw_delta);
//! println!("t={:.2}s frame={}", clock.elapsed(), clock.frame());
//! ```

/// Elapsed simulation time and per-frame step.
#[derive(Clone, Debug, PartialEq)]
pub struct Clock {
    /// Simulation seconds since start (sum of scaled steps).
    elapsed_secs: f32,
    /// Step produced by the last `advance`.
    delta_secs: f32,
    /// Frames advanced since start.
    frame_count: u64,
    /// Largest raw delta accepted.
    max_delta: f32,
    /// Whether time is paused.
    paused: bool,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl Clock {
    /// Create a clock that clamps raw deltas to `max_delta`.
    pub fn new(max_delta: f32) -> Self {
        Self {
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            max_delta: sanitize_delta(max_delta),
            paused: false,
            time_scale: 1.0,
        }
    }

    /// Advance by one frame. Returns the step to integrate.
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        self.frame_count += 1;

        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        self.delta_secs = sanitize_delta(raw_delta).min(self.max_delta) * self.time_scale;
        self.elapsed_secs += self.delta_secs;
        self.delta_secs
    }

    /// Simulation seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Step produced by the last frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Pause time progression.
    ///
    /// While paused, `delta()` returns 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = sanitize_delta(max_delta);
    }

    /// Reset elapsed time and frame count; scale and pause state are kept.
    pub fn reset(&mut self) {
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(0.05)
    }
}

fn sanitize_delta(delta: f32) -> f32 {
    if delta.is_finite() {
        delta.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = Clock::new(0.05);
        assert_eq!(clock.frame(), 0);
        assert!(!clock.is_paused());
        assert_eq!(clock.time_scale(), 1.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_clock_advance() {
        let mut clock = Clock::new(0.05);
        let step = clock.advance(0.016);

        assert!((step - 0.016).abs() < 1e-7);
        assert!((clock.elapsed() - 0.016).abs() < 1e-7);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_adversarial_deltas() {
        let mut clock = Clock::new(0.05);
        assert_eq!(clock.advance(-1.0), 0.0);
        assert_eq!(clock.advance(f32::NAN), 0.0);
        assert_eq!(clock.advance(f32::INFINITY), 0.0);
        assert_eq!(clock.advance(10.0), 0.05);
        assert!((clock.elapsed() - 0.05).abs() < 1e-7);
    }

    #[test]
    fn test_clock_pause() {
        let mut clock = Clock::new(0.05);
        clock.advance(0.01);

        clock.pause();
        assert!(clock.is_paused());

        let elapsed_before = clock.elapsed();
        clock.advance(0.01);

        // Elapsed should not increase while paused
        assert_eq!(clock.elapsed(), elapsed_before);
        assert_eq!(clock.delta(), 0.0);

        clock.resume();
        clock.advance(0.01);
        assert!(clock.elapsed() > elapsed_before);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = Clock::new(0.05);
        clock.set_time_scale(2.0);
        assert!((clock.advance(0.01) - 0.02).abs() < 1e-7);

        // Negative scale should clamp to 0
        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }
}
