//! Particle lifecycle rules for the emitter cloud.
//!
//! Every emitter-cloud particle carries a `life_time` and a `start_time`.
//! Its age is `now - start_time`; once the age reaches the lifetime the
//! particle is reborn in place from an emitter (see [`crate::cloud::respawn`]).
//!
//! While alive, the remaining life fraction `1 - age / life_time` drives
//! its appearance:
//!
//! | Effect | Rule |
//! |--------|------|
//! | Fade out | opacity ramps to 0 over the final `fade_fraction` of life |
//! | Shrink out | size scales from 1.0 at birth down to `min_scale` at death |
//!
//! ```ignore
//! let lifecycle = Lifecycle::new()
//!     .lifetime_range(2.0..5.0)
//!     .fade_out(0.3)
//!     .shrink_out(0.5);
//! ```

use crate::config::CloudParams;
use crate::spawn::RandomSource;
use std::ops::Range;

/// Lifetime sampling plus fade and shrink rules.
#[derive(Clone, Debug, PartialEq)]
pub struct Lifecycle {
    /// Lifetime in seconds, sampled uniformly per particle.
    lifetime_range: Range<f32>,
    /// Final fraction of life over which opacity falls to zero.
    fade_fraction: Option<f32>,
    /// Size multiplier at the moment of death.
    min_scale: Option<f32>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            lifetime_range: 1.0..1.0,
            fade_fraction: None,
            min_scale: None,
        }
    }
}

impl Lifecycle {
    /// Create a lifecycle with a one-second lifetime and no visual effects.
    pub fn new() -> Self {
        Self::default()
    }

    /// The lifecycle used by the emitter cloud.
    pub fn from_params(params: &CloudParams) -> Self {
        Self::new()
            .lifetime_range(params.min_life..params.max_life)
            .fade_out(params.fade_fraction)
            .shrink_out(0.5)
    }

    // =========================================================================
    // BUILDER METHODS
    // =========================================================================

    /// Every particle lives exactly `seconds`.
    pub fn lifetime(mut self, seconds: f32) -> Self {
        let seconds = seconds.max(0.0);
        self.lifetime_range = seconds..seconds;
        self
    }

    /// Each particle lives a random time within `range`.
    pub fn lifetime_range(mut self, range: Range<f32>) -> Self {
        let start = range.start.max(0.0);
        self.lifetime_range = start..range.end.max(start);
        self
    }

    /// Fade opacity to zero over the final `fraction` of life.
    pub fn fade_out(mut self, fraction: f32) -> Self {
        self.fade_fraction = Some(fraction.clamp(0.0, 1.0));
        self
    }

    /// Shrink size toward `min_scale` as the particle ages.
    pub fn shrink_out(mut self, min_scale: f32) -> Self {
        self.min_scale = Some(min_scale.clamp(0.0, 1.0));
        self
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Draw a lifetime for a newly spawned particle.
    pub fn sample_lifetime<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.range(self.lifetime_range.start, self.lifetime_range.end)
    }

    pub fn lifetime_bounds(&self) -> Range<f32> {
        self.lifetime_range.clone()
    }

    /// Remaining life in `[0, 1]`: 1 at birth, 0 at death.
    pub fn life_fraction(age: f32, life_time: f32) -> f32 {
        if life_time <= 0.0 || !life_time.is_finite() || !age.is_finite() {
            return 0.0;
        }
        (1.0 - age / life_time).clamp(0.0, 1.0)
    }

    /// Opacity multiplier for the given remaining life.
    pub fn opacity_factor(&self, life: f32) -> f32 {
        match self.fade_fraction {
            Some(fade) if fade > 0.0 => (life / fade).clamp(0.0, 1.0),
            Some(_) if life > 0.0 => 1.0,
            Some(_) => 0.0,
            None => 1.0,
        }
    }

    /// Size multiplier for the given remaining life.
    pub fn size_factor(&self, life: f32) -> f32 {
        match self.min_scale {
            Some(min) => min + (1.0 - min) * life.clamp(0.0, 1.0),
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::seeded_rng;

    #[test]
    fn test_life_fraction() {
        assert_eq!(Lifecycle::life_fraction(0.0, 2.0), 1.0);
        assert_eq!(Lifecycle::life_fraction(1.0, 2.0), 0.5);
        assert_eq!(Lifecycle::life_fraction(3.0, 2.0), 0.0);
        assert_eq!(Lifecycle::life_fraction(1.0, 0.0), 0.0);
        assert_eq!(Lifecycle::life_fraction(f32::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_fade_only_in_final_fraction() {
        let lifecycle = Lifecycle::new().fade_out(0.3);
        assert_eq!(lifecycle.opacity_factor(1.0), 1.0);
        assert_eq!(lifecycle.opacity_factor(0.5), 1.0);
        assert_eq!(lifecycle.opacity_factor(0.3), 1.0);
        assert!((lifecycle.opacity_factor(0.15) - 0.5).abs() < 1e-6);
        assert_eq!(lifecycle.opacity_factor(0.0), 0.0);
    }

    #[test]
    fn test_shrink_out() {
        let lifecycle = Lifecycle::new().shrink_out(0.5);
        assert_eq!(lifecycle.size_factor(1.0), 1.0);
        assert_eq!(lifecycle.size_factor(0.0), 0.5);
        assert_eq!(Lifecycle::new().size_factor(0.0), 1.0);
    }

    #[test]
    fn test_sample_lifetime_in_range() {
        let lifecycle = Lifecycle::new().lifetime_range(2.0..5.0);
        let mut rng = seeded_rng(11);
        for _ in 0..200 {
            let life = lifecycle.sample_lifetime(&mut rng);
            assert!((2.0..=5.0).contains(&life));
        }
    }

    #[test]
    fn test_from_params() {
        let params = CloudParams::default();
        let lifecycle = Lifecycle::from_params(&params);
        assert_eq!(
            lifecycle.lifetime_bounds(),
            params.min_life..params.max_life
        );
    }
}
