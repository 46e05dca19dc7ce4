//! Color schemes and audio color pulsing.
//!
//! Drifting and emitter clouds are colored from a three-stop [`ColorScheme`].
//! Galaxy populations use their own physically motivated palettes (see
//! [`crate::galaxy`]) and ignore the scheme.
//!
//! # Presets
//!
//! | Name | Description |
//! |------|-------------|
//! | `cosmic` | Violet through magenta to pale cyan (default) |
//! | `fire` | Deep red through orange to yellow-white |
//! | `ocean` | Navy through teal to foam white |
//! | `aurora` | Green through cyan to violet |
//! | `neon` | Hot pink, electric blue, acid green |

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A three-color set used to tint cloud particles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub primary: Vec3,
    pub secondary: Vec3,
    pub accent: Vec3,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::cosmic()
    }
}

impl ColorScheme {
    /// Build a scheme from three RGB colors; channels are clamped to `[0, 1]`.
    pub fn new(primary: Vec3, secondary: Vec3, accent: Vec3) -> Self {
        Self {
            primary: primary.clamp(Vec3::ZERO, Vec3::ONE),
            secondary: secondary.clamp(Vec3::ZERO, Vec3::ONE),
            accent: accent.clamp(Vec3::ZERO, Vec3::ONE),
        }
    }

    // =========================================================================
    // PRESETS
    // =========================================================================

    pub fn cosmic() -> Self {
        Self::new(
            Vec3::new(0.45, 0.20, 0.85), // Violet
            Vec3::new(0.90, 0.30, 0.70), // Magenta
            Vec3::new(0.60, 0.95, 1.00), // Pale cyan
        )
    }

    pub fn fire() -> Self {
        Self::new(
            Vec3::new(0.70, 0.05, 0.00),
            Vec3::new(1.00, 0.45, 0.05),
            Vec3::new(1.00, 0.95, 0.70),
        )
    }

    pub fn ocean() -> Self {
        Self::new(
            Vec3::new(0.02, 0.10, 0.40),
            Vec3::new(0.00, 0.60, 0.65),
            Vec3::new(0.85, 0.97, 1.00),
        )
    }

    pub fn aurora() -> Self {
        Self::new(
            Vec3::new(0.10, 0.90, 0.40),
            Vec3::new(0.10, 0.75, 0.90),
            Vec3::new(0.55, 0.25, 0.90),
        )
    }

    pub fn neon() -> Self {
        Self::new(
            Vec3::new(1.00, 0.10, 0.60),
            Vec3::new(0.10, 0.40, 1.00),
            Vec3::new(0.60, 1.00, 0.10),
        )
    }

    /// Look up a preset by name (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cosmic" => Some(Self::cosmic()),
            "fire" => Some(Self::fire()),
            "ocean" => Some(Self::ocean()),
            "aurora" => Some(Self::aurora()),
            "neon" => Some(Self::neon()),
            _ => None,
        }
    }

    /// Names accepted by [`ColorScheme::named`].
    pub const PRESET_NAMES: [&'static str; 5] = ["cosmic", "fire", "ocean", "aurora", "neon"];

    /// The three color stops in order.
    pub fn stops(&self) -> [Vec3; 3] {
        [self.primary, self.secondary, self.accent]
    }

    /// Color along the gradient primary → secondary → accent, `t` in `[0, 1]`.
    pub fn color_at(&self, t: f32) -> Vec3 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if t < 0.5 {
            self.primary.lerp(self.secondary, t * 2.0)
        } else {
            self.secondary.lerp(self.accent, (t - 0.5) * 2.0)
        }
    }
}

/// Brighten `base` by `amount` (0 = unchanged), saturating at white.
pub fn pulse_color(base: Vec3, amount: f32) -> Vec3 {
    let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    (base * (1.0 + amount)).min(Vec3::ONE)
}
