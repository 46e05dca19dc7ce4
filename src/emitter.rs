//! Orbiting point emitters for the emitter cloud.
//!
//! An [`Emitter`] is a moving point source. It travels on a tilted circle
//! around the origin, and particles it (re)spawns appear within
//! [`Emitter::radius`] of its current position, flying outward.
//!
//! The emitter's position is a pure function of simulation time, so nothing
//! has to be stepped per frame and a paused simulation keeps its emitters
//! where they are.
//!
//! ```ignore
//! let emitters = Emitter::ring(&CloudParams::default(), &mut rng);
//! let (position, velocity) = emitters[0].emit(clock.elapsed(), &mut rng);
//! ```

use crate::config::CloudParams;
use crate::spawn::{outward_velocity, RandomSource};
use glam::Vec3;
use std::f32::consts::{FRAC_PI_4, TAU};

/// A point source orbiting the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Emitter {
    /// Radius of the orbit circle.
    pub orbit_radius: f32,
    /// Angular speed along the orbit, radians per second.
    pub orbit_speed: f32,
    /// Orbit angle at time 0.
    pub phase: f32,
    /// Inclination of the orbit plane against the XY plane.
    pub tilt: f32,
    /// Spawn radius around the emitter's position.
    pub radius: f32,
    /// Outward speed of emitted particles.
    pub speed: f32,
}

impl Emitter {
    /// `params.emitter_count` emitters evenly phased around the orbit, each
    /// on its own random tilt and with a slightly different angular speed.
    pub fn ring<R: RandomSource + ?Sized>(params: &CloudParams, rng: &mut R) -> Vec<Emitter> {
        let count = params.emitter_count.max(1);
        (0..count)
            .map(|i| Emitter {
                orbit_radius: params.emitter_orbit_radius * rng.range(0.7, 1.0),
                orbit_speed: params.emitter_orbit_speed * rng.range(0.8, 1.2),
                phase: i as f32 / count as f32 * TAU,
                tilt: rng.signed() * FRAC_PI_4,
                radius: params.emitter_radius,
                speed: params.emission_speed,
            })
            .collect()
    }

    /// Position at simulation time `time`.
    pub fn position_at(&self, time: f32) -> Vec3 {
        let angle = self.phase + self.orbit_speed * time;
        let (sin, cos) = angle.sin_cos();
        let (tilt_sin, tilt_cos) = self.tilt.sin_cos();
        Vec3::new(
            cos * self.orbit_radius,
            sin * self.orbit_radius * tilt_cos,
            sin * self.orbit_radius * tilt_sin,
        )
    }

    /// Spawn position and velocity for a particle emitted at `time`.
    ///
    /// The position lies within `radius` of the emitter; the velocity points
    /// away from the emitter with a speed between half and full `speed`.
    pub fn emit<R: RandomSource + ?Sized>(&self, time: f32, rng: &mut R) -> (Vec3, Vec3) {
        let center = self.position_at(time);
        let position = center + rng.in_sphere(self.radius);
        let speed = self.speed * rng.range(0.5, 1.0);
        let velocity = outward_velocity(rng, position, center, speed);
        (position, velocity)
    }
}
