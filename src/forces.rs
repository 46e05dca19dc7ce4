//! Per-frame forces acting on the particle store.
//!
//! A [`ForceModel`] is an ordered list of [`Force`]s assembled for the
//! current mode, configuration and input snapshot. Running it clears the
//! store's force buffers and lets each force add its contribution:
//!
//! - **accelerations** are integrated by the integrator (`v += a * dt`)
//! - **impulses** are velocity perturbations added as-is; they already
//!   carry their own frame scaling
//!
//! Forces never touch positions or velocities. The one position-space
//! policy, the hard containment sphere of the cloud modes, is applied after
//! integration by [`contain_hard`].
//!
//! ```ignore
//! let model = ForceModel::for_mode(&mode, &config, &input, clock.elapsed());
//! model.compute(&mut store, dt, &mut rng);
//! ```

use crate::config::{Mode, SimulationConfig, MIN_MASS};
use crate::input::FrameInput;
use crate::spawn::RandomSource;
use crate::store::{finite_or, ParticleStore};
use glam::Vec3;

/// Squared length below which a direction is treated as degenerate.
const MIN_DIRECTION_SQ: f32 = 1e-6;

/// Largest jitter impulse at full audio level and reactivity 1.
const AUDIO_JITTER: f32 = 0.02;

/// A single contribution to particle motion.
#[derive(Clone, Debug, PartialEq)]
pub enum Force {
    /// Pull toward a central mass at the origin.
    ///
    /// `a = G * M * m / max(min_distance², d²) / max(0.1, m)` along the
    /// direction to the origin. Particles sitting on the origin feel nothing.
    CentralGravity {
        constant: f32,
        mass: f32,
        min_distance: f32,
    },

    /// Smooth time-varying noise field added to velocity.
    ///
    /// Sampled from `position * scale` and `time * time_scale`; the impulse
    /// is `noise * strength * dt`.
    Turbulence {
        strength: f32,
        scale: f32,
        time: f32,
        time_scale: f32,
    },

    /// Pointer attraction (positive `strength`) or repulsion (negative).
    ///
    /// Inside `radius`, acceleration toward `point` is
    /// `(radius - distance) * strength`.
    Pointer { point: Vec3, radius: f32, strength: f32 },

    /// Constant inward velocity nudge beyond `radius`.
    SoftContainment { radius: f32, nudge: f32 },

    /// Random velocity jitter of up to `amount` per axis.
    AudioJitter { amount: f32 },
}

impl Force {
    /// Add this force's contribution to the store's force buffers.
    pub fn apply<R: RandomSource + ?Sized>(&self, store: &mut ParticleStore, dt: f32, rng: &mut R) {
        let mut view = store.force_view();
        let positions = view.positions;

        match *self {
            Force::CentralGravity {
                constant,
                mass,
                min_distance,
            } => {
                let min_dist_sq = min_distance * min_distance;
                for (i, acc) in view.accelerations.iter_mut().enumerate() {
                    let to_center = -positions[i];
                    let dist_sq = to_center.length_squared();
                    if dist_sq < MIN_DIRECTION_SQ {
                        continue;
                    }
                    let m = view.masses.map_or(1.0, |masses| masses[i]);
                    let force = constant * mass * m / dist_sq.max(min_dist_sq);
                    *acc += to_center / dist_sq.sqrt() * (force / m.max(MIN_MASS));
                }
            }

            Force::Turbulence {
                strength,
                scale,
                time,
                time_scale,
            } => {
                let phase = time * time_scale;
                for (i, impulse) in view.impulses.iter_mut().enumerate() {
                    *impulse += turbulence(positions[i] * scale, phase) * strength * dt;
                }
            }

            Force::Pointer {
                point,
                radius,
                strength,
            } => {
                for (i, acc) in view.accelerations.iter_mut().enumerate() {
                    let to_point = point - positions[i];
                    let dist_sq = to_point.length_squared();
                    if dist_sq < MIN_DIRECTION_SQ || dist_sq >= radius * radius {
                        continue;
                    }
                    let dist = dist_sq.sqrt();
                    *acc += to_point / dist * ((radius - dist) * strength);
                }
            }

            Force::SoftContainment { radius, nudge } => {
                let radius_sq = radius * radius;
                for (i, impulse) in view.impulses.iter_mut().enumerate() {
                    let p = positions[i];
                    if p.length_squared() > radius_sq {
                        *impulse -= p.normalize_or_zero() * nudge;
                    }
                }
            }

            Force::AudioJitter { amount } => {
                for impulse in view.impulses.iter_mut() {
                    *impulse += Vec3::new(rng.signed(), rng.signed(), rng.signed()) * amount;
                }
            }
        }
    }
}

/// The ordered force pipeline for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForceModel {
    forces: Vec<Force>,
}

impl ForceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a force; forces run in insertion order.
    pub fn with(mut self, force: Force) -> Self {
        self.forces.push(force);
        self
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    /// Assemble the forces active this frame.
    ///
    /// | Mode | Forces |
    /// |------|--------|
    /// | Galaxy | gravity (if enabled), pointer, soft containment, audio jitter |
    /// | Particle / EmitterCloud | turbulence, pointer, audio jitter |
    ///
    /// Pointer and audio forces only appear while those inputs are active.
    pub fn for_mode(mode: &Mode, config: &SimulationConfig, input: &FrameInput, time: f32) -> Self {
        let mut model = Self::new();

        match mode {
            Mode::Galaxy(params) => {
                if params.gravity_enabled {
                    model = model.with(Force::CentralGravity {
                        constant: params.gravity_constant,
                        mass: params.black_hole_mass.max(MIN_MASS),
                        min_distance: params.min_distance,
                    });
                }
            }
            Mode::Particle(params) => {
                if config.turbulence > 0.0 {
                    model = model.with(Force::Turbulence {
                        strength: config.turbulence,
                        scale: params.turbulence_scale,
                        time,
                        time_scale: params.turbulence_time_scale,
                    });
                }
            }
            Mode::EmitterCloud(params) => {
                if config.turbulence > 0.0 {
                    model = model.with(Force::Turbulence {
                        strength: config.turbulence,
                        scale: params.turbulence_scale,
                        time,
                        time_scale: params.turbulence_time_scale,
                    });
                }
            }
        }

        if let Some(point) = input.pointer.interaction_point() {
            let strength = config.interactive_force();
            if strength != 0.0 {
                model = model.with(Force::Pointer {
                    point,
                    radius: influence_radius(config, input),
                    strength,
                });
            }
        }

        if let Mode::Galaxy(params) = mode {
            model = model.with(Force::SoftContainment {
                radius: params.containment_radius(),
                nudge: params.containment_nudge,
            });
        }

        if let Some(level) = input.audio.level() {
            let amount = level * config.audio_reactivity * AUDIO_JITTER;
            if amount > 0.0 {
                model = model.with(Force::AudioJitter { amount });
            }
        }

        model
    }

    /// Clear the force buffers and run every force in order.
    pub fn compute<R: RandomSource + ?Sized>(
        &self,
        store: &mut ParticleStore,
        dt: f32,
        rng: &mut R,
    ) {
        store.clear_forces();
        for force in &self.forces {
            force.apply(store, dt, rng);
        }
    }
}

/// Pointer influence radius at the current camera distance.
///
/// Zooming out widens the radius so the pointer covers the same share of
/// the screen.
pub fn influence_radius(config: &SimulationConfig, input: &FrameInput) -> f32 {
    let distance = finite_or(input.camera_distance, config.reference_camera_distance).max(0.0);
    config.influence_radius * distance / config.reference_camera_distance.max(1e-3)
}

/// Pull every particle outside `radius` back onto the sphere.
///
/// Returns how many particles were clamped.
pub fn contain_hard(store: &mut ParticleStore, radius: f32) -> usize {
    let radius_sq = radius * radius;
    let mut clamped = 0;
    for p in store.positions_mut() {
        if p.length_squared() > radius_sq {
            *p = p.normalize_or_zero() * radius;
            clamped += 1;
        }
    }
    clamped
}

/// Single-argument noise building block.
#[inline]
fn noise(x: f32) -> f32 {
    x.sin() * (x * 0.7 + 1.3).cos()
}

/// Smooth vector field; each axis samples a different pair of coordinates.
fn turbulence(p: Vec3, phase: f32) -> Vec3 {
    Vec3::new(
        noise(p.y + phase) + noise(p.z * 1.3 - phase),
        noise(p.z + phase * 1.1) + noise(p.x * 1.3 - phase),
        noise(p.x + phase * 0.9) + noise(p.y * 1.3 - phase),
    ) * 0.5
}
