//! Semi-implicit Euler integration and per-frame particle upkeep.
//!
//! One [`step`] runs, in order:
//!
//! 1. **Motion**: `v += a * dt + impulse`, damping, velocity cap, then
//!    `p += v * dt`. Galaxy mode clamps each component of `a * dt` to
//!    `max_accel_step` before adding it.
//! 2. **Containment**: cloud modes clamp positions onto the containment
//!    sphere.
//! 3. **Recycling**: emitter-cloud particles past their lifetime are reborn
//!    from a random emitter.
//! 4. **Appearance**: life fade, audio size and color pulse, always derived
//!    from the base values so effects never compound.
//! 5. **Sanitization**: every non-finite value is replaced.
//!
//! The force buffers must already hold this frame's contributions, see
//! [`crate::forces::ForceModel::compute`].

use crate::cloud;
use crate::config::{Mode, SimulationConfig};
use crate::emitter::Emitter;
use crate::forces::contain_hard;
use crate::input::AudioInput;
use crate::lifecycle::Lifecycle;
use crate::spawn::RandomSource;
use crate::store::{ParticleStore, SanitizeDefaults};
use crate::visuals::pulse_color;
use glam::Vec3;

/// Every n-th particle pulses with the audio.
pub const PULSE_STRIDE: usize = 5;

/// Pulse frequency in radians per simulation second.
const PULSE_RATE: f32 = 6.0;

/// Stability limits for one mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionLimits {
    /// Velocity multiplier applied every step.
    pub damping: f32,
    pub max_velocity: f32,
    /// Per-component cap on `a * dt`, galaxy mode only.
    pub max_accel_step: Option<f32>,
    /// Hard containment radius, cloud modes only.
    pub hard_radius: Option<f32>,
}

impl MotionLimits {
    pub fn for_mode(mode: &Mode, config: &SimulationConfig) -> Self {
        match mode {
            Mode::Galaxy(p) => Self {
                damping: p.damping,
                max_velocity: p.max_velocity,
                max_accel_step: Some(p.max_accel_step),
                hard_radius: None,
            },
            Mode::Particle(p) => Self {
                damping: p.damping,
                max_velocity: p.max_velocity,
                max_accel_step: None,
                hard_radius: Some(config.containment_radius),
            },
            Mode::EmitterCloud(p) => Self {
                damping: p.damping,
                max_velocity: p.max_velocity,
                max_accel_step: None,
                hard_radius: Some(config.containment_radius),
            },
        }
    }
}

/// Integration step for this frame.
///
/// `step` is the clock's clamped and speed-scaled delta. Galaxy mode
/// integrates with its fixed step (scaled by `time_scale`) instead, unless
/// the fixed step is disabled. A zero `step` (paused, or an invalid delta)
/// always yields zero.
pub fn motion_dt(mode: &Mode, step: f32, time_scale: f32) -> f32 {
    if step <= 0.0 {
        return 0.0;
    }
    match mode {
        Mode::Galaxy(p) => p.fixed_step.map_or(step, |fixed| fixed * time_scale),
        _ => step,
    }
}

/// Advance velocities and positions by `dt`.
pub fn integrate(store: &mut ParticleStore, limits: &MotionLimits, dt: f32) {
    let (positions, velocities, accelerations, impulses) = store.motion_mut();
    let max_speed_sq = limits.max_velocity * limits.max_velocity;

    for i in 0..positions.len() {
        let mut dv = accelerations[i] * dt;
        if let Some(cap) = limits.max_accel_step {
            dv = dv.clamp(Vec3::splat(-cap), Vec3::splat(cap));
        }

        let mut v = (velocities[i] + dv + impulses[i]) * limits.damping;
        if v.length_squared() > max_speed_sq {
            v = v.normalize_or_zero() * limits.max_velocity;
        }

        velocities[i] = v;
        positions[i] += v * dt;
    }
}

/// Rescale every velocity faster than `max_velocity` down to it.
///
/// Used on frames that do not move, so freshly generated orbits still
/// respect the cap.
pub fn cap_velocities(store: &mut ParticleStore, max_velocity: f32) {
    let (_, velocities, _, _) = store.motion_mut();
    let max_speed_sq = max_velocity * max_velocity;
    for v in velocities.iter_mut() {
        if v.length_squared() > max_speed_sq {
            *v = v.normalize_or_zero() * max_velocity;
        }
    }
}

/// Rebirth every particle whose age has reached its lifetime.
///
/// Returns the number of recycled particles. Stores without lifetimes are
/// left alone.
pub fn recycle<R: RandomSource + ?Sized>(
    store: &mut ParticleStore,
    emitters: &[Emitter],
    lifecycle: &Lifecycle,
    config: &SimulationConfig,
    now: f32,
    rng: &mut R,
) -> usize {
    let mut recycled = 0;
    for i in 0..store.count() {
        let dead = store.lifetime().is_some_and(|l| l.is_dead(i, now));
        if dead {
            cloud::respawn(
                store,
                i,
                emitters,
                lifecycle,
                &config.color_scheme,
                config.particle_size,
                now,
                rng,
            );
            recycled += 1;
        }
    }
    recycled
}

/// Recompute size, opacity and color from the base values.
pub fn update_appearance(
    store: &mut ParticleStore,
    lifecycle: Option<&Lifecycle>,
    audio: &AudioInput,
    reactivity: f32,
    now: f32,
) {
    let audio_on = audio.is_active() && reactivity > 0.0;
    let pulse_wave = 0.5 + 0.5 * (now * PULSE_RATE).sin();

    for i in 0..store.count() {
        let (size_factor, opacity_factor) = match (lifecycle, store.lifetime()) {
            (Some(lifecycle), Some(lifetime)) => {
                let life = Lifecycle::life_fraction(lifetime.age(i, now), lifetime.life_times[i]);
                (lifecycle.size_factor(life), lifecycle.opacity_factor(life))
            }
            _ => (1.0, 1.0),
        };

        let audio_factor = if audio_on {
            audio.factor(i) * reactivity
        } else {
            0.0
        };
        let audio_scale = if audio_on { 0.5 + audio_factor } else { 1.0 };

        let base_color = store.base_colors()[i];
        let color = if audio_on && i % PULSE_STRIDE == 0 {
            pulse_color(base_color, audio_factor * pulse_wave)
        } else {
            base_color
        };

        let size = store.base_sizes()[i] * size_factor * audio_scale;
        let opacity = store.base_opacities()[i] * opacity_factor;

        store.sizes_mut()[i] = size;
        store.opacities_mut()[i] = opacity;
        store.colors_mut()[i] = color;
    }
}

/// Borrowed frame state needed by [`step`].
pub struct StepContext<'a> {
    pub mode: &'a Mode,
    pub config: &'a SimulationConfig,
    pub audio: &'a AudioInput,
    pub emitters: &'a [Emitter],
    pub lifecycle: Option<&'a Lifecycle>,
    /// Integration step, see [`motion_dt`].
    pub dt: f32,
    /// Simulation time after this frame's advance.
    pub now: f32,
}

/// What a step did, for logging and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub contained: usize,
    pub recycled: usize,
    pub repaired: usize,
}

/// Run one full integration step.
pub fn step<R: RandomSource + ?Sized>(
    store: &mut ParticleStore,
    ctx: &StepContext<'_>,
    rng: &mut R,
) -> StepReport {
    let mut report = StepReport::default();
    let limits = MotionLimits::for_mode(ctx.mode, ctx.config);

    if ctx.dt > 0.0 {
        integrate(store, &limits, ctx.dt);
    } else {
        cap_velocities(store, limits.max_velocity);
    }

    if let Some(radius) = limits.hard_radius {
        report.contained = contain_hard(store, radius);
    }

    if let Some(lifecycle) = ctx.lifecycle {
        report.recycled = recycle(store, ctx.emitters, lifecycle, ctx.config, ctx.now, rng);
    }

    update_appearance(
        store,
        ctx.lifecycle,
        ctx.audio,
        ctx.config.audio_reactivity,
        ctx.now,
    );

    let defaults = SanitizeDefaults {
        size: ctx.config.particle_size,
        opacity: 1.0,
        mass: 1.0,
        life_time: ctx.lifecycle.map_or(1.0, |l| l.lifetime_bounds().start.max(1e-3)),
        now: ctx.now,
    };
    report.repaired = store.sanitize(&defaults);
    if report.repaired > 0 {
        log::warn!("sanitized {} non-finite particle values", report.repaired);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CloudParams, DriftParams, GalaxyParams, ModeKind};
    use crate::spawn::seeded_rng;

    fn galaxy_limits() -> MotionLimits {
        MotionLimits::for_mode(&Mode::default_for(ModeKind::Galaxy), &SimulationConfig::default())
    }

    #[test]
    fn test_motion_dt() {
        let galaxy = Mode::default_for(ModeKind::Galaxy);
        assert_eq!(motion_dt(&galaxy, 0.03, 1.0), 0.016);
        assert_eq!(motion_dt(&galaxy, 0.06, 2.0), 0.032);
        assert_eq!(motion_dt(&galaxy, 0.0, 1.0), 0.0);

        let real = Mode::Galaxy(GalaxyParams {
            fixed_step: None,
            ..Default::default()
        });
        assert_eq!(motion_dt(&real, 0.03, 1.0), 0.03);
        assert_eq!(motion_dt(&Mode::default(), 0.03, 1.0), 0.03);
    }

    #[test]
    fn test_accel_step_clamped_per_component() {
        let mut store = ParticleStore::with_galaxy(1);
        store.accelerations_mut()[0] = Vec3::new(-100.0, 0.5, 0.0);
        let limits = galaxy_limits();
        integrate(&mut store, &limits, 0.016);

        let v = store.velocities()[0];
        assert!((v.x + 0.1 * limits.damping).abs() < 1e-6);
        assert!((v.y - 0.5 * 0.016 * limits.damping).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_capped() {
        let mut store = ParticleStore::with_galaxy(1);
        store.set_motion(0, Vec3::ZERO, Vec3::new(100.0, 100.0, 0.0));
        let limits = galaxy_limits();
        integrate(&mut store, &limits, 0.016);
        assert!(store.velocities()[0].length() <= limits.max_velocity + 1e-5);
    }

    #[test]
    fn test_zero_dt_step_caps_without_moving() {
        let config = SimulationConfig::default();
        let mode = Mode::default_for(ModeKind::Galaxy);
        let limits = galaxy_limits();
        let mut store = ParticleStore::with_galaxy(2);
        store.set_motion(0, Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.0, 10.0, 0.0));
        store.set_motion(1, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0));

        let ctx = StepContext {
            mode: &mode,
            config: &config,
            audio: &AudioInput::default(),
            emitters: &[],
            lifecycle: None,
            dt: 0.0,
            now: 0.0,
        };
        step(&mut store, &ctx, &mut seeded_rng(0));

        let v = store.velocities();
        assert!((v[0].length() - limits.max_velocity).abs() < 1e-5);
        assert!(v[0].x.abs() < 1e-6 && v[0].y > 0.0);
        // Slow particles keep their velocity: no damping on a still frame
        assert_eq!(v[1], Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(store.positions()[0], Vec3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn test_impulse_added_unscaled() {
        let mut store = ParticleStore::new(1);
        store.impulses_mut()[0] = Vec3::new(0.5, 0.0, 0.0);
        let limits = MotionLimits {
            damping: 1.0,
            max_velocity: 10.0,
            max_accel_step: None,
            hard_radius: None,
        };
        integrate(&mut store, &limits, 0.1);
        assert_eq!(store.velocities()[0], Vec3::new(0.5, 0.0, 0.0));
        assert!((store.positions()[0].x - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_step_clamps_drift_positions() {
        let config = SimulationConfig::default();
        let mode = Mode::Particle(DriftParams::default());
        let mut store = ParticleStore::new(1);
        store.set_motion(0, Vec3::new(0.0, 1000.0, 0.0), Vec3::ZERO);

        let ctx = StepContext {
            mode: &mode,
            config: &config,
            audio: &AudioInput::default(),
            emitters: &[],
            lifecycle: None,
            dt: 0.016,
            now: 0.016,
        };
        let report = step(&mut store, &ctx, &mut seeded_rng(0));
        assert_eq!(report.contained, 1);
        assert!(store.positions()[0].length() <= config.containment_radius + 1e-3);
    }

    #[test]
    fn test_step_repairs_nan() {
        let config = SimulationConfig::default();
        let mode = Mode::default_for(ModeKind::Galaxy);
        let mut store = ParticleStore::with_galaxy(2);
        store.positions_mut()[0] = Vec3::NAN;
        store.galaxy_mut().unwrap().masses[1] = f32::INFINITY;

        let ctx = StepContext {
            mode: &mode,
            config: &config,
            audio: &AudioInput::default(),
            emitters: &[],
            lifecycle: None,
            dt: 0.016,
            now: 0.016,
        };
        let report = step(&mut store, &ctx, &mut seeded_rng(0));
        assert!(report.repaired > 0);
        assert!(store.is_finite());
    }

    #[test]
    fn test_recycle_dead_particles() {
        let params = CloudParams::default();
        let mut rng = seeded_rng(6);
        let emitters = Emitter::ring(&params, &mut rng);
        let lifecycle = Lifecycle::from_params(&params);
        let config = SimulationConfig::default();

        let mut store = ParticleStore::with_lifetimes(2);
        {
            let lifetime = store.lifetime_mut().unwrap();
            lifetime.life_times[0] = 2.0;
            lifetime.start_times[0] = 0.0;
            lifetime.life_times[1] = 10.0;
            lifetime.start_times[1] = 0.0;
        }

        let recycled = recycle(&mut store, &emitters, &lifecycle, &config, 2.5, &mut rng);
        assert_eq!(recycled, 1);
        let lifetime = store.lifetime().unwrap();
        assert_eq!(lifetime.start_times[0], 2.5);
        assert_eq!(lifetime.start_times[1], 0.0);
    }

    #[test]
    fn test_appearance_fades_near_death() {
        let lifecycle = Lifecycle::new().fade_out(0.3);
        let mut store = ParticleStore::with_lifetimes(2);
        store.set_appearance(0, Vec3::ONE, 1.0, 1.0);
        store.set_appearance(1, Vec3::ONE, 1.0, 1.0);
        {
            let lifetime = store.lifetime_mut().unwrap();
            lifetime.life_times[0] = 10.0;
            lifetime.life_times[1] = 10.0;
            lifetime.start_times[0] = 0.0;
            lifetime.start_times[1] = -7.5;
        }

        update_appearance(&mut store, Some(&lifecycle), &AudioInput::default(), 1.0, 1.0);
        assert_eq!(store.opacities()[0], 1.0);
        assert!((store.opacities()[1] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_audio_size_and_pulse() {
        let mut store = ParticleStore::new(6);
        for i in 0..6 {
            store.set_appearance(i, Vec3::splat(0.5), 1.0, 1.0);
        }

        let mut audio = AudioInput::default();
        update_appearance(&mut store, None, &audio, 1.0, 0.0);
        assert!(store.sizes().iter().all(|s| *s == 1.0));

        audio.set_level(1.0);
        let now = std::f32::consts::FRAC_PI_2 / PULSE_RATE;
        update_appearance(&mut store, None, &audio, 1.0, now);
        assert!((store.sizes()[1] - 1.5).abs() < 1e-5);
        assert!(store.colors()[0].x > 0.5);
        assert_eq!(store.colors()[1], Vec3::splat(0.5));
        assert_eq!(store.base_colors()[0], Vec3::splat(0.5));

        // Pulses are recomputed from base, not compounded
        let before = store.colors()[0];
        update_appearance(&mut store, None, &audio, 1.0, now);
        assert_eq!(store.colors()[0], before);
    }
}
