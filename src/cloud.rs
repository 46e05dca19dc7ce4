//! Generators for the cloud modes.
//!
//! - [`generate_drift`] scatters a free-floating cloud through a sphere
//!   (Particle mode).
//! - [`generate_emitter_cloud`] seeds every particle from an orbiting
//!   [`Emitter`] with a staggered start time (EmitterCloud mode).
//! - [`respawn`] rebirths a single dead particle in place.
//!
//! Like the galaxy generators they write into `[start, start + count)` of a
//! shared store and never produce non-finite values.

use crate::config::DriftParams;
use crate::emitter::Emitter;
use crate::lifecycle::Lifecycle;
use crate::spawn::RandomSource;
use crate::store::{finite_or, finite_vec, ParticleStore};
use crate::visuals::ColorScheme;

/// Fill `[start, start + count)` with drifting particles. Returns the end index.
///
/// Positions are uniform through a sphere of `params.cloud_radius`, velocities
/// point in random directions with speeds up to `params.initial_speed`, and
/// colors are drawn along the scheme's gradient.
pub fn generate_drift<R: RandomSource + ?Sized>(
    store: &mut ParticleStore,
    start: usize,
    count: usize,
    params: &DriftParams,
    scheme: &ColorScheme,
    particle_size: f32,
    rng: &mut R,
) -> usize {
    let end = (start + count).min(store.count());
    for i in start..end {
        let position = rng.in_sphere(params.cloud_radius);
        let velocity = rng.direction() * rng.range(0.0, params.initial_speed);
        let color = scheme.color_at(rng.next_f32());
        let size = particle_size * rng.range(0.5, 1.5);

        store.set_motion(i, finite_vec(position), finite_vec(velocity));
        store.set_appearance(i, finite_vec(color), finite_or(size, particle_size), 1.0);
    }
    end
}

/// Seed `[start, start + count)` from the emitters at time `now`. Returns the end index.
///
/// Particle `i` belongs to emitter `i % emitters.len()`. Start times are
/// staggered back over one lifetime so deaths are spread out instead of
/// arriving in a single wave.
#[allow(clippy::too_many_arguments)]
pub fn generate_emitter_cloud<R: RandomSource + ?Sized>(
    store: &mut ParticleStore,
    start: usize,
    count: usize,
    emitters: &[Emitter],
    lifecycle: &Lifecycle,
    scheme: &ColorScheme,
    particle_size: f32,
    now: f32,
    rng: &mut R,
) -> usize {
    let end = (start + count).min(store.count());
    if emitters.is_empty() {
        return end;
    }

    for i in start..end {
        let emitter_id = i % emitters.len();
        spawn_from(store, i, emitter_id, emitters, lifecycle, scheme, particle_size, now, rng);

        if let Some(lifetime) = store.lifetime_mut() {
            let life = lifetime.life_times[i];
            lifetime.start_times[i] = now - rng.next_f32() * life;
        }
    }
    end
}

/// Rebirth particle `index` from a randomly chosen emitter at time `now`.
///
/// Every attribute is reset: position within the emitter's radius, outward
/// velocity, fresh lifetime, `start_time = now`, new color and size.
#[allow(clippy::too_many_arguments)]
pub fn respawn<R: RandomSource + ?Sized>(
    store: &mut ParticleStore,
    index: usize,
    emitters: &[Emitter],
    lifecycle: &Lifecycle,
    scheme: &ColorScheme,
    particle_size: f32,
    now: f32,
    rng: &mut R,
) {
    if emitters.is_empty() || index >= store.count() {
        return;
    }
    let emitter_id = rng.index(emitters.len());
    spawn_from(store, index, emitter_id, emitters, lifecycle, scheme, particle_size, now, rng);
}

#[allow(clippy::too_many_arguments)]
fn spawn_from<R: RandomSource + ?Sized>(
    store: &mut ParticleStore,
    index: usize,
    emitter_id: usize,
    emitters: &[Emitter],
    lifecycle: &Lifecycle,
    scheme: &ColorScheme,
    particle_size: f32,
    now: f32,
    rng: &mut R,
) {
    let emitter = &emitters[emitter_id];
    let (position, velocity) = emitter.emit(now, rng);

    // Each emitter owns a stretch of the gradient
    let band = if emitters.len() > 1 {
        emitter_id as f32 / (emitters.len() - 1) as f32
    } else {
        0.5
    };
    let color = scheme.color_at(band + rng.signed() * 0.15);
    let size = particle_size * rng.range(0.7, 1.3);

    store.set_motion(index, finite_vec(position), finite_vec(velocity));
    store.set_appearance(index, finite_vec(color), finite_or(size, particle_size), 1.0);

    let life = lifecycle.sample_lifetime(rng);
    if let Some(lifetime) = store.lifetime_mut() {
        lifetime.life_times[index] = finite_or(life, 1.0).max(1e-3);
        lifetime.start_times[index] = finite_or(now, 0.0);
        lifetime.emitters[index] = emitter_id as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CloudParams;
    use crate::spawn::seeded_rng;

    #[test]
    fn test_drift_fills_range() {
        let mut store = ParticleStore::new(100);
        let mut rng = seeded_rng(1);
        let params = DriftParams::default();
        let end = generate_drift(
            &mut store,
            0,
            100,
            &params,
            &ColorScheme::default(),
            0.2,
            &mut rng,
        );
        assert_eq!(end, 100);
        assert!(store.is_finite());
        for p in store.positions() {
            assert!(p.length() <= params.cloud_radius + 1e-3);
        }
        for v in store.velocities() {
            assert!(v.length() <= params.initial_speed + 1e-4);
        }
    }

    #[test]
    fn test_drift_end_clamped_to_store() {
        let mut store = ParticleStore::new(10);
        let mut rng = seeded_rng(1);
        let end = generate_drift(
            &mut store,
            5,
            50,
            &DriftParams::default(),
            &ColorScheme::default(),
            0.2,
            &mut rng,
        );
        assert_eq!(end, 10);
    }

    #[test]
    fn test_emitter_cloud_staggers_start_times() {
        let params = CloudParams::default();
        let mut rng = seeded_rng(2);
        let emitters = Emitter::ring(&params, &mut rng);
        let lifecycle = Lifecycle::from_params(&params);
        let mut store = ParticleStore::with_lifetimes(50);

        generate_emitter_cloud(
            &mut store,
            0,
            50,
            &emitters,
            &lifecycle,
            &ColorScheme::default(),
            0.2,
            10.0,
            &mut rng,
        );

        let lifetime = store.lifetime().unwrap();
        for i in 0..50 {
            assert_eq!(lifetime.emitters[i] as usize, i % emitters.len());
            assert!(lifetime.start_times[i] <= 10.0);
            assert!(!lifetime.is_dead(i, 10.0));
        }
        assert!(store.is_finite());
    }

    #[test]
    fn test_respawn_resets_particle() {
        let params = CloudParams::default();
        let mut rng = seeded_rng(3);
        let emitters = Emitter::ring(&params, &mut rng);
        let lifecycle = Lifecycle::from_params(&params);
        let mut store = ParticleStore::with_lifetimes(1);

        respawn(
            &mut store,
            0,
            &emitters,
            &lifecycle,
            &ColorScheme::default(),
            0.2,
            4.0,
            &mut rng,
        );

        let lifetime = store.lifetime().unwrap();
        assert_eq!(lifetime.start_times[0], 4.0);
        let emitter = &emitters[lifetime.emitters[0] as usize];
        let distance = store.positions()[0].distance(emitter.position_at(4.0));
        assert!(distance <= emitter.radius + 1e-4);
    }
}
