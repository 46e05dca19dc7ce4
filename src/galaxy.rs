//! Galaxy structure generation.
//!
//! A galaxy is five sub-populations written back to back into one store:
//!
//! | Kind | Shape | Velocity | Color |
//! |------|-------|----------|-------|
//! | Core | oblate bulge, concentrated toward the center | circular orbit | warm white |
//! | Arm | logarithmic spiral arms in the disk | orbit × rotation factor, slight radial drift | blue-white / yellow / orange |
//! | Halo | sparse sphere around the core | random direction, 30% of orbital | reddish orange |
//! | Nebula | gas clumps strung along the arms | 70% of orbital | emission / reflection hues |
//! | Dust | thin annulus in the plane | 80% of orbital | dark brown |
//!
//! The disk lies in the XY plane; Z is height above it. Orbital speed is
//! `sqrt(G * M / max(0.1, r))`, see [`GalaxyParams::orbital_speed`].
//!
//! Every generator takes an explicit [`RandomSource`], so the same seed and
//! parameters always produce the same galaxy.

use crate::config::{GalaxyParams, PopulationFractions, MIN_MASS};
use crate::spawn::{spherical, tangent_velocity, RandomSource};
use crate::store::{finite_or, finite_vec, ParticleKind, ParticleStore};
use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Upper bound on nebula cloud centers.
pub const MAX_NEBULA_CLOUDS: usize = 10;

/// Particles per population. Always sums to the total it was split from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationCounts {
    pub core: usize,
    pub arm: usize,
    pub halo: usize,
    pub nebula: usize,
    pub dust: usize,
}

impl PopulationCounts {
    /// Split `count` by `fractions`; dust absorbs the rounding remainder.
    pub fn split(count: usize, fractions: &PopulationFractions) -> Self {
        let mut remaining = count;
        let mut take = |fraction: f32| {
            let share = (count as f32 * finite_or(fraction, 0.0).max(0.0)).floor() as usize;
            let share = share.min(remaining);
            remaining -= share;
            share
        };

        let core = take(fractions.core);
        let arm = take(fractions.arm);
        let halo = take(fractions.halo);
        let nebula = take(fractions.nebula);

        Self {
            core,
            arm,
            halo,
            nebula,
            dust: remaining,
        }
    }

    pub fn get(&self, kind: ParticleKind) -> usize {
        match kind {
            ParticleKind::Core => self.core,
            ParticleKind::Arm => self.arm,
            ParticleKind::Halo => self.halo,
            ParticleKind::Nebula => self.nebula,
            ParticleKind::Dust => self.dust,
        }
    }

    pub fn total(&self) -> usize {
        self.core + self.arm + self.halo + self.nebula + self.dust
    }

    /// Count each kind present in a galaxy store.
    pub fn tally(store: &ParticleStore) -> Self {
        let mut counts = Self::default();
        if let Some(galaxy) = store.galaxy() {
            for kind in &galaxy.kinds {
                match kind {
                    ParticleKind::Core => counts.core += 1,
                    ParticleKind::Arm => counts.arm += 1,
                    ParticleKind::Halo => counts.halo += 1,
                    ParticleKind::Nebula => counts.nebula += 1,
                    ParticleKind::Dust => counts.dust += 1,
                }
            }
        }
        counts
    }
}

/// Fill the whole store with a galaxy. Returns the population split used.
pub fn generate_galaxy<R: RandomSource + ?Sized>(
    store: &mut ParticleStore,
    params: &GalaxyParams,
    particle_size: f32,
    rng: &mut R,
) -> PopulationCounts {
    let counts = PopulationCounts::split(store.count(), &params.populations);
    let mut next = 0;
    for kind in ParticleKind::ALL {
        next = generate_population(kind, store, next, counts.get(kind), params, particle_size, rng);
    }
    counts
}

/// Write `count` particles of `kind` into `[start, start + count)`.
///
/// Returns `start + count`, clamped to the store's length.
pub fn generate_population<R: RandomSource + ?Sized>(
    kind: ParticleKind,
    store: &mut ParticleStore,
    start: usize,
    count: usize,
    params: &GalaxyParams,
    particle_size: f32,
    rng: &mut R,
) -> usize {
    let end = (start + count).min(store.count());
    if start >= end {
        return start.min(end);
    }

    match kind {
        ParticleKind::Core => {
            for i in start..end {
                let star = core_star(params, rng);
                write_star(store, i, kind, star, particle_size);
            }
        }
        ParticleKind::Arm => {
            for i in start..end {
                let star = arm_star(params, rng);
                write_star(store, i, kind, star, particle_size);
            }
        }
        ParticleKind::Halo => {
            for i in start..end {
                let star = halo_star(params, rng);
                write_star(store, i, kind, star, particle_size);
            }
        }
        ParticleKind::Nebula => {
            let clouds = nebula_clouds(end - start, params, rng);
            for (n, i) in (start..end).enumerate() {
                let star = nebula_particle(&clouds[n % clouds.len()], params, rng);
                write_star(store, i, kind, star, particle_size);
            }
        }
        ParticleKind::Dust => {
            for i in start..end {
                let star = dust_particle(params, rng);
                write_star(store, i, kind, star, particle_size);
            }
        }
    }
    end
}

/// One generated particle before it is written to the store.
struct Star {
    position: Vec3,
    velocity: Vec3,
    color: Vec3,
    /// Multiplier on the base particle size.
    scale: f32,
    opacity: f32,
    mass: f32,
}

fn write_star(
    store: &mut ParticleStore,
    index: usize,
    kind: ParticleKind,
    star: Star,
    particle_size: f32,
) {
    let size = finite_or(particle_size * star.scale, particle_size);
    store.set_motion(index, finite_vec(star.position), finite_vec(star.velocity));
    store.set_appearance(
        index,
        finite_vec(star.color).clamp(Vec3::ZERO, Vec3::ONE),
        size,
        finite_or(star.opacity, 1.0).clamp(0.0, 1.0),
    );
    if let Some(galaxy) = store.galaxy_mut() {
        galaxy.kinds[index] = kind;
        galaxy.masses[index] = finite_or(star.mass, 1.0).max(MIN_MASS);
    }
}

// =========================================================================
// POPULATIONS
// =========================================================================

fn core_star<R: RandomSource + ?Sized>(params: &GalaxyParams, rng: &mut R) -> Star {
    let radius = rng.next_f32().powf(params.core_concentration) * params.core_size;
    let theta = rng.angle();
    let phi = rng.range(-FRAC_PI_2, FRAC_PI_2);

    // Oblate bulge
    let mut position = spherical(radius, theta, phi);
    position.z *= 0.5;

    let velocity = tangent_velocity(position, params.orbital_speed(radius));
    let warmth = rng.next_f32();

    Star {
        position,
        velocity,
        color: Vec3::new(1.0, 0.95 - 0.1 * warmth, 0.8 - 0.2 * warmth),
        scale: rng.range(1.0, 1.5),
        opacity: 1.0,
        mass: rng.range(0.8, 1.2),
    }
}

fn arm_star<R: RandomSource + ?Sized>(params: &GalaxyParams, rng: &mut R) -> Star {
    let arm = rng.index(params.arm_count as usize);
    let span = params.galaxy_radius - params.core_size;
    let radius = params.core_size + rng.next_f32().powf(0.7) * span;
    let radius = (radius * (1.0 + rng.signed() * 0.2)).max(params.core_size * 0.5);

    let edge = (radius / params.galaxy_radius).clamp(0.0, 1.0);
    let spread = rng.signed() * params.arm_width * (0.3 + 0.7 * edge);
    let theta = spiral_angle(arm, radius, params) + spread;

    // Thick near the core, thin at the rim
    let height = rng.signed() * params.disk_thickness * (1.0 - 0.8 * edge);
    let position = Vec3::new(radius * theta.cos(), radius * theta.sin(), height);

    let speed = params.orbital_speed(radius) * params.rotation_factor;
    let radial = Vec3::new(theta.cos(), theta.sin(), 0.0) * rng.signed() * 0.05 * speed;
    let velocity = tangent_velocity(position, speed) + radial;

    let roll = rng.next_f32();
    let color = if roll < 0.6 {
        Vec3::new(0.7, 0.8, 1.0).lerp(Vec3::ONE, rng.next_f32())
    } else if roll < 0.9 {
        Vec3::new(1.0, 0.9, 0.5)
    } else {
        Vec3::new(1.0, 0.5, 0.2)
    };

    Star {
        position,
        velocity,
        color,
        scale: rng.range(0.8, 1.2),
        opacity: 0.9,
        mass: rng.range(0.5, 1.5),
    }
}

fn halo_star<R: RandomSource + ?Sized>(params: &GalaxyParams, rng: &mut R) -> Star {
    let radius = params.core_size + rng.next_f32().sqrt() * params.halo_size;
    let position = rng.on_sphere(radius);
    let velocity = rng.direction() * params.orbital_speed(radius) * 0.3;

    Star {
        position,
        velocity,
        color: Vec3::new(1.0, 0.55, 0.35),
        scale: rng.range(0.6, 0.9),
        opacity: 0.6,
        mass: rng.range(0.6, 1.0),
    }
}

/// Center and hue of one nebula clump.
struct NebulaCloud {
    center: Vec3,
    color: Vec3,
    size: f32,
}

const NEBULA_HUES: [Vec3; 4] = [
    // Emission red
    Vec3::new(1.0, 0.3, 0.4),
    // Reflection blue
    Vec3::new(0.3, 0.5, 1.0),
    Vec3::new(0.2, 0.9, 0.8),
    Vec3::new(0.7, 0.3, 0.9),
];

fn nebula_clouds<R: RandomSource + ?Sized>(
    particles: usize,
    params: &GalaxyParams,
    rng: &mut R,
) -> Vec<NebulaCloud> {
    let count = particles.clamp(1, MAX_NEBULA_CLOUDS);
    (0..count)
        .map(|_| {
            let arm = rng.index(params.arm_count as usize);
            let span = params.galaxy_radius - params.core_size;
            let radius = params.core_size + rng.range(0.2, 0.9) * span;
            let theta = spiral_angle(arm, radius, params);
            NebulaCloud {
                center: Vec3::new(radius * theta.cos(), radius * theta.sin(), 0.0),
                color: NEBULA_HUES[rng.index(NEBULA_HUES.len())],
                size: rng.range(0.8, 2.0),
            }
        })
        .collect()
}

fn nebula_particle<R: RandomSource + ?Sized>(
    cloud: &NebulaCloud,
    params: &GalaxyParams,
    rng: &mut R,
) -> Star {
    let u = rng.next_f32();
    let mut offset = rng.direction() * u * u * cloud.size;
    offset.z *= 0.5;
    let position = cloud.center + offset;

    let radius = position.truncate().length();
    let velocity = tangent_velocity(position, params.orbital_speed(radius) * 0.7);
    let shade = rng.range(0.8, 1.0);

    Star {
        position,
        velocity,
        color: cloud.color * shade,
        scale: rng.range(2.0, 3.5),
        opacity: rng.range(0.2, 0.4),
        mass: rng.range(0.2, 0.5),
    }
}

fn dust_particle<R: RandomSource + ?Sized>(params: &GalaxyParams, rng: &mut R) -> Star {
    let radius = rng.range(params.core_size, params.galaxy_radius);
    let theta = rng.angle();
    let position = Vec3::new(radius * theta.cos(), radius * theta.sin(), rng.signed() * 0.25);
    let velocity = tangent_velocity(position, params.orbital_speed(radius) * 0.8);
    let tone = rng.range(0.1, 0.25);

    Star {
        position,
        velocity,
        color: Vec3::new(tone * 1.6, tone * 0.9, tone * 0.6),
        scale: rng.range(0.8, 1.4),
        opacity: 0.5,
        mass: rng.range(0.3, 0.7),
    }
}

/// Logarithmic spiral angle of arm `arm` at `radius`.
fn spiral_angle(arm: usize, radius: f32, params: &GalaxyParams) -> f32 {
    let offset = arm as f32 / params.arm_count.max(1) as f32 * TAU;
    let b = params.spiral_tightness * 0.1;
    offset + (radius / params.core_size).max(1e-3).ln() / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::seeded_rng;

    #[test]
    fn test_split_sums_to_count() {
        let fractions = PopulationFractions::default();
        for n in [0, 1, 7, 99, 1000, 12_345] {
            assert_eq!(PopulationCounts::split(n, &fractions).total(), n);
        }
    }

    #[test]
    fn test_split_oversubscribed_fractions() {
        let fractions = PopulationFractions {
            core: 0.8,
            arm: 0.8,
            halo: 0.8,
            nebula: 0.8,
        };
        let counts = PopulationCounts::split(100, &fractions);
        assert_eq!(counts.total(), 100);
        assert_eq!(counts.core, 80);
        assert_eq!(counts.arm, 20);
        assert_eq!(counts.dust, 0);
    }

    #[test]
    fn test_generate_galaxy_assigns_kinds() {
        let params = GalaxyParams::default();
        let mut store = ParticleStore::with_galaxy(2000);
        let mut rng = seeded_rng(42);
        let counts = generate_galaxy(&mut store, &params, 0.15, &mut rng);

        assert_eq!(PopulationCounts::tally(&store), counts);
        assert!(store.is_finite());
        assert!(store.galaxy().unwrap().masses.iter().all(|m| *m >= MIN_MASS));
    }

    #[test]
    fn test_core_stars_inside_core() {
        let params = GalaxyParams::default();
        let mut store = ParticleStore::with_galaxy(500);
        let mut rng = seeded_rng(1);
        generate_population(ParticleKind::Core, &mut store, 0, 500, &params, 0.1, &mut rng);

        for p in store.positions() {
            assert!(p.length() <= params.core_size + 1e-4);
        }
        for &m in &store.galaxy().unwrap().masses {
            assert!((0.8..=1.2).contains(&m));
        }
    }

    #[test]
    fn test_core_velocity_is_circular() {
        let params = GalaxyParams::default();
        let mut store = ParticleStore::with_galaxy(200);
        let mut rng = seeded_rng(2);
        generate_population(ParticleKind::Core, &mut store, 0, 200, &params, 0.1, &mut rng);

        for (p, v) in store.positions().iter().zip(store.velocities()) {
            // Tangential: no component along the in-plane radius
            let radial = Vec3::new(p.x, p.y, 0.0);
            assert!(radial.dot(*v).abs() < 1e-3 * (1.0 + v.length() * radial.length()));
        }
    }

    #[test]
    fn test_dust_stays_in_thin_annulus() {
        let params = GalaxyParams::default();
        let mut store = ParticleStore::with_galaxy(500);
        let mut rng = seeded_rng(3);
        generate_population(ParticleKind::Dust, &mut store, 0, 500, &params, 0.1, &mut rng);

        for p in store.positions() {
            assert!(p.z.abs() <= 0.25);
            let r = p.truncate().length();
            assert!(r >= params.core_size - 1e-4 && r <= params.galaxy_radius + 1e-4);
        }
    }

    #[test]
    fn test_halo_radius_bounds() {
        let params = GalaxyParams::default();
        let mut store = ParticleStore::with_galaxy(300);
        let mut rng = seeded_rng(4);
        generate_population(ParticleKind::Halo, &mut store, 0, 300, &params, 0.1, &mut rng);

        for p in store.positions() {
            let r = p.length();
            assert!(r >= params.core_size - 1e-3);
            assert!(r <= params.core_size + params.halo_size + 1e-3);
        }
    }

    #[test]
    fn test_population_writes_only_its_range() {
        let params = GalaxyParams::default();
        let mut store = ParticleStore::with_galaxy(30);
        let mut rng = seeded_rng(5);
        let end = generate_population(
            ParticleKind::Nebula,
            &mut store,
            10,
            10,
            &params,
            0.1,
            &mut rng,
        );

        assert_eq!(end, 20);
        let kinds = &store.galaxy().unwrap().kinds;
        assert!(kinds[..10].iter().all(|k| *k == ParticleKind::Core));
        assert!(kinds[10..20].iter().all(|k| *k == ParticleKind::Nebula));
        assert!(store.positions()[20..].iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let params = GalaxyParams::default();
        let mut a = ParticleStore::with_galaxy(1000);
        let mut b = ParticleStore::with_galaxy(1000);
        generate_galaxy(&mut a, &params, 0.15, &mut seeded_rng(99));
        generate_galaxy(&mut b, &params, 0.15, &mut seeded_rng(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_spiral_angle_grows_with_radius() {
        let params = GalaxyParams::default();
        let inner = spiral_angle(0, params.core_size, &params);
        let outer = spiral_angle(0, params.galaxy_radius, &params);
        assert_eq!(inner, 0.0);
        assert!(outer > inner);
    }
}
