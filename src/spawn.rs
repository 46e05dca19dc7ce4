//! Random sampling for particle generation.
//!
//! Every generator in the crate draws its randomness through [`RandomSource`]
//! instead of reaching for a global RNG, so a seeded source reproduces a
//! whole galaxy bit-for-bit.
//!
//! ```ignore
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//! use stardust::spawn::RandomSource;
//!
//! let mut rng = SmallRng::seed_from_u64(7);
//! let p = rng.in_sphere(0.5);
//! let v = tangent_velocity(p, 1.0);
//! ```

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::f32::consts::{PI, TAU};

/// A source of uniform random numbers in `[0, 1)`.
///
/// Implemented for every [`rand::RngCore`], so `SmallRng`, `StdRng` and
/// `thread_rng()` can all be passed to generators directly. The provided
/// methods are the sampling primitives the generators are written against.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_f32(&mut self) -> f32;

    // ========== Random primitives ==========

    /// Uniform value in `[min, max)`.
    #[inline]
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform value in `[-1, 1)`.
    #[inline]
    fn signed(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    #[inline]
    fn index(&mut self, len: usize) -> usize {
        let i = (self.next_f32() * len as f32) as usize;
        i.min(len.saturating_sub(1))
    }

    /// Uniform angle in `[0, 2π)`.
    #[inline]
    fn angle(&mut self) -> f32 {
        self.next_f32() * TAU
    }

    // ========== Position helpers ==========

    /// Random point on the surface of a sphere (uniform over solid angle).
    fn on_sphere(&mut self, radius: f32) -> Vec3 {
        let z = self.signed();
        let theta = self.angle();
        let ring = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(ring * theta.cos(), ring * theta.sin(), z) * radius
    }

    /// Random point inside a sphere, uniform throughout the volume.
    fn in_sphere(&mut self, radius: f32) -> Vec3 {
        // Cube root for uniform volume distribution
        let r = radius * self.next_f32().cbrt();
        self.on_sphere(r)
    }

    /// Random unit vector.
    fn direction(&mut self) -> Vec3 {
        self.on_sphere(1.0)
    }
}

impl<R: RngCore> RandomSource for R {
    #[inline]
    fn next_f32(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

/// Deterministic RNG for reproducible generation.
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// RNG seeded from OS entropy, different on every run.
pub fn entropy_rng() -> SmallRng {
    SmallRng::from_entropy()
}

/// Velocity tangent to `position` in the galactic (XY) plane.
///
/// Counter-clockwise when viewed from +Z. Falls back to +X exactly on the
/// axis, where no tangent exists.
pub fn tangent_velocity(position: Vec3, speed: f32) -> Vec3 {
    Vec3::new(-position.y, position.x, 0.0)
        .try_normalize()
        .unwrap_or(Vec3::X)
        * speed
}

/// Velocity pointing away from `center`, random if `position` coincides with it.
pub fn outward_velocity<R: RandomSource + ?Sized>(
    rng: &mut R,
    position: Vec3,
    center: Vec3,
    speed: f32,
) -> Vec3 {
    let offset = position - center;
    if offset.length_squared() > 1e-6 {
        offset.normalize() * speed
    } else {
        rng.direction() * speed
    }
}

/// Point on a sphere given azimuth `theta` and elevation `phi` in `[-π/2, π/2]`.
pub fn spherical(radius: f32, theta: f32, phi: f32) -> Vec3 {
    let phi = phi.clamp(-PI / 2.0, PI / 2.0);
    Vec3::new(
        radius * phi.cos() * theta.cos(),
        radius * phi.cos() * theta.sin(),
        radius * phi.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_f32_in_unit_range() {
        let mut rng = seeded_rng(1);
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = seeded_rng(42);
        let mut b = seeded_rng(42);
        for _ in 0..32 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn test_index_stays_in_bounds() {
        let mut rng = seeded_rng(3);
        for _ in 0..1000 {
            assert!(rng.index(4) < 4);
        }
        assert_eq!(rng.index(0), 0);
    }

    #[test]
    fn test_in_sphere_bounds() {
        let mut rng = seeded_rng(0);
        for _ in 0..100 {
            let pos = rng.in_sphere(0.5);
            assert!(pos.length() <= 0.5 + 0.001);
        }
    }

    #[test]
    fn test_on_sphere_radius() {
        let mut rng = seeded_rng(9);
        for _ in 0..100 {
            let pos = rng.on_sphere(2.0);
            assert!((pos.length() - 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_tangent_velocity_is_perpendicular() {
        let p = Vec3::new(3.0, 4.0, 0.5);
        let v = tangent_velocity(p, 2.0);
        assert!((v.length() - 2.0).abs() < 1e-4);
        assert!(v.dot(Vec3::new(p.x, p.y, 0.0)).abs() < 1e-4);
    }

    #[test]
    fn test_tangent_velocity_near_axis_stays_tangential() {
        let p = Vec3::new(-0.00076, 0.00059, 0.00086);
        let v = tangent_velocity(p, 10.0);
        let radial = Vec3::new(p.x, p.y, 0.0).normalize();
        assert!((v.length() - 10.0).abs() < 1e-3);
        assert!(v.dot(radial).abs() < 1e-3);
        assert!(v.z == 0.0);
    }

    #[test]
    fn test_tangent_velocity_on_axis() {
        let v = tangent_velocity(Vec3::new(0.0, 0.0, 1.0), 1.5);
        assert_eq!(v, Vec3::new(1.5, 0.0, 0.0));
    }
}
