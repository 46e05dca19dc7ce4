//! Structure-of-arrays particle attribute storage.
//!
//! [`ParticleStore`] owns one array per attribute, all of length
//! [`ParticleStore::count`]. The count is fixed for the lifetime of a store;
//! a different count means building a new store.
//!
//! | Attribute | Type | Present |
//! |-----------|------|---------|
//! | `position` | `Vec3` | always |
//! | `velocity` | `Vec3` | always |
//! | `acceleration` | `Vec3` | always (recomputed every frame) |
//! | `impulse` | `Vec3` | always (recomputed every frame) |
//! | `color` / `base_color` | `Vec3` | always |
//! | `size` / `base_size` | `f32` | always |
//! | `opacity` / `base_opacity` | `f32` | always |
//! | `kind`, `mass` | [`ParticleKind`], `f32` | galaxy mode |
//! | `life_time`, `start_time`, `emitter` | `f32`, `f32`, `u32` | emitter cloud mode |
//!
//! The renderer reads the store through [`ParticleStore::write_vertices`] or
//! the raw byte views after the frame's update has finished.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Galaxy sub-population a particle belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Dense central bulge.
    #[default]
    Core,
    /// Stars along the logarithmic spiral arms.
    Arm,
    /// Sparse spherical halo.
    Halo,
    /// Gas clouds strung along the arms.
    Nebula,
    /// Dark dust lanes in the galactic plane.
    Dust,
}

impl ParticleKind {
    /// All kinds in generation order.
    pub const ALL: [ParticleKind; 5] = [
        ParticleKind::Core,
        ParticleKind::Arm,
        ParticleKind::Halo,
        ParticleKind::Nebula,
        ParticleKind::Dust,
    ];
}

/// Attributes that only exist while the store holds a galaxy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GalaxyAttributes {
    pub kinds: Vec<ParticleKind>,
    pub masses: Vec<f32>,
}

/// Attributes that only exist while the store holds an emitter cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LifetimeAttributes {
    pub life_times: Vec<f32>,
    pub start_times: Vec<f32>,
    /// Index of the emitter that spawned each particle.
    pub emitters: Vec<u32>,
}

impl LifetimeAttributes {
    /// Seconds since the particle was (re)spawned.
    #[inline]
    pub fn age(&self, index: usize, now: f32) -> f32 {
        now - self.start_times[index]
    }

    /// Whether the particle has outlived its lifetime at time `now`.
    #[inline]
    pub fn is_dead(&self, index: usize, now: f32) -> bool {
        self.age(index, now) >= self.life_times[index]
    }
}

/// Values written in place of non-finite scalars during sanitization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SanitizeDefaults {
    pub size: f32,
    pub opacity: f32,
    pub mass: f32,
    pub life_time: f32,
    /// Current simulation time, used for broken start times.
    pub now: f32,
}

impl Default for SanitizeDefaults {
    fn default() -> Self {
        Self {
            size: 1.0,
            opacity: 1.0,
            mass: 1.0,
            life_time: 1.0,
            now: 0.0,
        }
    }
}

/// One particle as the renderer consumes it.
///
/// 32 bytes, tightly packed, safe to upload with `bytemuck::cast_slice`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderVertex {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

/// What a force may read and write during one frame.
pub(crate) struct ForceView<'a> {
    pub positions: &'a [Vec3],
    pub masses: Option<&'a [f32]>,
    pub accelerations: &'a mut [Vec3],
    pub impulses: &'a mut [Vec3],
}

/// Flat attribute arrays for `count` particles.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleStore {
    count: usize,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    accelerations: Vec<Vec3>,
    impulses: Vec<Vec3>,
    colors: Vec<Vec3>,
    base_colors: Vec<Vec3>,
    sizes: Vec<f32>,
    base_sizes: Vec<f32>,
    opacities: Vec<f32>,
    base_opacities: Vec<f32>,
    galaxy: Option<GalaxyAttributes>,
    lifetime: Option<LifetimeAttributes>,
}

impl ParticleStore {
    /// Store for a drifting cloud: no galaxy or lifetime attributes.
    pub fn new(count: usize) -> Self {
        Self {
            count,
            positions: vec![Vec3::ZERO; count],
            velocities: vec![Vec3::ZERO; count],
            accelerations: vec![Vec3::ZERO; count],
            impulses: vec![Vec3::ZERO; count],
            colors: vec![Vec3::ONE; count],
            base_colors: vec![Vec3::ONE; count],
            sizes: vec![1.0; count],
            base_sizes: vec![1.0; count],
            opacities: vec![1.0; count],
            base_opacities: vec![1.0; count],
            galaxy: None,
            lifetime: None,
        }
    }

    /// Store with per-particle kind and mass.
    pub fn with_galaxy(count: usize) -> Self {
        let mut store = Self::new(count);
        store.galaxy = Some(GalaxyAttributes {
            kinds: vec![ParticleKind::default(); count],
            masses: vec![1.0; count],
        });
        store
    }

    /// Store with per-particle lifetimes.
    pub fn with_lifetimes(count: usize) -> Self {
        let mut store = Self::new(count);
        store.lifetime = Some(LifetimeAttributes {
            life_times: vec![1.0; count],
            start_times: vec![0.0; count],
            emitters: vec![0; count],
        });
        store
    }

    /// Number of particles.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the store holds no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    // ========== Read access ==========

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn accelerations(&self) -> &[Vec3] {
        &self.accelerations
    }

    pub fn impulses(&self) -> &[Vec3] {
        &self.impulses
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn base_colors(&self) -> &[Vec3] {
        &self.base_colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn base_sizes(&self) -> &[f32] {
        &self.base_sizes
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }

    pub fn base_opacities(&self) -> &[f32] {
        &self.base_opacities
    }

    /// Galaxy-only attributes, `None` outside galaxy mode.
    pub fn galaxy(&self) -> Option<&GalaxyAttributes> {
        self.galaxy.as_ref()
    }

    /// Lifetime attributes, `None` outside emitter cloud mode.
    pub fn lifetime(&self) -> Option<&LifetimeAttributes> {
        self.lifetime.as_ref()
    }

    /// Mass of particle `index`, 1.0 when the store has no masses.
    #[inline]
    pub fn mass(&self, index: usize) -> f32 {
        self.galaxy.as_ref().map_or(1.0, |g| g.masses[index])
    }

    // ========== Write access ==========

    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    pub fn velocities_mut(&mut self) -> &mut [Vec3] {
        &mut self.velocities
    }

    pub fn accelerations_mut(&mut self) -> &mut [Vec3] {
        &mut self.accelerations
    }

    pub fn impulses_mut(&mut self) -> &mut [Vec3] {
        &mut self.impulses
    }

    pub fn colors_mut(&mut self) -> &mut [Vec3] {
        &mut self.colors
    }

    pub fn sizes_mut(&mut self) -> &mut [f32] {
        &mut self.sizes
    }

    pub fn opacities_mut(&mut self) -> &mut [f32] {
        &mut self.opacities
    }

    pub fn galaxy_mut(&mut self) -> Option<&mut GalaxyAttributes> {
        self.galaxy.as_mut()
    }

    pub fn lifetime_mut(&mut self) -> Option<&mut LifetimeAttributes> {
        self.lifetime.as_mut()
    }

    /// Write the resting appearance of particle `index`.
    ///
    /// Sets both the base values and the current render values.
    pub fn set_appearance(&mut self, index: usize, color: Vec3, size: f32, opacity: f32) {
        self.base_colors[index] = color;
        self.colors[index] = color;
        self.base_sizes[index] = size;
        self.sizes[index] = size;
        self.base_opacities[index] = opacity;
        self.opacities[index] = opacity;
    }

    /// Write position and velocity of particle `index`.
    pub fn set_motion(&mut self, index: usize, position: Vec3, velocity: Vec3) {
        self.positions[index] = position;
        self.velocities[index] = velocity;
        self.accelerations[index] = Vec3::ZERO;
        self.impulses[index] = Vec3::ZERO;
    }

    /// Zero the per-frame force buffers.
    pub fn clear_forces(&mut self) {
        self.accelerations.fill(Vec3::ZERO);
        self.impulses.fill(Vec3::ZERO);
    }

    /// Split borrow used by the integrator: motion state plus force buffers.
    pub(crate) fn motion_mut(&mut self) -> (&mut [Vec3], &mut [Vec3], &[Vec3], &[Vec3]) {
        (
            &mut self.positions,
            &mut self.velocities,
            &self.accelerations,
            &self.impulses,
        )
    }

    /// Split borrow used by the force model: read-only state plus force buffers.
    pub(crate) fn force_view(&mut self) -> ForceView<'_> {
        ForceView {
            positions: &self.positions,
            masses: self.galaxy.as_ref().map(|g| g.masses.as_slice()),
            accelerations: &mut self.accelerations,
            impulses: &mut self.impulses,
        }
    }

    // ========== Sanitization ==========

    /// Replace every non-finite value with a safe default.
    ///
    /// Vectors become zero, scalars take the value from `defaults`, colors
    /// and opacities are clamped into `[0, 1]`. Returns the number of values
    /// that had to be repaired.
    pub fn sanitize(&mut self, defaults: &SanitizeDefaults) -> usize {
        let mut repaired = 0;

        for buf in [
            &mut self.positions,
            &mut self.velocities,
            &mut self.accelerations,
            &mut self.impulses,
            &mut self.colors,
            &mut self.base_colors,
        ] {
            for v in buf.iter_mut() {
                if !v.is_finite() {
                    *v = Vec3::ZERO;
                    repaired += 1;
                }
            }
        }
        for c in self.colors.iter_mut().chain(self.base_colors.iter_mut()) {
            *c = c.clamp(Vec3::ZERO, Vec3::ONE);
        }

        repaired += repair_scalars(&mut self.sizes, defaults.size);
        repaired += repair_scalars(&mut self.base_sizes, defaults.size);
        repaired += repair_scalars(&mut self.opacities, defaults.opacity);
        repaired += repair_scalars(&mut self.base_opacities, defaults.opacity);
        for o in self.opacities.iter_mut().chain(self.base_opacities.iter_mut()) {
            *o = o.clamp(0.0, 1.0);
        }

        if let Some(galaxy) = &mut self.galaxy {
            repaired += repair_scalars(&mut galaxy.masses, defaults.mass);
        }
        if let Some(lifetime) = &mut self.lifetime {
            repaired += repair_scalars(&mut lifetime.life_times, defaults.life_time);
            repaired += repair_scalars(&mut lifetime.start_times, defaults.now);
        }

        repaired
    }

    /// Whether every attribute component is finite.
    pub fn is_finite(&self) -> bool {
        let vectors = [
            &self.positions,
            &self.velocities,
            &self.accelerations,
            &self.impulses,
            &self.colors,
            &self.base_colors,
        ]
        .into_iter()
        .all(|buf| buf.iter().all(|v| v.is_finite()));

        let scalars = [
            &self.sizes,
            &self.base_sizes,
            &self.opacities,
            &self.base_opacities,
        ]
        .into_iter()
        .all(|buf| buf.iter().all(|s| s.is_finite()));

        let galaxy = self
            .galaxy
            .as_ref()
            .map_or(true, |g| g.masses.iter().all(|m| m.is_finite()));
        let lifetime = self.lifetime.as_ref().map_or(true, |l| {
            l.life_times.iter().chain(l.start_times.iter()).all(|t| t.is_finite())
        });

        vectors && scalars && galaxy && lifetime
    }

    // ========== Render view ==========

    /// Fill `out` with one [`RenderVertex`] per particle.
    ///
    /// Reuses the vector's allocation across frames.
    pub fn write_vertices(&self, out: &mut Vec<RenderVertex>) {
        out.clear();
        out.extend((0..self.count).map(|i| RenderVertex {
            position: self.positions[i].to_array(),
            size: self.sizes[i],
            color: self.colors[i].to_array(),
            opacity: self.opacities[i],
        }));
    }

    /// Positions as raw bytes (12 bytes per particle).
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as raw bytes (12 bytes per particle).
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// `v` if every component is finite, zero otherwise.
#[inline]
pub fn finite_vec(v: Vec3) -> Vec3 {
    if v.is_finite() {
        v
    } else {
        Vec3::ZERO
    }
}

/// `x` if finite, `default` otherwise.
#[inline]
pub fn finite_or(x: f32, default: f32) -> f32 {
    if x.is_finite() {
        x
    } else {
        default
    }
}

fn repair_scalars(values: &mut [f32], default: f32) -> usize {
    let mut repaired = 0;
    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = default;
            repaired += 1;
        }
    }
    repaired
}
