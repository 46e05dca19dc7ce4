//! Simulation configuration.
//!
//! Settings fall into two groups:
//!
//! - **Structural** settings (particle count, particle size, color scheme,
//!   galaxy shape) decide how the store is generated. Changing one requests a
//!   full rebuild.
//! - **Live** settings (speed, turbulence, interactivity, mouse mode, audio
//!   reactivity, black hole mass, rotation factor, gravity toggle) are read
//!   every frame and take effect immediately.
//!
//! Configurations serialize to JSON; every field has a default, so partial
//! files load.
//!
//! ```ignore
//! let config = SimulationConfig::from_json(r#"{ "count": 20000, "speed": 0.5 }"#)?;
//! ```

use crate::error::ConfigError;
use crate::store::finite_or;
use crate::visuals::ColorScheme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Smallest particle count a store may have.
pub const MIN_COUNT: usize = 1;
/// Smallest render size a particle may have.
pub const MIN_PARTICLE_SIZE: f32 = 0.01;
/// Floor for every mass that is ever divided by.
pub const MIN_MASS: f32 = 0.1;

/// Whether pointer interaction pulls particles in or pushes them away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseMode {
    #[default]
    Attract,
    Repel,
}

impl MouseMode {
    /// +1 for attract, -1 for repel.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            MouseMode::Attract => 1.0,
            MouseMode::Repel => -1.0,
        }
    }
}

/// Settings shared by every mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of particles.
    pub count: usize,
    /// Base render size of a particle.
    pub particle_size: f32,
    /// Tint for cloud modes.
    pub color_scheme: ColorScheme,
    /// Simulation speed multiplier (1.0 = normal).
    pub speed: f32,
    /// Turbulence strength for cloud modes.
    pub turbulence: f32,
    /// Magnitude of the pointer force.
    pub interactivity: f32,
    pub mouse_mode: MouseMode,
    /// Pointer influence radius at the reference camera distance.
    pub influence_radius: f32,
    /// Camera distance at which `influence_radius` applies unscaled.
    pub reference_camera_distance: f32,
    /// Scales every audio-driven effect.
    pub audio_reactivity: f32,
    /// Largest frame delta ever integrated, in seconds.
    pub max_delta: f32,
    /// Hard containment radius for cloud modes.
    pub containment_radius: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            count: 5_000,
            particle_size: 0.15,
            color_scheme: ColorScheme::default(),
            speed: 1.0,
            turbulence: 0.5,
            interactivity: 0.1,
            mouse_mode: MouseMode::Attract,
            influence_radius: 15.0,
            reference_camera_distance: 50.0,
            audio_reactivity: 1.0,
            max_delta: 0.05,
            containment_radius: 50.0,
        }
    }
}

impl SimulationConfig {
    /// Signed pointer force: positive attracts, negative repels.
    #[inline]
    pub fn interactive_force(&self) -> f32 {
        self.interactivity.abs() * self.mouse_mode.sign()
    }

    /// Pull every field back into its valid range.
    pub fn clamp(&mut self) {
        self.count = self.count.max(MIN_COUNT);
        self.particle_size = finite_or(self.particle_size, 0.15).max(MIN_PARTICLE_SIZE);
        self.speed = finite_or(self.speed, 1.0).max(0.0);
        self.turbulence = finite_or(self.turbulence, 0.0).max(0.0);
        self.interactivity = finite_or(self.interactivity, 0.0).abs();
        self.influence_radius = finite_or(self.influence_radius, 15.0).max(0.0);
        self.reference_camera_distance = finite_or(self.reference_camera_distance, 50.0).max(1e-3);
        self.audio_reactivity = finite_or(self.audio_reactivity, 0.0).max(0.0);
        self.max_delta = finite_or(self.max_delta, 0.05).max(0.0);
        self.containment_radius = finite_or(self.containment_radius, 50.0).max(1.0);
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.clamp();
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save to a configuration file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

// =========================================================================
// MODES
// =========================================================================

/// Which simulation runs, without its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeKind {
    Particle,
    Galaxy,
    EmitterCloud,
}

impl ModeKind {
    pub fn name(self) -> &'static str {
        match self {
            ModeKind::Particle => "particle",
            ModeKind::Galaxy => "galaxy",
            ModeKind::EmitterCloud => "emitter-cloud",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "particle" | "particles" | "drift" => Ok(ModeKind::Particle),
            "galaxy" => Ok(ModeKind::Galaxy),
            "emitter-cloud" | "emitter_cloud" | "cloud" => Ok(ModeKind::EmitterCloud),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Parameters of the free-drifting particle cloud.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftParams {
    /// Radius of the sphere particles are scattered in.
    pub cloud_radius: f32,
    /// Largest initial speed.
    pub initial_speed: f32,
    /// Per-step velocity multiplier.
    pub damping: f32,
    pub max_velocity: f32,
    /// Spatial frequency of the turbulence field.
    pub turbulence_scale: f32,
    /// How fast the turbulence field evolves.
    pub turbulence_time_scale: f32,
}

impl Default for DriftParams {
    fn default() -> Self {
        Self {
            cloud_radius: 30.0,
            initial_speed: 0.5,
            damping: 0.98,
            max_velocity: 5.0,
            turbulence_scale: 0.05,
            turbulence_time_scale: 0.3,
        }
    }
}

impl DriftParams {
    /// Pull every field back into its valid range.
    pub fn clamp(&mut self) {
        self.cloud_radius = finite_or(self.cloud_radius, 30.0).max(0.0);
        self.initial_speed = finite_or(self.initial_speed, 0.5).max(0.0);
        self.damping = finite_or(self.damping, 0.98).clamp(0.0, 1.0);
        self.max_velocity = finite_or(self.max_velocity, 5.0).max(0.0);
        self.turbulence_scale = finite_or(self.turbulence_scale, 0.05);
        self.turbulence_time_scale = finite_or(self.turbulence_time_scale, 0.3);
    }
}

/// Share of the particle count given to each galaxy population.
///
/// Dust takes whatever the other four leave, so the split always sums to
/// the full count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationFractions {
    pub core: f32,
    pub arm: f32,
    pub halo: f32,
    pub nebula: f32,
}

impl Default for PopulationFractions {
    fn default() -> Self {
        Self {
            core: 0.15,
            arm: 0.50,
            halo: 0.10,
            nebula: 0.15,
        }
    }
}

/// Parameters of the galaxy simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParams {
    /// Mass of the central body.
    pub black_hole_mass: f32,
    /// Gravitational constant. 1.0 keeps orbital speed at `sqrt(mass / r)`.
    pub gravity_constant: f32,
    pub gravity_enabled: bool,
    pub galaxy_radius: f32,
    pub core_size: f32,
    pub halo_size: f32,
    /// Exponent biasing core stars toward the center (>1 concentrates).
    pub core_concentration: f32,
    pub arm_count: u32,
    /// Logarithmic spiral pitch; `b = spiral_tightness * 0.1`.
    pub spiral_tightness: f32,
    /// Angular spread of arm stars at the galaxy edge, in radians.
    pub arm_width: f32,
    /// Half-thickness of the disk near the core.
    pub disk_thickness: f32,
    /// Scales arm orbital velocity.
    pub rotation_factor: f32,
    pub populations: PopulationFractions,
    /// Per-step velocity multiplier.
    pub damping: f32,
    pub max_velocity: f32,
    /// Per-component cap on `acceleration * dt`.
    pub max_accel_step: f32,
    /// Softening distance for the central mass.
    pub min_distance: f32,
    /// Fixed integration step; `None` integrates with the frame delta.
    pub fixed_step: Option<f32>,
    /// Soft containment starts at `containment_factor * galaxy_radius`.
    pub containment_factor: f32,
    /// Constant inward velocity nudge beyond the containment radius.
    pub containment_nudge: f32,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            black_hole_mass: 10.0,
            gravity_constant: 1.0,
            gravity_enabled: true,
            galaxy_radius: 10.0,
            core_size: 1.5,
            halo_size: 6.0,
            core_concentration: 2.0,
            arm_count: 4,
            spiral_tightness: 3.0,
            arm_width: 0.4,
            disk_thickness: 0.6,
            rotation_factor: 0.8,
            populations: PopulationFractions::default(),
            damping: 0.98,
            max_velocity: 2.0,
            max_accel_step: 0.1,
            min_distance: 0.1,
            fixed_step: Some(0.016),
            containment_factor: 5.0,
            containment_nudge: 0.01,
        }
    }
}

impl GalaxyParams {
    /// Pull every field back into its valid range.
    pub fn clamp(&mut self) {
        self.black_hole_mass = finite_or(self.black_hole_mass, MIN_MASS).max(MIN_MASS);
        self.gravity_constant = finite_or(self.gravity_constant, 1.0).max(0.0);
        self.core_size = finite_or(self.core_size, 1.5).max(0.01);
        self.galaxy_radius = finite_or(self.galaxy_radius, 10.0).max(self.core_size * 1.01);
        self.halo_size = finite_or(self.halo_size, 0.0).max(0.0);
        self.core_concentration = finite_or(self.core_concentration, 1.0).max(0.01);
        self.arm_count = self.arm_count.max(1);
        self.spiral_tightness = finite_or(self.spiral_tightness, 3.0).max(0.01);
        self.arm_width = finite_or(self.arm_width, 0.0).max(0.0);
        self.disk_thickness = finite_or(self.disk_thickness, 0.0).max(0.0);
        self.rotation_factor = finite_or(self.rotation_factor, 1.0).max(0.0);
        self.damping = finite_or(self.damping, 0.98).clamp(0.0, 1.0);
        self.max_velocity = finite_or(self.max_velocity, 2.0).max(0.0);
        self.max_accel_step = finite_or(self.max_accel_step, 0.1).max(0.0);
        self.min_distance = finite_or(self.min_distance, 0.1).max(1e-3);
        self.fixed_step = self.fixed_step.filter(|s| s.is_finite() && *s > 0.0);
        self.containment_factor = finite_or(self.containment_factor, 5.0).max(1.0);
        self.containment_nudge = finite_or(self.containment_nudge, 0.01).max(0.0);
    }

    /// Radius beyond which the soft containment nudge applies.
    #[inline]
    pub fn containment_radius(&self) -> f32 {
        self.galaxy_radius * self.containment_factor
    }

    /// Circular orbital speed `sqrt(G * M / r)` at radius `r`.
    #[inline]
    pub fn orbital_speed(&self, radius: f32) -> f32 {
        (self.gravity_constant * self.black_hole_mass / radius.max(MIN_MASS)).sqrt()
    }
}

/// Parameters of the respawning emitter cloud.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudParams {
    pub emitter_count: u32,
    /// Radius of the circle each emitter orbits on.
    pub emitter_orbit_radius: f32,
    /// Angular speed of the emitters, radians per second.
    pub emitter_orbit_speed: f32,
    /// Particles spawn within this distance of their emitter.
    pub emitter_radius: f32,
    /// Outward speed of freshly spawned particles.
    pub emission_speed: f32,
    pub min_life: f32,
    pub max_life: f32,
    /// Final fraction of life over which opacity ramps to zero.
    pub fade_fraction: f32,
    pub damping: f32,
    pub max_velocity: f32,
    pub turbulence_scale: f32,
    pub turbulence_time_scale: f32,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            emitter_count: 5,
            emitter_orbit_radius: 15.0,
            emitter_orbit_speed: 0.3,
            emitter_radius: 2.0,
            emission_speed: 1.5,
            min_life: 2.0,
            max_life: 5.0,
            fade_fraction: 0.3,
            damping: 0.99,
            max_velocity: 6.0,
            turbulence_scale: 0.05,
            turbulence_time_scale: 0.3,
        }
    }
}

impl CloudParams {
    /// Pull every field back into its valid range.
    pub fn clamp(&mut self) {
        self.emitter_count = self.emitter_count.max(1);
        self.emitter_orbit_radius = finite_or(self.emitter_orbit_radius, 15.0).max(0.0);
        self.emitter_orbit_speed = finite_or(self.emitter_orbit_speed, 0.3);
        self.emitter_radius = finite_or(self.emitter_radius, 2.0).max(0.0);
        self.emission_speed = finite_or(self.emission_speed, 1.5).max(0.0);
        self.min_life = finite_or(self.min_life, 2.0).max(0.05);
        self.max_life = finite_or(self.max_life, 5.0).max(self.min_life);
        self.fade_fraction = finite_or(self.fade_fraction, 0.3).clamp(0.0, 1.0);
        self.damping = finite_or(self.damping, 0.99).clamp(0.0, 1.0);
        self.max_velocity = finite_or(self.max_velocity, 6.0).max(0.0);
        self.turbulence_scale = finite_or(self.turbulence_scale, 0.05);
        self.turbulence_time_scale = finite_or(self.turbulence_time_scale, 0.3);
    }
}

/// The running simulation and its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Mode {
    /// Drifting cloud, no central gravity.
    Particle(DriftParams),
    /// Structured populations orbiting a central mass.
    Galaxy(GalaxyParams),
    /// Lifetime-based cloud respawning from orbiting emitters.
    EmitterCloud(CloudParams),
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Particle(DriftParams::default())
    }
}

impl Mode {
    /// Mode of the given kind with default parameters.
    pub fn default_for(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Particle => Mode::Particle(DriftParams::default()),
            ModeKind::Galaxy => Mode::Galaxy(GalaxyParams::default()),
            ModeKind::EmitterCloud => Mode::EmitterCloud(CloudParams::default()),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Particle(_) => ModeKind::Particle,
            Mode::Galaxy(_) => ModeKind::Galaxy,
            Mode::EmitterCloud(_) => ModeKind::EmitterCloud,
        }
    }

    /// Pull the payload's fields back into their valid ranges.
    pub fn clamp(&mut self) {
        match self {
            Mode::Particle(p) => p.clamp(),
            Mode::Galaxy(p) => p.clamp(),
            Mode::EmitterCloud(p) => p.clamp(),
        }
    }
}

// =========================================================================
// PARAMETER CHANGES
// =========================================================================

/// A single typed setting change, as sent by a control panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Parameter {
    ParticleCount(usize),
    ParticleSize(f32),
    ColorScheme(ColorScheme),
    Speed(f32),
    Turbulence(f32),
    Interactivity(f32),
    /// Signed pointer force; the sign picks attract or repel.
    InteractiveForce(f32),
    MouseMode(MouseMode),
    AudioReactivity(f32),
    BlackHoleMass(f32),
    RotationFactor(f32),
    GravityEnabled(bool),
    ArmCount(u32),
    SpiralTightness(f32),
    GalaxyRadius(f32),
}

/// What applying a [`Parameter`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterEffect {
    /// Takes effect on the next frame.
    Live,
    /// The store has to be regenerated.
    Rebuild,
    /// The parameter does not apply to the current mode.
    Ignored,
}

impl Parameter {
    /// Interpret a UI parameter name and numeric value.
    ///
    /// Booleans are `value != 0`; for `mouseMode` a negative value selects
    /// repel.
    pub fn from_name(name: &str, value: f32) -> Result<Self, ConfigError> {
        let p = match name {
            "particleCount" | "count" => Parameter::ParticleCount(value.max(0.0) as usize),
            "particleSize" | "size" => Parameter::ParticleSize(value),
            "speed" => Parameter::Speed(value),
            "turbulence" => Parameter::Turbulence(value),
            "interactivity" => Parameter::Interactivity(value),
            "interactiveForce" => Parameter::InteractiveForce(value),
            "mouseMode" => Parameter::MouseMode(if value < 0.0 {
                MouseMode::Repel
            } else {
                MouseMode::Attract
            }),
            "audioReactivity" => Parameter::AudioReactivity(value),
            "blackHoleMass" => Parameter::BlackHoleMass(value),
            "rotationFactor" => Parameter::RotationFactor(value),
            "gravity" | "gravityEnabled" => Parameter::GravityEnabled(value != 0.0),
            "armCount" | "arms" => Parameter::ArmCount(value.max(0.0) as u32),
            "spiralTightness" => Parameter::SpiralTightness(value),
            "galaxyRadius" => Parameter::GalaxyRadius(value),
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        };
        Ok(p)
    }

    /// UI name of the parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::ParticleCount(_) => "particleCount",
            Parameter::ParticleSize(_) => "particleSize",
            Parameter::ColorScheme(_) => "colorScheme",
            Parameter::Speed(_) => "speed",
            Parameter::Turbulence(_) => "turbulence",
            Parameter::Interactivity(_) => "interactivity",
            Parameter::InteractiveForce(_) => "interactiveForce",
            Parameter::MouseMode(_) => "mouseMode",
            Parameter::AudioReactivity(_) => "audioReactivity",
            Parameter::BlackHoleMass(_) => "blackHoleMass",
            Parameter::RotationFactor(_) => "rotationFactor",
            Parameter::GravityEnabled(_) => "gravity",
            Parameter::ArmCount(_) => "armCount",
            Parameter::SpiralTightness(_) => "spiralTightness",
            Parameter::GalaxyRadius(_) => "galaxyRadius",
        }
    }

    /// Write the change into `config` / `mode`, clamping at the boundary.
    pub fn apply(self, config: &mut SimulationConfig, mode: &mut Mode) -> ParameterEffect {
        let effect = match (self, &mut *mode) {
            (Parameter::ParticleCount(n), _) => {
                let n = n.max(MIN_COUNT);
                if n == config.count {
                    return ParameterEffect::Live;
                }
                config.count = n;
                ParameterEffect::Rebuild
            }
            (Parameter::ParticleSize(s), _) => {
                config.particle_size = s;
                ParameterEffect::Rebuild
            }
            (Parameter::ColorScheme(scheme), _) => {
                config.color_scheme = scheme;
                ParameterEffect::Rebuild
            }
            (Parameter::Speed(v), _) => {
                config.speed = v;
                ParameterEffect::Live
            }
            (Parameter::Turbulence(v), _) => {
                config.turbulence = v;
                ParameterEffect::Live
            }
            (Parameter::Interactivity(v), _) => {
                config.interactivity = v;
                ParameterEffect::Live
            }
            (Parameter::InteractiveForce(v), _) => {
                config.interactivity = v;
                config.mouse_mode = if v < 0.0 {
                    MouseMode::Repel
                } else {
                    MouseMode::Attract
                };
                ParameterEffect::Live
            }
            (Parameter::MouseMode(m), _) => {
                config.mouse_mode = m;
                ParameterEffect::Live
            }
            (Parameter::AudioReactivity(v), _) => {
                config.audio_reactivity = v;
                ParameterEffect::Live
            }
            (Parameter::BlackHoleMass(m), Mode::Galaxy(p)) => {
                p.black_hole_mass = m;
                ParameterEffect::Live
            }
            (Parameter::RotationFactor(r), Mode::Galaxy(p)) => {
                p.rotation_factor = r;
                ParameterEffect::Live
            }
            (Parameter::GravityEnabled(on), Mode::Galaxy(p)) => {
                p.gravity_enabled = on;
                ParameterEffect::Live
            }
            (Parameter::ArmCount(n), Mode::Galaxy(p)) => {
                p.arm_count = n;
                ParameterEffect::Rebuild
            }
            (Parameter::SpiralTightness(t), Mode::Galaxy(p)) => {
                p.spiral_tightness = t;
                ParameterEffect::Rebuild
            }
            (Parameter::GalaxyRadius(r), Mode::Galaxy(p)) => {
                p.galaxy_radius = r;
                ParameterEffect::Rebuild
            }
            (
                Parameter::BlackHoleMass(_)
                | Parameter::RotationFactor(_)
                | Parameter::GravityEnabled(_)
                | Parameter::ArmCount(_)
                | Parameter::SpiralTightness(_)
                | Parameter::GalaxyRadius(_),
                _,
            ) => ParameterEffect::Ignored,
        };

        config.clamp();
        mode.clamp();
        effect
    }
}
