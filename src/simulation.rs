//! The per-frame simulation driver.
//!
//! [`SimulationController`] owns a [`SimulationContext`] (configuration,
//! mode, particle store, input snapshot, clock) and a random source. The
//! renderer calls [`SimulationController::update`] once per frame and then
//! reads the store.
//!
//! Structural changes (mode switch, particle count, particle size, color
//! scheme, galaxy shape) do not rebuild immediately. They mark the store
//! dirty and the next `update` regenerates it once, however many changes
//! arrived in between.
//!
//! ```ignore
//! let mut sim = SimulationController::new(SimulationConfig::default(), Mode::default(), 7);
//! sim.set_mode_kind(ModeKind::Galaxy);
//! sim.set_black_hole_mass(50.0);
//! loop {
//!     sim.input_mut().pointer.set_position(world_point);
//!     sim.update(frame_delta);
//!     sim.store().write_vertices(&mut vertices);
//! }
//! ```

use crate::cloud;
use crate::config::{Mode, ModeKind, MouseMode, Parameter, ParameterEffect, SimulationConfig};
use crate::emitter::Emitter;
use crate::error::ConfigError;
use crate::forces::ForceModel;
use crate::galaxy::{self, PopulationCounts};
use crate::input::FrameInput;
use crate::integrator::{self, StepContext, StepReport};
use crate::lifecycle::Lifecycle;
use crate::spawn::{seeded_rng, RandomSource};
use crate::store::ParticleStore;
use crate::time::Clock;
use crate::visuals::ColorScheme;
use rand::rngs::SmallRng;

/// Everything one simulation instance reads and writes.
///
/// Passed by reference through generation, forces and integration; there is
/// no global simulation state.
#[derive(Clone, Debug)]
pub struct SimulationContext {
    pub config: SimulationConfig,
    pub mode: Mode,
    pub store: ParticleStore,
    pub input: FrameInput,
    pub clock: Clock,
    /// Orbiting emitters, empty outside emitter cloud mode.
    pub emitters: Vec<Emitter>,
    /// Lifetime rules, `None` outside emitter cloud mode.
    pub lifecycle: Option<Lifecycle>,
}

impl SimulationContext {
    /// Context with an empty store; call [`SimulationController`] to populate it.
    pub fn new(mut config: SimulationConfig, mut mode: Mode) -> Self {
        config.clamp();
        mode.clamp();
        let mut clock = Clock::new(config.max_delta);
        clock.set_time_scale(config.speed);
        Self {
            config,
            mode,
            store: ParticleStore::new(0),
            input: FrameInput::default(),
            clock,
            emitters: Vec::new(),
            lifecycle: None,
        }
    }
}

/// Drives one simulation: rebuilds, forces, integration.
pub struct SimulationController<R = SmallRng> {
    context: SimulationContext,
    rng: R,
    needs_rebuild: bool,
    populations: Option<PopulationCounts>,
    last_report: StepReport,
}

impl SimulationController<SmallRng> {
    /// Controller with a seeded random source. The store is generated
    /// immediately.
    pub fn new(config: SimulationConfig, mode: Mode, seed: u64) -> Self {
        Self::with_rng(config, mode, seeded_rng(seed))
    }
}

impl<R: RandomSource> SimulationController<R> {
    /// Controller drawing randomness from `rng`. The store is generated
    /// immediately.
    pub fn with_rng(config: SimulationConfig, mode: Mode, rng: R) -> Self {
        let mut controller = Self {
            context: SimulationContext::new(config, mode),
            rng,
            needs_rebuild: true,
            populations: None,
            last_report: StepReport::default(),
        };
        controller.rebuild_if_needed();
        controller
    }

    // =========================================================================
    // FRAME
    // =========================================================================

    /// Advance the simulation by one frame of `delta` seconds.
    ///
    /// `delta` may be anything: negative and non-finite values count as 0,
    /// large values are clamped to `max_delta`. Never fails; degenerate
    /// numeric states are repaired in place.
    pub fn update(&mut self, delta: f32) {
        self.rebuild_if_needed();

        let ctx = &mut self.context;
        ctx.clock.set_time_scale(ctx.config.speed);
        let step = ctx.clock.advance(delta);
        let dt = integrator::motion_dt(&ctx.mode, step, ctx.clock.time_scale());
        let now = ctx.clock.elapsed();

        let forces = ForceModel::for_mode(&ctx.mode, &ctx.config, &ctx.input, now);
        forces.compute(&mut ctx.store, dt, &mut self.rng);

        let step_ctx = StepContext {
            mode: &ctx.mode,
            config: &ctx.config,
            audio: &ctx.input.audio,
            emitters: &ctx.emitters,
            lifecycle: ctx.lifecycle.as_ref(),
            dt,
            now,
        };
        self.last_report = integrator::step(&mut ctx.store, &step_ctx, &mut self.rng);

        log::trace!(
            "frame {}: dt={:.4} t={:.3} forces={} recycled={} contained={}",
            ctx.clock.frame(),
            dt,
            now,
            forces.forces().len(),
            self.last_report.recycled,
            self.last_report.contained,
        );
    }

    /// Regenerate the store if a structural change is pending.
    ///
    /// Returns whether a rebuild happened. [`update`](Self::update) calls
    /// this itself; call it directly to see the new store before the next
    /// frame.
    pub fn rebuild_if_needed(&mut self) -> bool {
        if !self.needs_rebuild {
            return false;
        }
        self.rebuild();
        self.needs_rebuild = false;
        true
    }

    /// Whether a structural change is waiting for the next frame.
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    fn rebuild(&mut self) {
        let ctx = &mut self.context;
        let count = ctx.config.count;
        let size = ctx.config.particle_size;
        let now = ctx.clock.elapsed();

        self.populations = None;
        ctx.emitters.clear();
        ctx.lifecycle = None;

        match &ctx.mode {
            Mode::Particle(params) => {
                ctx.store = ParticleStore::new(count);
                cloud::generate_drift(
                    &mut ctx.store,
                    0,
                    count,
                    params,
                    &ctx.config.color_scheme,
                    size,
                    &mut self.rng,
                );
            }
            Mode::Galaxy(params) => {
                ctx.store = ParticleStore::with_galaxy(count);
                let counts = galaxy::generate_galaxy(&mut ctx.store, params, size, &mut self.rng);
                log::debug!(
                    "galaxy populations: core={} arm={} halo={} nebula={} dust={}",
                    counts.core,
                    counts.arm,
                    counts.halo,
                    counts.nebula,
                    counts.dust
                );
                self.populations = Some(counts);
            }
            Mode::EmitterCloud(params) => {
                let emitters = Emitter::ring(params, &mut self.rng);
                let lifecycle = Lifecycle::from_params(params);
                ctx.store = ParticleStore::with_lifetimes(count);
                cloud::generate_emitter_cloud(
                    &mut ctx.store,
                    0,
                    count,
                    &emitters,
                    &lifecycle,
                    &ctx.config.color_scheme,
                    size,
                    now,
                    &mut self.rng,
                );
                ctx.emitters = emitters;
                ctx.lifecycle = Some(lifecycle);
            }
        }

        log::info!("built {} particles for {} mode", count, ctx.mode.kind());
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Switch to `mode`. The store is rebuilt on the next frame.
    pub fn set_mode(&mut self, mut mode: Mode) {
        mode.clamp();
        log::info!("switching mode: {} -> {}", self.context.mode.kind(), mode.kind());
        self.context.mode = mode;
        self.needs_rebuild = true;
    }

    /// Switch to the default parameters of `kind`.
    pub fn set_mode_kind(&mut self, kind: ModeKind) {
        self.set_mode(Mode::default_for(kind));
    }

    /// Switch mode by name (`"particle"`, `"galaxy"`, `"emitter-cloud"`).
    pub fn set_mode_by_name(&mut self, name: &str) -> Result<(), ConfigError> {
        let kind: ModeKind = name.parse()?;
        self.set_mode_kind(kind);
        Ok(())
    }

    /// Apply a typed parameter change.
    pub fn set_parameter(&mut self, parameter: Parameter) -> ParameterEffect {
        let ctx = &mut self.context;
        let effect = parameter.apply(&mut ctx.config, &mut ctx.mode);

        match effect {
            ParameterEffect::Live => {
                log::debug!("{} updated", parameter.name());
            }
            ParameterEffect::Rebuild => {
                log::debug!("{} updated, rebuild requested", parameter.name());
                self.needs_rebuild = true;
            }
            ParameterEffect::Ignored => {
                log::debug!("{} ignored in {} mode", parameter.name(), ctx.mode.kind());
            }
        }

        ctx.clock.set_time_scale(ctx.config.speed);
        ctx.clock.set_max_delta(ctx.config.max_delta);
        effect
    }

    /// Apply a parameter change by UI name.
    pub fn set_parameter_by_name(
        &mut self,
        name: &str,
        value: f32,
    ) -> Result<ParameterEffect, ConfigError> {
        let parameter = Parameter::from_name(name, value)?;
        Ok(self.set_parameter(parameter))
    }

    pub fn change_color_scheme(&mut self, scheme: ColorScheme) {
        self.set_parameter(Parameter::ColorScheme(scheme));
    }

    /// Switch to a named color scheme preset.
    pub fn set_color_scheme_by_name(&mut self, name: &str) -> Result<(), ConfigError> {
        let scheme = ColorScheme::named(name)
            .ok_or_else(|| ConfigError::UnknownColorScheme(name.to_string()))?;
        self.change_color_scheme(scheme);
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.set_parameter(Parameter::Speed(speed));
    }

    pub fn set_turbulence(&mut self, turbulence: f32) {
        self.set_parameter(Parameter::Turbulence(turbulence));
    }

    pub fn set_interactivity(&mut self, interactivity: f32) {
        self.set_parameter(Parameter::Interactivity(interactivity));
    }

    /// Signed pointer force; a negative value switches to repel.
    pub fn set_interactive_force(&mut self, force: f32) {
        self.set_parameter(Parameter::InteractiveForce(force));
    }

    pub fn set_mouse_mode(&mut self, mouse_mode: MouseMode) {
        self.set_parameter(Parameter::MouseMode(mouse_mode));
    }

    pub fn set_audio_reactivity(&mut self, reactivity: f32) {
        self.set_parameter(Parameter::AudioReactivity(reactivity));
    }

    /// Galaxy mode only.
    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.set_parameter(Parameter::GravityEnabled(enabled));
    }

    /// Galaxy mode only. Floored at 0.1.
    pub fn set_black_hole_mass(&mut self, mass: f32) {
        self.set_parameter(Parameter::BlackHoleMass(mass));
    }

    /// Galaxy mode only.
    pub fn set_rotation_factor(&mut self, factor: f32) {
        self.set_parameter(Parameter::RotationFactor(factor));
    }

    /// Resize the store. Floored at 1; the store is rebuilt on the next frame.
    pub fn set_particle_count(&mut self, count: usize) {
        self.set_parameter(Parameter::ParticleCount(count));
    }

    pub fn set_particle_size(&mut self, size: f32) {
        self.set_parameter(Parameter::ParticleSize(size));
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Read-only view for the renderer.
    pub fn store(&self) -> &ParticleStore {
        &self.context.store
    }

    /// Direct store access, e.g. to place particles by hand.
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.context.store
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn input(&self) -> &FrameInput {
        &self.context.input
    }

    /// Input snapshot for the next frame.
    pub fn input_mut(&mut self) -> &mut FrameInput {
        &mut self.context.input
    }

    pub fn clock(&self) -> &Clock {
        &self.context.clock
    }

    /// Pause, resume or reset simulation time.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.context.clock
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.context.config
    }

    pub fn mode(&self) -> &Mode {
        &self.context.mode
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.context.emitters
    }

    /// Population split of the current galaxy, `None` in other modes.
    pub fn population_counts(&self) -> Option<PopulationCounts> {
        self.populations
    }

    /// What the last frame's integration step did.
    pub fn last_report(&self) -> StepReport {
        self.last_report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(count: usize) -> SimulationConfig {
        SimulationConfig {
            count,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_builds_immediately() {
        let sim = SimulationController::new(small_config(100), Mode::default(), 1);
        assert_eq!(sim.store().count(), 100);
        assert!(!sim.needs_rebuild());
        assert!(sim.population_counts().is_none());
    }

    #[test]
    fn test_rebuild_is_debounced() {
        let mut sim = SimulationController::new(small_config(100), Mode::default(), 1);
        sim.set_particle_count(200);
        sim.set_particle_size(0.3);
        sim.change_color_scheme(ColorScheme::fire());
        assert!(sim.needs_rebuild());
        assert_eq!(sim.store().count(), 100);

        sim.update(0.016);
        assert!(!sim.needs_rebuild());
        assert_eq!(sim.store().count(), 200);
    }

    #[test]
    fn test_live_parameters_do_not_rebuild() {
        let mut sim = SimulationController::new(small_config(50), Mode::default(), 1);
        sim.set_speed(2.0);
        sim.set_turbulence(1.0);
        sim.set_interactivity(0.5);
        sim.set_mouse_mode(MouseMode::Repel);
        assert!(!sim.needs_rebuild());
        assert_eq!(sim.clock().time_scale(), 2.0);
        assert!(sim.config().interactive_force() < 0.0);
    }

    #[test]
    fn test_galaxy_reports_populations() {
        let sim = SimulationController::new(
            small_config(1000),
            Mode::default_for(ModeKind::Galaxy),
            3,
        );
        let counts = sim.population_counts().unwrap();
        assert_eq!(counts.total(), 1000);
    }

    #[test]
    fn test_emitter_cloud_builds_emitters() {
        let sim = SimulationController::new(
            small_config(100),
            Mode::default_for(ModeKind::EmitterCloud),
            3,
        );
        assert_eq!(sim.emitters().len(), 5);
        assert!(sim.store().lifetime().is_some());
        assert!(sim.context().lifecycle.is_some());
    }

    #[test]
    fn test_named_mutators() {
        let mut sim = SimulationController::new(small_config(10), Mode::default(), 1);
        assert_eq!(
            sim.set_parameter_by_name("turbulence", 2.0).unwrap(),
            ParameterEffect::Live
        );
        assert!(sim.set_parameter_by_name("bogus", 1.0).is_err());
        assert!(matches!(
            sim.set_color_scheme_by_name("plaid"),
            Err(ConfigError::UnknownColorScheme(_))
        ));
        sim.set_color_scheme_by_name("ocean").unwrap();
        assert_eq!(sim.config().color_scheme, ColorScheme::ocean());
        sim.set_mode_by_name("galaxy").unwrap();
        assert_eq!(sim.mode().kind(), ModeKind::Galaxy);
        assert!(sim.set_mode_by_name("spaceship").is_err());
    }

    #[test]
    fn test_paused_clock_freezes_motion() {
        let mut sim = SimulationController::new(small_config(20), Mode::default(), 4);
        sim.update(0.016);
        let before = sim.store().positions().to_vec();
        sim.clock_mut().pause();
        sim.update(0.016);
        assert_eq!(sim.store().positions(), before.as_slice());
    }
}
