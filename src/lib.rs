//! # Stardust
//!
//! Simulation core for an audio-reactive particle visualizer: a drifting
//! particle cloud, a spiral galaxy orbiting a central mass, and an emitter
//! cloud whose particles live, fade and are reborn.
//!
//! Stardust owns the particle state and its per-frame update. Rendering,
//! camera control, UI widgets and audio capture live outside; they feed
//! plain values in through [`FrameInput`] and read the [`ParticleStore`]
//! back out.
//!
//! ## Quick Start
//!
//! ```ignore
//! use stardust::prelude::*;
//!
//! let config = SimulationConfig {
//!     count: 20_000,
//!     ..Default::default()
//! };
//! let mut sim = SimulationController::new(config, Mode::default_for(ModeKind::Galaxy), 42);
//!
//! let mut vertices = Vec::new();
//! loop {
//!     sim.input_mut().audio.set_level(audio_level);
//!     sim.update(frame_delta);
//!     sim.store().write_vertices(&mut vertices);
//!     // upload `bytemuck::cast_slice(&vertices)` and draw
//! }
//! ```
//!
//! ## Frame Pipeline
//!
//! Each [`SimulationController::update`]:
//!
//! 1. performs at most one pending rebuild (mode or structural change)
//! 2. advances the [`Clock`] (delta clamped, scaled by speed)
//! 3. runs the [`ForceModel`] into the acceleration and impulse buffers
//! 4. integrates, contains, recycles, restyles and sanitizes the store
//!
//! ## Modes
//!
//! | Mode | Generation | Forces |
//! |------|------------|--------|
//! | [`Mode::Particle`] | sphere of drifting particles | turbulence, pointer, audio |
//! | [`Mode::Galaxy`] | core, arms, halo, nebulae, dust | central gravity, pointer, soft containment, audio |
//! | [`Mode::EmitterCloud`] | particles born from orbiting emitters | turbulence, pointer, audio |
//!
//! All randomness goes through [`RandomSource`]; a seeded controller
//! reproduces the same simulation every run.

pub mod cloud;
pub mod config;
pub mod emitter;
pub mod error;
pub mod forces;
pub mod galaxy;
pub mod input;
pub mod integrator;
pub mod lifecycle;
pub mod simulation;
pub mod spawn;
pub mod store;
pub mod time;
pub mod visuals;

pub use bytemuck;
pub use glam::Vec3;

pub use config::{
    CloudParams, DriftParams, GalaxyParams, Mode, ModeKind, MouseMode, Parameter, ParameterEffect,
    PopulationFractions, SimulationConfig,
};
pub use emitter::Emitter;
pub use error::ConfigError;
pub use forces::{Force, ForceModel};
pub use galaxy::PopulationCounts;
pub use input::{AudioInput, FrameInput, PointerInput};
pub use lifecycle::Lifecycle;
pub use simulation::{SimulationContext, SimulationController};
pub use spawn::RandomSource;
pub use store::{ParticleKind, ParticleStore, RenderVertex};
pub use time::Clock;
pub use visuals::ColorScheme;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use stardust::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        CloudParams, DriftParams, GalaxyParams, Mode, ModeKind, MouseMode, Parameter,
        ParameterEffect, SimulationConfig,
    };
    pub use crate::emitter::Emitter;
    pub use crate::error::ConfigError;
    pub use crate::input::FrameInput;
    pub use crate::simulation::SimulationController;
    pub use crate::spawn::{seeded_rng, RandomSource};
    pub use crate::store::{ParticleKind, ParticleStore, RenderVertex};
    pub use crate::visuals::ColorScheme;
    pub use glam::Vec3;
}
