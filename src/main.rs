//! Headless demo: runs a simulation for a number of frames and logs what
//! the store looks like.
//!
//! ```text
//! RUST_LOG=debug stardust [mode] [frames] [count] [config.json] [seed]
//! ```
//!
//! Without a seed every run draws a different galaxy.
//!
//! ```text
//! stardust galaxy 600 20000 - 42
//! ```

use stardust::prelude::*;
use stardust::spawn::entropy_rng;
use stardust::PopulationCounts;

const FRAME_DELTA: f32 = 1.0 / 60.0;

fn main() -> Result<(), ConfigError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let kind: ModeKind = args.first().map_or(Ok(ModeKind::Galaxy), |s| s.parse())?;
    let frames: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(600);

    let mut config = match args.get(3).map(String::as_str) {
        Some(path) if path != "-" => SimulationConfig::load(path)?,
        _ => SimulationConfig::default(),
    };
    if let Some(count) = args.get(2).and_then(|s| s.parse().ok()) {
        config.count = count;
    }

    let mode = Mode::default_for(kind);
    let mut sim = match args.get(4).and_then(|s| s.parse().ok()) {
        Some(seed) => SimulationController::new(config, mode, seed),
        None => SimulationController::with_rng(config, mode, entropy_rng()),
    };
    if let Some(counts) = sim.population_counts() {
        log_populations(&counts);
    }

    // Sweep the pointer through the scene and fake a pulsing audio level
    sim.input_mut().pointer.set_continuous(true);
    for frame in 0..frames {
        let t = frame as f32 * FRAME_DELTA;
        sim.input_mut()
            .pointer
            .set_position(Vec3::new(t.cos() * 8.0, t.sin() * 8.0, 0.0));
        sim.input_mut().audio.set_level(0.5 + 0.5 * (t * 3.0).sin());
        sim.update(FRAME_DELTA);

        if frame % 120 == 0 {
            log_stats(&sim);
        }
    }

    log_stats(&sim);
    Ok(())
}

fn log_populations(counts: &PopulationCounts) {
    log::info!(
        "populations: core={} arm={} halo={} nebula={} dust={}",
        counts.core,
        counts.arm,
        counts.halo,
        counts.nebula,
        counts.dust
    );
}

fn log_stats(sim: &SimulationController) {
    let store = sim.store();
    let n = store.count().max(1) as f32;
    let mean_radius = store.positions().iter().map(|p| p.length()).sum::<f32>() / n;
    let max_speed = store
        .velocities()
        .iter()
        .map(|v| v.length())
        .fold(0.0_f32, f32::max);
    let report = sim.last_report();

    log::info!(
        "t={:.2}s frame={} particles={} mean_radius={:.2} max_speed={:.3} recycled={} repaired={}",
        sim.clock().elapsed(),
        sim.clock().frame(),
        store.count(),
        mean_radius,
        max_speed,
        report.recycled,
        report.repaired
    );
}
