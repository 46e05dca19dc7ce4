//! Benchmarks for generation and the per-frame update.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use stardust::galaxy::generate_galaxy;
use stardust::prelude::*;

fn config(count: usize) -> SimulationConfig {
    SimulationConfig {
        count,
        ..Default::default()
    }
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    for kind in [ModeKind::Particle, ModeKind::Galaxy, ModeKind::EmitterCloud] {
        for count in [1_000, 10_000, 50_000] {
            group.bench_with_input(BenchmarkId::new(kind.name(), count), &count, |b, &count| {
                let mut sim = SimulationController::new(config(count), Mode::default_for(kind), 1);
                b.iter(|| sim.update(black_box(0.016)))
            });
        }
    }

    group.finish();
}

fn bench_update_with_input(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_with_input");

    for kind in [ModeKind::Particle, ModeKind::Galaxy] {
        group.bench_function(kind.name(), |b| {
            let mut sim = SimulationController::new(config(10_000), Mode::default_for(kind), 2);
            sim.input_mut().pointer.set_continuous(true);
            sim.input_mut().pointer.set_position(Vec3::new(3.0, 1.0, 0.0));
            sim.input_mut().audio.set_spectrum(&[0.1, 0.5, 0.9, 0.3]);
            b.iter(|| sim.update(black_box(0.016)))
        });
    }

    group.finish();
}

fn bench_generate_galaxy(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_galaxy");
    let params = GalaxyParams::default();

    for count in [1_000, 10_000, 50_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut store = ParticleStore::with_galaxy(count);
            let mut rng = seeded_rng(3);
            b.iter(|| black_box(generate_galaxy(&mut store, &params, 0.15, &mut rng)))
        });
    }

    group.finish();
}

fn bench_render_view(c: &mut Criterion) {
    let sim = SimulationController::new(config(50_000), Mode::default_for(ModeKind::Galaxy), 4);
    let mut vertices = Vec::with_capacity(50_000);

    c.bench_function("write_vertices_50k", |b| {
        b.iter(|| {
            sim.store().write_vertices(&mut vertices);
            black_box(vertices.len())
        })
    });
}

criterion_group!(
    benches,
    bench_update,
    bench_update_with_input,
    bench_generate_galaxy,
    bench_render_view
);
criterion_main!(benches);
