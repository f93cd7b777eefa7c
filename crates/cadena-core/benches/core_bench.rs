//! Criterion benchmarks for the heavy cadena-core processors.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cadena_core::{
    DynamicsConfig, DynamicsProcessor, LinkwitzRiley, MoogFilter, MoogVariant,
};

const BLOCK: usize = 512;

fn test_block() -> Vec<f64> {
    (0..BLOCK)
        .map(|i| (std::f64::consts::TAU * 440.0 * i as f64 / 48000.0).sin() * 0.5)
        .collect()
}

fn bench_dynamics(c: &mut Criterion) {
    let config = DynamicsConfig {
        threshold_db: -20.0,
        ratio: 4.0,
        knee_db: 6.0,
        ..Default::default()
    };
    let mut proc = DynamicsProcessor::new(48000.0, config).unwrap();
    let input = test_block();

    c.bench_function("dynamics_block_512", |b| {
        b.iter(|| {
            let mut block = input.clone();
            proc.process_in_place(black_box(&mut block));
            black_box(block[0])
        })
    });
}

fn bench_crossover(c: &mut Criterion) {
    let mut xo = LinkwitzRiley::new(48000.0, 1200.0, 8).unwrap();
    let input = test_block();
    let mut lo = vec![0.0; BLOCK];
    let mut hi = vec![0.0; BLOCK];

    c.bench_function("linkwitz_riley_lr8_block_512", |b| {
        b.iter(|| {
            xo.process_block(black_box(&input), &mut lo, &mut hi).unwrap();
            black_box(lo[0] + hi[0])
        })
    });
}

fn bench_moog(c: &mut Criterion) {
    let mut group = c.benchmark_group("moog_block_512");
    for (name, variant, oversample) in [
        ("classic_1x", MoogVariant::Classic, 1usize),
        ("huovilainen_2x", MoogVariant::Huovilainen, 2),
        ("zdf_1x", MoogVariant::Zdf, 1),
    ] {
        let mut filter = MoogFilter::new(48000.0).unwrap();
        filter.set_variant(variant);
        filter.set_oversampling(oversample).unwrap();
        filter.set_cutoff_hz(2000.0).unwrap();
        filter.set_resonance(2.5).unwrap();
        let input = test_block();

        group.bench_function(name, |b| {
            b.iter(|| {
                let mut block = input.clone();
                filter.process_in_place(black_box(&mut block));
                black_box(block[0])
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dynamics, bench_crossover, bench_moog);
criterion_main!(benches);
