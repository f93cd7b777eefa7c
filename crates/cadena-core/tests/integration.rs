//! Cross-module integration tests for cadena-core.

use cadena_core::{
    Context, DeEsser, DeEsserDetector, DeEsserMode, DynamicsConfig, DynamicsProcessor,
    LookaheadLimiter, MultibandCompressor, MultibandSplitter, NodeParams, NodeRuntime, Runtime,
    db_to_linear,
};

/// A compressor feeding a lookahead limiter behaves like a mastering pair:
/// the limiter's ceiling bounds the compressor's makeup-boosted output.
#[test]
fn compressor_into_limiter_respects_ceiling() {
    let config = DynamicsConfig {
        threshold_db: -24.0,
        ratio: 3.0,
        knee_db: 6.0,
        attack_ms: 5.0,
        release_ms: 80.0,
        auto_makeup: true,
        ..Default::default()
    };
    let mut compressor = DynamicsProcessor::new(48000.0, config).unwrap();
    let mut limiter = LookaheadLimiter::new(48000.0, -3.0, 2.0, 60.0).unwrap();

    let ceiling = db_to_linear(-3.0);
    let mut peak: f64 = 0.0;
    for i in 0..96000 {
        let x = (std::f64::consts::TAU * 220.0 * i as f64 / 48000.0).sin() * 0.9;
        let compressed = compressor.process_sample(x, x);
        let out = limiter.process_sample(compressed, compressed);
        if i > 48000 {
            peak = peak.max(out.abs());
        }
    }
    assert!(
        peak < ceiling * 1.1,
        "limiter ceiling {ceiling} exceeded: peak {peak}"
    );
}

/// The splitter feeding per-band passthrough dynamics reconstructs the
/// input's long-run RMS.
#[test]
fn multiband_passthrough_preserves_rms() {
    let configs = [DynamicsConfig {
        ratio: 1.0,
        knee_db: 0.0,
        ..Default::default()
    }; 3];
    let mut mb = MultibandCompressor::new(48000.0, &[250.0, 2500.0], 4, &configs).unwrap();

    let mut in_energy = 0.0;
    let mut out_energy = 0.0;
    for i in 0..96000 {
        let x = (std::f64::consts::TAU * 440.0 * i as f64 / 48000.0).sin() * 0.5
            + (std::f64::consts::TAU * 3500.0 * i as f64 / 48000.0).sin() * 0.25;
        let y = mb.process_sample(x);
        if i > 48000 {
            in_energy += x * x;
            out_energy += y * y;
        }
    }
    let ratio = out_energy / in_energy;
    assert!(
        (ratio - 1.0).abs() < 0.05,
        "passthrough multiband should preserve energy, ratio {ratio}"
    );
}

/// Splitting, then summing, then de-essing a broadband signal stays finite
/// and bounded from block to block.
#[test]
fn splitter_deesser_pipeline_is_stable() {
    let mut splitter = MultibandSplitter::new(48000.0, &[400.0, 4000.0], 8).unwrap();
    let mut deesser = DeEsser::new(
        48000.0,
        6500.0,
        2.5,
        3,
        DeEsserDetector::Highpass,
        DeEsserMode::SplitBand,
        DynamicsConfig {
            threshold_db: -30.0,
            ratio: 6.0,
            knee_db: 3.0,
            attack_ms: 0.3,
            release_ms: 60.0,
            ..Default::default()
        },
    )
    .unwrap();

    let mut bands = [0.0; 3];
    let mut state = 0.3;
    for _ in 0..48000 {
        state = (state * 1103515245.0 + 12345.0) % 2.0 - 1.0;
        splitter.process_sample(state, &mut bands);
        let summed: f64 = bands.iter().sum();
        let out = deesser.process_sample(summed);
        assert!(out.is_finite());
        assert!(out.abs() < 16.0, "runaway output {out}");
    }
}

/// NodeRuntime wrapping works through the generic contract: a small gain
/// runtime is configurable from a parameter bag and processes in place.
#[test]
fn runtime_contract_round_trip() {
    struct GainNode {
        gain: f64,
    }

    impl Runtime for GainNode {
        fn configure(
            &mut self,
            _ctx: &Context,
            params: &NodeParams,
        ) -> Result<(), cadena_core::DspError> {
            self.gain = params.number_clamped("gain", 1.0, 0.0, 16.0);
            Ok(())
        }
        fn process(&mut self, block: &mut [f64]) {
            for sample in block.iter_mut() {
                *sample *= self.gain;
            }
        }
        fn reset(&mut self) {}
    }

    let ctx = Context::new(48000.0).unwrap();
    let mut params = NodeParams::new("g1", "gain");
    params.set_number("gain", 2.5);

    let mut node = NodeRuntime::Generic(Box::new(GainNode { gain: 1.0 }));
    node.configure(&ctx, &params).unwrap();

    let mut block = vec![0.0, 1.0, -1.0, 0.4];
    node.process(&mut block);
    assert_eq!(block, vec![0.0, 2.5, -2.5, 1.0]);
    assert_eq!(node.latency_samples(), 0);
}
