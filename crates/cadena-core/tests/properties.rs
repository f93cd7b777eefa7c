//! Property-based tests for cadena-core DSP processors.
//!
//! Tests filter stability, dynamics identities, crossover reconstruction,
//! and delay line integrity using proptest for randomized input generation.

use proptest::prelude::*;

use cadena_core::{
    Biquad, DelayLine, DetectorMode, DynamicsConfig, DynamicsMode, DynamicsProcessor,
    LinkwitzRiley, MoogFilter, MoogVariant, Topology, bandpass_coefficients,
    highpass_coefficients, lowpass_coefficients, notch_coefficients,
};

/// Biquad coefficient generators indexed 0..4 (LP, HP, BP, Notch).
fn configure_biquad(biquad: &mut Biquad, variant: usize, freq: f64, q: f64) {
    let sr = 48000.0;
    let coeffs = match variant % 4 {
        0 => lowpass_coefficients(freq, q, sr),
        1 => highpass_coefficients(freq, q, sr),
        2 => bandpass_coefficients(freq, q, sr),
        3 => notch_coefficients(freq, q, sr),
        _ => unreachable!(),
    };
    biquad.set_coefficients(&coeffs);
}

fn moog_variant(index: usize) -> MoogVariant {
    match index % 6 {
        0 => MoogVariant::Classic,
        1 => MoogVariant::ClassicLightweight,
        2 => MoogVariant::ImprovedClassic,
        3 => MoogVariant::ImprovedClassicLightweight,
        4 => MoogVariant::Huovilainen,
        _ => MoogVariant::Zdf,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// For any valid cutoff (20-20000 Hz) and Q (0.1-10.0), biquad filters
    /// produce finite output for random finite input.
    #[test]
    fn biquad_stability(
        freq in 20.0f64..20000.0f64,
        q in 0.1f64..10.0f64,
        variant in 0usize..4,
        input in prop::collection::vec(-1.0f64..=1.0f64, 256),
    ) {
        let mut biquad = Biquad::new();
        configure_biquad(&mut biquad, variant, freq, q);

        for &sample in &input {
            let out = biquad.process(sample);
            prop_assert!(
                out.is_finite(),
                "biquad variant {} (freq={}, q={}) produced {} for input {}",
                variant % 4, freq, q, out, sample
            );
        }
    }

    /// The dynamics core at ratio 1 with no makeup is the identity, for any
    /// topology/detector combination and any finite input.
    #[test]
    fn dynamics_unity_ratio_identity(
        topology in 0usize..2,
        detector in 0usize..2,
        input in prop::collection::vec(-2.0f64..=2.0f64, 512),
    ) {
        let config = DynamicsConfig {
            ratio: 1.0,
            knee_db: 0.0,
            topology: if topology == 0 { Topology::Feedforward } else { Topology::Feedback },
            detector: if detector == 0 { DetectorMode::Peak } else { DetectorMode::Rms },
            ..Default::default()
        };
        let mut proc = DynamicsProcessor::new(48000.0, config).unwrap();
        for &x in &input {
            let y = proc.process_sample(x, x);
            prop_assert!((y - x).abs() < 1e-12, "ratio 1 should be identity: {x} -> {y}");
        }
    }

    /// Dynamics output stays finite for any in-range configuration.
    #[test]
    fn dynamics_finite_output(
        threshold_db in -60.0f64..0.0f64,
        ratio in 1.0f64..100.0f64,
        knee_db in 0.0f64..24.0f64,
        attack_ms in 0.1f64..1000.0f64,
        release_ms in 1.0f64..5000.0f64,
        mode in 0usize..2,
        input in prop::collection::vec(-4.0f64..=4.0f64, 256),
    ) {
        let config = DynamicsConfig {
            threshold_db,
            ratio,
            knee_db,
            attack_ms,
            release_ms,
            mode: if mode == 0 { DynamicsMode::Compress } else { DynamicsMode::Expand },
            ..Default::default()
        };
        let mut proc = DynamicsProcessor::new(48000.0, config).unwrap();
        for &x in &input {
            let y = proc.process_sample(x, x);
            prop_assert!(y.is_finite());
        }
    }

    /// LP + HP of a Linkwitz-Riley crossover reconstructs allpass energy
    /// for any frequency and supported order.
    #[test]
    fn crossover_reconstruction(
        freq in 50.0f64..18000.0f64,
        half_pairs in 1usize..=12,
    ) {
        let order = half_pairs * 2;
        let mut xo = LinkwitzRiley::new(48000.0, freq, order).unwrap();
        let mut energy = 0.0;
        for i in 0..8192 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (lo, hi) = xo.process_sample(x);
            let sum = lo + hi;
            energy += sum * sum;
        }
        prop_assert!(
            (energy - 1.0).abs() < 0.02,
            "order {} at {} Hz: energy {}",
            order, freq, energy
        );
    }

    /// Every Moog variant stays finite for any in-range parameter set and
    /// random input.
    #[test]
    fn moog_stability(
        cutoff in 20.0f64..20000.0f64,
        resonance in 0.0f64..4.0f64,
        drive in 0.1f64..24.0f64,
        variant in 0usize..6,
        oversample_pow in 0u32..4,
        input in prop::collection::vec(-2.0f64..=2.0f64, 256),
    ) {
        let mut filter = MoogFilter::new(48000.0).unwrap();
        filter.set_variant(moog_variant(variant));
        filter.set_oversampling(1 << oversample_pow).unwrap();
        filter.set_cutoff_hz(cutoff).unwrap();
        filter.set_resonance(resonance).unwrap();
        filter.set_drive(drive).unwrap();

        for &x in &input {
            let y = filter.process_sample(x);
            prop_assert!(
                y.is_finite(),
                "variant {:?} cutoff {} res {} drive {} produced {}",
                moog_variant(variant), cutoff, resonance, drive, y
            );
        }
    }

    /// Write N random samples, read them back at integer delays — they must
    /// match exactly.
    #[test]
    fn delay_line_integrity(
        samples in prop::collection::vec(-1.0f64..=1.0f64, 1..=64),
    ) {
        let n = samples.len();
        let mut delay = DelayLine::new(n + 1);
        for &s in &samples {
            delay.write(s);
        }
        for (i, &expected) in samples.iter().rev().enumerate() {
            let got = delay.read(i as f64);
            prop_assert!(
                (got - expected).abs() < 1e-12,
                "delay mismatch at delay={}: expected {}, got {}",
                i, expected, got
            );
        }
    }
}
