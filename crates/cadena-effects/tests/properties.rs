//! Property-based tests for the effect nodes.
//!
//! Every node must satisfy the Runtime contract for arbitrary in-range
//! parameters: finite output for finite input, and identical state
//! evolution regardless of block segmentation.

use proptest::prelude::*;

use cadena_core::{Context, NodeParams, Runtime};
use cadena_effects::{
    ChorusNode, DelayNode, DistortionNode, FlangerNode, PhaserNode, PitchTimeNode, TremoloNode,
};

fn noise_block(len: usize, seed: f64) -> Vec<f64> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = (state * 1103515245.0 + 12345.0) % 2.0 - 1.0;
            state
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The damped delay stays finite and bounded for any parameter corner.
    #[test]
    fn delay_finite_for_any_parameters(
        time_ms in 1.0f64..4000.0f64,
        feedback in 0.0f64..0.95f64,
        damp in 200.0f64..20000.0f64,
        mix in 0.0f64..1.0f64,
        seed in 0.1f64..0.9f64,
    ) {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("d", "delay");
        params.set_number("timeMs", time_ms);
        params.set_number("feedback", feedback);
        params.set_number("dampHz", damp);
        params.set_number("mix", mix);
        let mut node = DelayNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        let mut block = noise_block(4096, seed);
        node.process(&mut block);
        for &x in &block {
            prop_assert!(x.is_finite());
            prop_assert!(x.abs() < 64.0);
        }
    }

    /// Modulation nodes produce finite output over their full ranges.
    #[test]
    fn modulation_nodes_finite(
        rate in 0.05f64..5.0f64,
        depth in 0.0f64..1.0f64,
        mix in 0.0f64..1.0f64,
        which in 0usize..4,
        seed in 0.1f64..0.9f64,
    ) {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("m", "mod");
        params.set_number("rateHz", rate);
        params.set_number("depth", depth);
        params.set_number("mix", mix);

        let mut node: Box<dyn Runtime> = match which {
            0 => Box::new(ChorusNode::new(&ctx)),
            1 => Box::new(FlangerNode::new(&ctx)),
            2 => Box::new(PhaserNode::new(&ctx)),
            _ => Box::new(TremoloNode::new(&ctx)),
        };
        node.configure(&ctx, &params).unwrap();

        let mut block = noise_block(2048, seed);
        node.process(&mut block);
        for &x in &block {
            prop_assert!(x.is_finite());
        }
    }

    /// Distortion output magnitude is bounded for every mode at any drive.
    #[test]
    fn distortion_bounded(
        drive_db in 0.0f64..40.0f64,
        mode in 0usize..7,
        seed in 0.1f64..0.9f64,
    ) {
        let names = [
            "hardclip", "tanh", "softclip", "saturate", "saturate2", "softsat", "chebyshev",
        ];
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("d", "distortion");
        params.set_text("mode", names[mode]);
        params.set_number("driveDb", drive_db);
        let mut node = DistortionNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        let mut block = noise_block(1024, seed);
        node.process(&mut block);
        for &x in &block {
            prop_assert!(x.is_finite());
            prop_assert!(x.abs() <= 24.0, "mode {} out {}", names[mode], x);
        }
    }

    /// Splitting a block across process calls never changes the result:
    /// per-sample state evolution is independent of segmentation.
    #[test]
    fn block_segmentation_is_transparent(
        split_at in 1usize..1023,
        semitones in -12.0f64..12.0f64,
        seed in 0.1f64..0.9f64,
    ) {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("p", "pitch-time");
        params.set_number("semitones", semitones);

        let mut whole = PitchTimeNode::new(&ctx);
        whole.configure(&ctx, &params).unwrap();
        let mut split = PitchTimeNode::new(&ctx);
        split.configure(&ctx, &params).unwrap();

        let input = noise_block(1024, seed);
        let mut a = input.clone();
        whole.process(&mut a);

        let mut b = input;
        let (first, second) = b.split_at_mut(split_at);
        split.process(first);
        split.process(second);

        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!((x - y).abs() < 1e-12);
        }
    }
}
