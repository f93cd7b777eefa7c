//! Convolution reverb node.
//!
//! Direct FIR convolution against an impulse response obtained from the
//! injected [`ImpulseResponseProvider`]. The response is fetched once per
//! configure (and on sample-rate change); the hot path is a plain
//! multiply-accumulate over a history ring.

use std::sync::Arc;

use cadena_core::{Context, DspError, ImpulseResponseProvider, NodeParams, Runtime, sanitize};

/// Hard cap on the impulse length (samples) to bound the per-sample cost.
const MAX_IR_SAMPLES: usize = 96000;

/// Convolution reverb node (`reverb-conv`).
///
/// Parameters: `mix` default 0.35 clamp [0, 1]; `gainDb` default 0 clamp
/// [-24, 24].
pub struct ConvolutionNode {
    provider: Arc<dyn ImpulseResponseProvider>,
    impulse: Vec<f64>,
    history: Vec<f64>,
    position: usize,
    mix: f64,
    gain: f64,
    sample_rate: f64,
}

impl ConvolutionNode {
    /// Create a convolution node with the given IR provider.
    pub fn new(ctx: &Context, provider: Arc<dyn ImpulseResponseProvider>) -> Self {
        let sample_rate = ctx.sample_rate();
        let mut impulse = provider.impulse(sample_rate);
        impulse.truncate(MAX_IR_SAMPLES);
        let history = vec![0.0; impulse.len().max(1)];
        Self {
            provider,
            impulse,
            history,
            position: 0,
            mix: 0.35,
            gain: 1.0,
            sample_rate,
        }
    }

    /// Length of the loaded impulse response in samples.
    pub fn impulse_len(&self) -> usize {
        self.impulse.len()
    }
}

impl Runtime for ConvolutionNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON || self.impulse.is_empty() {
            self.sample_rate = sample_rate;
            self.impulse = self.provider.impulse(sample_rate);
            self.impulse.truncate(MAX_IR_SAMPLES);
            self.history = vec![0.0; self.impulse.len().max(1)];
            self.position = 0;
        }
        self.mix = params.number_clamped("mix", 0.35, 0.0, 1.0);
        self.gain = cadena_core::db_to_linear(params.number_clamped("gainDb", 0.0, -24.0, 24.0));
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        let len = self.history.len();
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            self.history[self.position] = input;

            // MAC over the ring: history[pos - k] * ir[k].
            let mut acc = 0.0;
            let mut index = self.position;
            for &tap in &self.impulse {
                acc += self.history[index] * tap;
                index = if index == 0 { len - 1 } else { index - 1 };
            }
            self.position = (self.position + 1) % len;

            let wet = acc * self.gain;
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trivial provider with a known short response.
    struct TestIr;

    impl ImpulseResponseProvider for TestIr {
        fn impulse(&self, _sample_rate: f64) -> Vec<f64> {
            vec![1.0, 0.0, 0.5, 0.0, 0.25]
        }
    }

    #[test]
    fn convolves_with_the_provided_response() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("c", "reverb-conv");
        params.set_number("mix", 1.0);
        let mut node = ConvolutionNode::new(&ctx, Arc::new(TestIr));
        node.configure(&ctx, &params).unwrap();

        let mut block = vec![0.0; 8];
        block[0] = 1.0;
        node.process(&mut block);
        let expected = [1.0, 0.0, 0.5, 0.0, 0.25, 0.0, 0.0, 0.0];
        for (got, want) in block.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn default_provider_yields_a_decaying_room() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("c", "reverb-conv");
        params.set_number("mix", 1.0);
        let provider = Arc::new(cadena_core::SyntheticRoomIr::new(0.05));
        let mut node = ConvolutionNode::new(&ctx, provider);
        node.configure(&ctx, &params).unwrap();
        assert!(node.impulse_len() > 1000);

        let mut block = vec![0.0; 4800];
        block[0] = 1.0;
        node.process(&mut block);
        assert!(block.iter().all(|x| x.is_finite()));
        let tail: f64 = block[4000..].iter().map(|x| x.abs()).fold(0.0, f64::max);
        assert!(tail < 0.2, "synthetic room should decay, tail peak {tail}");
    }

    #[test]
    fn dry_mix_is_identity() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("c", "reverb-conv");
        params.set_number("mix", 0.0);
        let mut node = ConvolutionNode::new(&ctx, Arc::new(TestIr));
        node.configure(&ctx, &params).unwrap();

        let input: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
        let mut block = input.clone();
        node.process(&mut block);
        assert_eq!(block, input);
    }
}
