//! Ring modulator node: carrier-oscillator product with wet/dry blend.

use cadena_core::{Context, DspError, NodeParams, Runtime, sanitize};
use libm::sin;

/// Ring modulator effect node.
///
/// Parameters: `freqHz` default 440 clamp [1, 8000]; `mix` default 1 clamp
/// [0, 1].
pub struct RingModNode {
    phase: f64,
    increment: f64,
    freq_hz: f64,
    mix: f64,
    sample_rate: f64,
}

impl RingModNode {
    /// Create a ring modulator at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            phase: 0.0,
            increment: 440.0 / sample_rate,
            freq_hz: 440.0,
            mix: 1.0,
            sample_rate,
        }
    }
}

impl Runtime for RingModNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.sample_rate = ctx.sample_rate();
        self.freq_hz = params.number_clamped("freqHz", 440.0, 1.0, 8000.0);
        self.increment = self.freq_hz / self.sample_rate;
        self.mix = params.number_clamped("mix", 1.0, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let carrier = sin(core::f64::consts::TAU * self.phase);
            self.phase += self.increment;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            let wet = input * carrier;
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_wet_multiplies_by_carrier() {
        let ctx = Context::new(48000.0).unwrap();
        let mut node = RingModNode::new(&ctx);
        node.configure(&ctx, &NodeParams::new("r", "ringmod")).unwrap();

        // DC input: the output traces the carrier itself.
        let mut block = vec![1.0; 4800];
        node.process(&mut block);
        let max = block.iter().cloned().fold(f64::MIN, f64::max);
        let min = block.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max > 0.99 && min < -0.99, "carrier should swing ±1: {min}..{max}");
    }

    #[test]
    fn dry_mix_is_identity() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("r", "ringmod");
        params.set_number("mix", 0.0);
        let mut node = RingModNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        let input: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
        let mut block = input.clone();
        node.process(&mut block);
        assert_eq!(block, input);
    }
}
