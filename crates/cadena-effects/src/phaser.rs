//! Phaser node: cascaded first-order allpass stages swept by an LFO.
//!
//! Each allpass stage is `y[n] = -a·x[n] + x[n-1] + a·y[n-1]`; sweeping `a`
//! moves the notch frequencies created when the wet path is mixed against
//! the dry signal.

use cadena_core::{Context, DspError, Lfo, NodeParams, Runtime, sanitize};
use libm::{exp, pow};

const MAX_STAGES: usize = 12;

/// One first-order allpass section.
#[derive(Debug, Clone, Copy, Default)]
struct AllpassStage {
    x1: f64,
    y1: f64,
}

impl AllpassStage {
    #[inline]
    fn process(&mut self, input: f64, coeff: f64) -> f64 {
        let output = -coeff * input + self.x1 + coeff * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }
}

/// Phaser effect node.
///
/// Parameters: `rateHz` default 0.5 clamp [0.05, 5]; `depth` default 0.7
/// clamp [0, 1]; `stages` default 6 clamp [2, 12] (rounded to even);
/// `feedback` default 0.2 clamp [0, 0.9]; `centerHz` default 800 clamp
/// [100, 4000]; `mix` default 0.5 clamp [0, 1].
pub struct PhaserNode {
    stages: [AllpassStage; MAX_STAGES],
    num_stages: usize,
    lfo: Lfo,
    depth: f64,
    feedback: f64,
    center_hz: f64,
    mix: f64,
    feedback_sample: f64,
    sample_rate: f64,
}

impl PhaserNode {
    /// Create a phaser at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        Self {
            stages: [AllpassStage::default(); MAX_STAGES],
            num_stages: 6,
            lfo: Lfo::new(ctx.sample_rate(), 0.5),
            depth: 0.7,
            feedback: 0.2,
            center_hz: 800.0,
            mix: 0.5,
            feedback_sample: 0.0,
            sample_rate: ctx.sample_rate(),
        }
    }
}

impl Runtime for PhaserNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.sample_rate = ctx.sample_rate();
        self.lfo.set_sample_rate(self.sample_rate);
        self.lfo.set_rate(params.number_clamped("rateHz", 0.5, 0.05, 5.0));
        self.depth = params.number_clamped("depth", 0.7, 0.0, 1.0);
        self.feedback = params.number_clamped("feedback", 0.2, 0.0, 0.9);
        self.center_hz = params.number_clamped("centerHz", 800.0, 100.0, 4000.0);
        self.mix = params.number_clamped("mix", 0.5, 0.0, 1.0);
        let stages = params.number_clamped("stages", 6.0, 2.0, MAX_STAGES as f64) as usize;
        self.num_stages = (stages / 2) * 2;
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        let nyquist = self.sample_rate * 0.5;
        for sample in block.iter_mut() {
            let input = sanitize(*sample);

            // Exponential sweep around the center: one octave either way at
            // full depth.
            let modulation = self.lfo.next() * self.depth;
            let freq = (self.center_hz * pow(2.0, modulation)).min(nyquist * 0.9);
            let coeff = exp(-core::f64::consts::TAU * freq / self.sample_rate);

            let mut wet = input + self.feedback_sample * self.feedback;
            for stage in self.stages[..self.num_stages].iter_mut() {
                wet = stage.process(wet, coeff);
            }
            self.feedback_sample = wet;

            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.stages = [AllpassStage::default(); MAX_STAGES];
        self.lfo.reset();
        self.feedback_sample = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_stays_finite() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("p", "phaser");
        params.set_number("feedback", 0.9);
        params.set_number("depth", 1.0);
        params.set_number("stages", 12.0);
        let mut phaser = PhaserNode::new(&ctx);
        phaser.configure(&ctx, &params).unwrap();

        let mut block: Vec<f64> = (0..48000).map(|i| ((i as f64) * 0.11).sin()).collect();
        phaser.process(&mut block);
        assert!(block.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn stage_count_rounds_to_even() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("p", "phaser");
        params.set_number("stages", 5.0);
        let mut phaser = PhaserNode::new(&ctx);
        phaser.configure(&ctx, &params).unwrap();
        assert_eq!(phaser.num_stages, 4);
    }

    #[test]
    fn dry_mix_is_identity() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("p", "phaser");
        params.set_number("mix", 0.0);
        let mut phaser = PhaserNode::new(&ctx);
        phaser.configure(&ctx, &params).unwrap();

        let input: Vec<f64> = (0..128).map(|i| ((i as f64) * 0.2).sin()).collect();
        let mut block = input.clone();
        phaser.process(&mut block);
        for (x, y) in input.iter().zip(&block) {
            assert!((x - y).abs() < 1e-12);
        }
    }
}
