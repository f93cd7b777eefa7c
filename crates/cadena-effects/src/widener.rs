//! Widener node: phase-dispersion allpass chain.
//!
//! In a single-channel chain, width is realized as phase dispersion: a
//! cascade of staggered second-order allpasses smears the phase without
//! touching the magnitude, and the `width` control blends the dispersed
//! signal against the dry path. Running two chain instances with different
//! node ids yields decorrelated channels and the stereo effect.

use cadena_core::{Biquad, Context, DspError, NodeParams, Runtime, allpass_coefficients, sanitize};

/// Staggered allpass centers (Hz), spread across the spectrum.
const STAGE_FREQS: [f64; 6] = [147.0, 385.0, 910.0, 2100.0, 4900.0, 11300.0];

/// Widener effect node.
///
/// Parameters: `width` default 0.5 clamp [0, 1]; `stages` default 4 clamp
/// [1, 6].
pub struct WidenerNode {
    stages: Vec<Biquad>,
    num_stages: usize,
    width: f64,
    sample_rate: f64,
}

impl WidenerNode {
    /// Create a widener at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        let stages = STAGE_FREQS
            .iter()
            .map(|&freq| {
                Biquad::with_coefficients(&allpass_coefficients(
                    freq.min(sample_rate * 0.45),
                    0.6,
                    sample_rate,
                ))
            })
            .collect();
        Self {
            stages,
            num_stages: 4,
            width: 0.5,
            sample_rate,
        }
    }
}

impl Runtime for WidenerNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            for (stage, &freq) in self.stages.iter_mut().zip(STAGE_FREQS.iter()) {
                stage.set_coefficients(&allpass_coefficients(
                    freq.min(sample_rate * 0.45),
                    0.6,
                    sample_rate,
                ));
            }
            self.sample_rate = sample_rate;
        }
        self.width = params.number_clamped("width", 0.5, 0.0, 1.0);
        self.num_stages = params.number_clamped("stages", 4.0, 1.0, 6.0) as usize;
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let mut dispersed = input;
            for stage in self.stages[..self.num_stages].iter_mut() {
                dispersed = stage.process(dispersed);
            }
            *sample = input * (1.0 - self.width) + dispersed * self.width;
        }
    }

    fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_is_identity() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("w", "widener");
        params.set_number("width", 0.0);
        let mut node = WidenerNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        let input: Vec<f64> = (0..256).map(|i| (i as f64 * 0.1).sin()).collect();
        let mut block = input.clone();
        node.process(&mut block);
        assert_eq!(block, input);
    }

    #[test]
    fn full_width_preserves_energy() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("w", "widener");
        params.set_number("width", 1.0);
        params.set_number("stages", 6.0);
        let mut node = WidenerNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        // Allpass cascade: unit impulse energy is preserved.
        let mut block = vec![0.0; 8192];
        block[0] = 1.0;
        node.process(&mut block);
        let energy: f64 = block.iter().map(|x| x * x).sum();
        assert!((energy - 1.0).abs() < 1e-6, "allpass energy {energy}");
    }

    #[test]
    fn dispersion_changes_the_waveform() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("w", "widener");
        params.set_number("width", 1.0);
        let mut node = WidenerNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        let input: Vec<f64> = (0..512).map(|i| (i as f64 * 0.15).sin()).collect();
        let mut block = input.clone();
        node.process(&mut block);
        let diff: f64 = input.iter().zip(&block).map(|(x, y)| (x - y).abs()).sum();
        assert!(diff > 1.0, "dispersion should alter the phase, diff {diff}");
    }
}
