//! Bitcrusher node: amplitude quantization and sample-rate decimation.

use cadena_core::{Context, DspError, NodeParams, Runtime, sanitize};
use libm::{floor, pow};

/// Bitcrusher effect node.
///
/// Parameters: `bits` default 8 clamp [1, 16]; `downsample` default 1 clamp
/// [1, 64] (1 = no rate reduction); `mix` default 1 clamp [0, 1].
pub struct BitcrusherNode {
    levels: f64,
    downsample: usize,
    mix: f64,
    hold_sample: f64,
    hold_counter: usize,
}

impl BitcrusherNode {
    /// Create a bitcrusher.
    pub fn new(_ctx: &Context) -> Self {
        Self {
            levels: pow(2.0, 8.0),
            downsample: 1,
            mix: 1.0,
            hold_sample: 0.0,
            hold_counter: 0,
        }
    }
}

impl Runtime for BitcrusherNode {
    fn configure(&mut self, _ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let bits = params.number_clamped("bits", 8.0, 1.0, 16.0);
        self.levels = pow(2.0, bits);
        self.downsample = params.number_clamped("downsample", 1.0, 1.0, 64.0) as usize;
        self.mix = params.number_clamped("mix", 1.0, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        let half_levels = self.levels * 0.5;
        for sample in block.iter_mut() {
            let input = sanitize(*sample);

            if self.hold_counter == 0 {
                // Mid-rise quantizer over [-1, 1); out-of-range input clips.
                let clamped = input.clamp(-1.0, 1.0 - 1e-9);
                self.hold_sample = floor(clamped * half_levels) / half_levels
                    + 1.0 / self.levels;
                self.hold_counter = self.downsample;
            }
            self.hold_counter -= 1;

            *sample = input * (1.0 - self.mix) + self.hold_sample * self.mix;
        }
    }

    fn reset(&mut self) {
        self.hold_sample = 0.0;
        self.hold_counter = 0;
    }
}
