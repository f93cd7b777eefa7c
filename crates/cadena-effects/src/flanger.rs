//! Flanger node: short modulated delay with feedback regeneration.
//!
//! The delay sweeps around a 5 ms center, producing the comb sweep; the
//! feedback path deepens the notches.

use cadena_core::{Context, DelayLine, DspError, Lfo, NodeParams, Runtime, sanitize};
use libm::ceil;

const BASE_DELAY_MS: f64 = 5.0;
const MAX_MOD_MS: f64 = 4.0;
const MIN_DELAY_SAMPLES: f64 = 1.0;

/// Flanger effect node.
///
/// Parameters: `rateHz` default 0.5 clamp [0.05, 5]; `depth` default 0.5
/// clamp [0, 1]; `feedback` default 0.5 clamp [0, 0.95]; `mix` default 0.5
/// clamp [0, 1].
pub struct FlangerNode {
    delay: DelayLine,
    lfo: Lfo,
    base_delay_samples: f64,
    max_mod_samples: f64,
    depth: f64,
    feedback: f64,
    mix: f64,
    feedback_sample: f64,
    sample_rate: f64,
}

impl FlangerNode {
    /// Create a flanger at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        let max_delay_samples =
            ceil((BASE_DELAY_MS + MAX_MOD_MS) / 1000.0 * sample_rate) as usize + 2;
        Self {
            delay: DelayLine::new(max_delay_samples),
            lfo: Lfo::new(sample_rate, 0.5),
            base_delay_samples: BASE_DELAY_MS / 1000.0 * sample_rate,
            max_mod_samples: MAX_MOD_MS / 1000.0 * sample_rate,
            depth: 0.5,
            feedback: 0.5,
            mix: 0.5,
            feedback_sample: 0.0,
            sample_rate,
        }
    }
}

impl Runtime for FlangerNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            let max_delay_samples =
                ceil((BASE_DELAY_MS + MAX_MOD_MS) / 1000.0 * sample_rate) as usize + 2;
            self.delay = DelayLine::new(max_delay_samples);
            self.base_delay_samples = BASE_DELAY_MS / 1000.0 * sample_rate;
            self.max_mod_samples = MAX_MOD_MS / 1000.0 * sample_rate;
            self.lfo.set_sample_rate(sample_rate);
            self.sample_rate = sample_rate;
        }
        self.lfo.set_rate(params.number_clamped("rateHz", 0.5, 0.05, 5.0));
        self.depth = params.number_clamped("depth", 0.5, 0.0, 1.0);
        self.feedback = params.number_clamped("feedback", 0.5, 0.0, 0.95);
        self.mix = params.number_clamped("mix", 0.5, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);

            let modulation = self.lfo.next();
            let time = (self.base_delay_samples
                + modulation * self.depth * self.max_mod_samples)
                .max(MIN_DELAY_SAMPLES);

            let wet = self.delay.read(time);
            self.delay.write(input + self.feedback_sample * self.feedback);
            self.feedback_sample = wet;

            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.delay.clear();
        self.lfo.reset();
        self.feedback_sample = 0.0;
    }
}
