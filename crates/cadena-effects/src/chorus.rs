//! Dual-voice chorus node.
//!
//! Two modulated delay taps around a 15 ms center, LFOs 90° apart, averaged
//! and blended with the dry path.

use cadena_core::{Context, DelayLine, DspError, Lfo, NodeParams, Runtime, sanitize};
use libm::ceil;

const BASE_DELAY_MS: f64 = 15.0;
const MAX_MOD_MS: f64 = 5.0;

/// Chorus effect node.
///
/// Parameters: `rateHz` default 1 clamp [0.05, 10]; `depth` default 0.5
/// clamp [0, 1]; `mix` default 0.5 clamp [0, 1].
pub struct ChorusNode {
    delay1: DelayLine,
    delay2: DelayLine,
    lfo1: Lfo,
    lfo2: Lfo,
    base_delay_samples: f64,
    max_mod_samples: f64,
    depth: f64,
    mix: f64,
    sample_rate: f64,
}

impl ChorusNode {
    /// Create a chorus at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        let max_delay_samples =
            ceil((BASE_DELAY_MS + MAX_MOD_MS) / 1000.0 * sample_rate) as usize + 2;

        let mut lfo2 = Lfo::new(sample_rate, 1.0);
        lfo2.set_phase(0.25);

        Self {
            delay1: DelayLine::new(max_delay_samples),
            delay2: DelayLine::new(max_delay_samples),
            lfo1: Lfo::new(sample_rate, 1.0),
            lfo2,
            base_delay_samples: BASE_DELAY_MS / 1000.0 * sample_rate,
            max_mod_samples: MAX_MOD_MS / 1000.0 * sample_rate,
            depth: 0.5,
            mix: 0.5,
            sample_rate,
        }
    }

    fn rebuild_for_rate(&mut self, sample_rate: f64) {
        let max_delay_samples =
            ceil((BASE_DELAY_MS + MAX_MOD_MS) / 1000.0 * sample_rate) as usize + 2;
        self.delay1 = DelayLine::new(max_delay_samples);
        self.delay2 = DelayLine::new(max_delay_samples);
        self.base_delay_samples = BASE_DELAY_MS / 1000.0 * sample_rate;
        self.max_mod_samples = MAX_MOD_MS / 1000.0 * sample_rate;
        self.lfo1.set_sample_rate(sample_rate);
        self.lfo2.set_sample_rate(sample_rate);
        self.sample_rate = sample_rate;
    }
}

impl Runtime for ChorusNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        if (ctx.sample_rate() - self.sample_rate).abs() > f64::EPSILON {
            self.rebuild_for_rate(ctx.sample_rate());
        }
        let rate = params.number_clamped("rateHz", 1.0, 0.05, 10.0);
        self.lfo1.set_rate(rate);
        self.lfo2.set_rate(rate);
        self.depth = params.number_clamped("depth", 0.5, 0.0, 1.0);
        self.mix = params.number_clamped("mix", 0.5, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);

            let mod1 = self.lfo1.next();
            let mod2 = self.lfo2.next();
            let time1 = self.base_delay_samples + mod1 * self.depth * self.max_mod_samples;
            let time2 = self.base_delay_samples + mod2 * self.depth * self.max_mod_samples;

            let wet1 = self.delay1.read(time1);
            let wet2 = self.delay2.read(time2);
            self.delay1.write(input);
            self.delay2.write(input);

            let wet = (wet1 + wet2) * 0.5;
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.delay1.clear();
        self.delay2.clear();
        self.lfo1.reset();
        self.lfo2.set_phase(0.25);
    }
}
