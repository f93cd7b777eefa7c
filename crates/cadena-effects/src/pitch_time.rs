//! Time-domain pitch shifter node.
//!
//! Classic dual-tap doppler shifter: two read taps sweep a delay window at
//! a rate of `1 − 2^(semitones/12)` samples per sample, half a window
//! apart, with sin² crossfade weights. The weights sum to one, so the
//! splice points cancel instead of clicking.

use cadena_core::{Context, DelayLine, DspError, NodeParams, Runtime, sanitize};
use libm::{exp2, sin};

/// Dual-tap pitch shifter node (`pitch-time`).
///
/// Parameters: `semitones` default 0 clamp [-24, 24]; `windowMs` default 50
/// clamp [10, 200]; `mix` default 1 clamp [0, 1].
pub struct PitchTimeNode {
    line: DelayLine,
    phase: f64,
    window_samples: f64,
    rate: f64,
    mix: f64,
    sample_rate: f64,
}

impl PitchTimeNode {
    /// Create a pitch shifter at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            line: DelayLine::from_time(sample_rate, 0.25),
            phase: 0.0,
            window_samples: 50.0 / 1000.0 * sample_rate,
            rate: 1.0,
            mix: 1.0,
            sample_rate,
        }
    }
}

impl Runtime for PitchTimeNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.line = DelayLine::from_time(sample_rate, 0.25);
            self.sample_rate = sample_rate;
        }
        let semitones = params.number_clamped("semitones", 0.0, -24.0, 24.0);
        self.rate = exp2(semitones / 12.0);
        let window_ms = params.number_clamped("windowMs", 50.0, 10.0, 200.0);
        self.window_samples = window_ms / 1000.0 * sample_rate;
        self.mix = params.number_clamped("mix", 1.0, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        let window = self.window_samples;
        let drift = 1.0 - self.rate;
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            self.line.write(input);

            self.phase = (self.phase + drift).rem_euclid(window);
            let tap1 = self.phase;
            let tap2 = (self.phase + window * 0.5) % window;

            let g1 = sin(core::f64::consts::PI * tap1 / window);
            let g2 = sin(core::f64::consts::PI * tap2 / window);
            let wet = self.line.read(tap1) * g1 * g1 + self.line.read(tap2) * g2 * g2;

            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        self.phase = 0.0;
    }
}
