//! Bass enhancer node.
//!
//! Extracts the low band with a one-pole pair, saturates it to synthesize
//! upper harmonics the ear folds back into a perceived fundamental, and
//! mixes the result against the dry path.

use cadena_core::{Context, DspError, EnvelopeFollower, NodeParams, OnePole, Runtime, sanitize};
use libm::tanh;

/// Bass enhancement node.
///
/// Parameters: `freqHz` default 120 clamp [40, 400] (band corner);
/// `drive` default 2 clamp [0.5, 10]; `amount` default 0.5 clamp [0, 1].
pub struct BassNode {
    band: OnePole,
    smoother: OnePole,
    envelope: EnvelopeFollower,
    drive: f64,
    amount: f64,
    sample_rate: f64,
}

impl BassNode {
    /// Create a bass enhancer at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            band: OnePole::new(sample_rate, 120.0),
            smoother: OnePole::new(sample_rate, 400.0),
            envelope: EnvelopeFollower::with_times(sample_rate, 5.0, 80.0),
            drive: 2.0,
            amount: 0.5,
            sample_rate,
        }
    }
}

impl Runtime for BassNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.sample_rate = ctx.sample_rate();
        self.band.set_sample_rate(self.sample_rate);
        self.smoother.set_sample_rate(self.sample_rate);
        self.envelope.set_sample_rate(self.sample_rate);

        let freq = params.number_clamped("freqHz", 120.0, 40.0, 400.0);
        self.band.set_frequency(freq);
        self.smoother.set_frequency(freq * 3.0);
        self.drive = params.number_clamped("drive", 2.0, 0.5, 10.0);
        self.amount = params.number_clamped("amount", 0.5, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);

            let low = self.band.process(input);
            // Envelope-tracked saturation keeps harmonic level proportional
            // to the bass actually present.
            let level = self.envelope.process(low);
            let harmonics = tanh(low * self.drive) * level.min(1.0);
            let shaped = self.smoother.process(harmonics);

            *sample = input + shaped * self.amount;
        }
    }

    fn reset(&mut self) {
        self.band.reset();
        self.smoother.reset();
        self.envelope.reset();
    }
}
