//! Feedback Delay Network reverb node.
//!
//! An 8-line FDN with Hadamard feedback mixing (fast Walsh-Hadamard
//! butterfly), one-pole damping per line, and a short predelay. The
//! Hadamard matrix is orthogonal after the 1/√8 scale, so the loop's energy
//! is controlled entirely by the per-line feedback gain.
//!
//! References: Jot & Chaigne, "Digital Delay Networks for Designing
//! Artificial Reverberators", AES 1991; Freeverb delay tunings.

use cadena_core::{Context, DelayLine, DspError, NodeParams, OnePole, Runtime, sanitize};
use libm::{pow, round};

/// FDN delay tunings at 44.1 kHz reference (mutually prime).
const FDN_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

const REFERENCE_RATE: f64 = 44100.0;

/// Hadamard scale: 1/sqrt(8) for energy preservation.
const HADAMARD_SCALE: f64 = 0.35355339059327373;

const MAX_PREDELAY_MS: f64 = 200.0;

/// In-place butterfly on elements `i` and `j`.
#[inline]
fn butterfly_at(buf: &mut [f64; 8], i: usize, j: usize) {
    let sum = buf[i] + buf[j];
    let diff = buf[i] - buf[j];
    buf[i] = sum;
    buf[j] = diff;
}

/// 8-point fast Walsh-Hadamard transform, energy-preserving scale.
#[inline]
fn hadamard8(buf: &mut [f64; 8]) {
    butterfly_at(buf, 0, 1);
    butterfly_at(buf, 2, 3);
    butterfly_at(buf, 4, 5);
    butterfly_at(buf, 6, 7);

    butterfly_at(buf, 0, 2);
    butterfly_at(buf, 1, 3);
    butterfly_at(buf, 4, 6);
    butterfly_at(buf, 5, 7);

    butterfly_at(buf, 0, 4);
    butterfly_at(buf, 1, 5);
    butterfly_at(buf, 2, 6);
    butterfly_at(buf, 3, 7);

    for x in buf.iter_mut() {
        *x *= HADAMARD_SCALE;
    }
}

/// FDN reverb node (`reverb-fdn`).
///
/// Parameters: `decay` default 0.6 clamp [0, 1]; `damping` default 0.5
/// clamp [0, 1]; `preDelayMs` default 10 clamp [0, 200]; `mix` default 0.35
/// clamp [0, 1].
pub struct FdnReverbNode {
    lines: Vec<DelayLine>,
    line_lengths: [f64; 8],
    damping_filters: Vec<OnePole>,
    feedback_state: [f64; 8],
    predelay: DelayLine,
    predelay_samples: f64,
    feedback_gain: f64,
    mix: f64,
    sample_rate: f64,
}

impl FdnReverbNode {
    /// Create an FDN reverb at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        let mut line_lengths = [0.0; 8];
        let lines = FDN_TUNINGS_44K
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let scaled = (round(len as f64 * sample_rate / REFERENCE_RATE) as usize).max(1);
                line_lengths[i] = scaled as f64;
                DelayLine::new(scaled + 2)
            })
            .collect();
        Self {
            lines,
            line_lengths,
            damping_filters: (0..8).map(|_| OnePole::new(sample_rate, 6000.0)).collect(),
            feedback_state: [0.0; 8],
            predelay: DelayLine::from_time(sample_rate, MAX_PREDELAY_MS / 1000.0),
            predelay_samples: 10.0 / 1000.0 * sample_rate,
            feedback_gain: 0.75,
            mix: 0.35,
            sample_rate,
        }
    }
}

impl Runtime for FdnReverbNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            *self = Self::new(ctx);
        }
        let decay = params.number_clamped("decay", 0.6, 0.0, 1.0);
        // 0.5..0.97: below self-oscillation for an orthogonal mixer.
        self.feedback_gain = 0.5 + decay * 0.47;

        let damping = params.number_clamped("damping", 0.5, 0.0, 1.0);
        // Log-mapped damping corner: 20 kHz bright, 200 Hz dark.
        let cutoff = 200.0 * pow(100.0, 1.0 - damping);
        for filter in self.damping_filters.iter_mut() {
            filter.set_frequency(cutoff.min(sample_rate * 0.45));
        }

        let predelay_ms = params.number_clamped("preDelayMs", 10.0, 0.0, MAX_PREDELAY_MS);
        self.predelay_samples = predelay_ms / 1000.0 * sample_rate;
        self.mix = params.number_clamped("mix", 0.35, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let delayed_in = self.predelay.read_write(input, self.predelay_samples);

            // Read the line outputs, mix through the Hadamard, re-inject.
            let mut outputs = [0.0; 8];
            for (i, line) in self.lines.iter().enumerate() {
                outputs[i] = line.read(self.line_lengths[i]);
            }
            let wet: f64 = outputs.iter().sum::<f64>() * 0.25;

            hadamard8(&mut outputs);
            for i in 0..8 {
                let damped = self.damping_filters[i].process(outputs[i]);
                self.feedback_state[i] = damped * self.feedback_gain;
                // Alternate injection polarity decorrelates the lines.
                let inject = if i % 2 == 0 { delayed_in } else { -delayed_in };
                self.lines[i].write(inject * 0.125 + self.feedback_state[i]);
            }

            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            line.clear();
        }
        for filter in self.damping_filters.iter_mut() {
            filter.reset();
        }
        self.feedback_state = [0.0; 8];
        self.predelay.clear();
    }
}
