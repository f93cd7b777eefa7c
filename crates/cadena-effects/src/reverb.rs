//! Freeverb-style algorithmic reverb node.
//!
//! Eight parallel damped feedback combs followed by four series Schroeder
//! allpasses, with the classic Freeverb tunings (44.1 kHz reference,
//! mutually prime lengths) scaled to the running sample rate.
//!
//! Reference: Jezar at Dreampoint, Freeverb; Schroeder, "Natural Sounding
//! Artificial Reverberation", 1962.

use cadena_core::{Context, DspError, NodeParams, Runtime, flush_denormal, sanitize};
use libm::round;

/// Comb delay tunings at the 44.1 kHz reference rate.
const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass delay tunings at the 44.1 kHz reference rate.
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

const REFERENCE_RATE: f64 = 44100.0;
const ALLPASS_FEEDBACK: f64 = 0.5;
const FIXED_GAIN: f64 = 0.015;

/// Scale a reference-rate delay length to the target rate.
fn scale_to_rate(samples: usize, target_rate: f64) -> usize {
    (round(samples as f64 * target_rate / REFERENCE_RATE) as usize).max(1)
}

/// Lowpass-damped feedback comb filter.
struct DampedComb {
    buffer: Vec<f64>,
    pos: usize,
    filter_state: f64,
    feedback: f64,
    damp: f64,
}

impl DampedComb {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            pos: 0,
            filter_state: 0.0,
            feedback: 0.5,
            damp: 0.5,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let output = self.buffer[self.pos];
        self.filter_state =
            flush_denormal(output * (1.0 - self.damp) + self.filter_state * self.damp);
        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.pos = 0;
    }
}

/// Schroeder allpass diffuser.
struct SchroederAllpass {
    buffer: Vec<f64>,
    pos: usize,
}

impl SchroederAllpass {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let delayed = self.buffer[self.pos];
        let output = delayed - input;
        self.buffer[self.pos] = flush_denormal(input + delayed * ALLPASS_FEEDBACK);
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// Freeverb reverb node (`reverb`, `reverb-freeverb`).
///
/// Parameters: `roomSize` default 0.5 clamp [0, 1]; `damping` default 0.5
/// clamp [0, 1]; `mix` default 0.35 clamp [0, 1].
pub struct FreeverbNode {
    combs: Vec<DampedComb>,
    allpasses: Vec<SchroederAllpass>,
    mix: f64,
    sample_rate: f64,
}

impl FreeverbNode {
    /// Create a reverb at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            combs: COMB_TUNINGS_44K
                .iter()
                .map(|&len| DampedComb::new(scale_to_rate(len, sample_rate)))
                .collect(),
            allpasses: ALLPASS_TUNINGS_44K
                .iter()
                .map(|&len| SchroederAllpass::new(scale_to_rate(len, sample_rate)))
                .collect(),
            mix: 0.35,
            sample_rate,
        }
    }
}

impl Runtime for FreeverbNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            *self = Self::new(ctx);
        }
        let room_size = params.number_clamped("roomSize", 0.5, 0.0, 1.0);
        let damping = params.number_clamped("damping", 0.5, 0.0, 1.0);
        // Freeverb's scaling: feedback 0.7..0.98, damp 0..0.4.
        let feedback = 0.7 + room_size * 0.28;
        let damp = damping * 0.4;
        for comb in self.combs.iter_mut() {
            comb.feedback = feedback;
            comb.damp = damp;
        }
        self.mix = params.number_clamped("mix", 0.35, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let attenuated = input * FIXED_GAIN;

            let mut wet = 0.0;
            for comb in self.combs.iter_mut() {
                wet += comb.process(attenuated);
            }
            for allpass in self.allpasses.iter_mut() {
                wet = allpass.process(wet);
            }

            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        for comb in self.combs.iter_mut() {
            comb.clear();
        }
        for allpass in self.allpasses.iter_mut() {
            allpass.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(room: f64, mix: f64) -> FreeverbNode {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("r", "reverb");
        params.set_number("roomSize", room);
        params.set_number("mix", mix);
        let mut node = FreeverbNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();
        node
    }

    #[test]
    fn impulse_produces_a_decaying_tail() {
        let mut node = configured(0.5, 1.0);
        let mut block = vec![0.0; 96000];
        block[0] = 1.0;
        node.process(&mut block);

        let early: f64 = block[1000..5000].iter().map(|x| x * x).sum();
        let late: f64 = block[80000..].iter().map(|x| x * x).sum();
        assert!(early > 0.0, "tail should exist");
        assert!(late < early * 0.5, "tail should decay: early {early}, late {late}");
        assert!(block.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn larger_rooms_ring_longer() {
        let tail_energy = |room: f64| {
            let mut node = configured(room, 1.0);
            let mut block = vec![0.0; 96000];
            block[0] = 1.0;
            node.process(&mut block);
            block[48000..].iter().map(|x| x * x).sum::<f64>()
        };
        assert!(
            tail_energy(0.95) > tail_energy(0.1) * 2.0,
            "big rooms should sustain more energy"
        );
    }

    #[test]
    fn dry_mix_is_identity() {
        let mut node = configured(0.5, 0.0);
        let input: Vec<f64> = (0..256).map(|i| (i as f64 * 0.1).sin()).collect();
        let mut block = input.clone();
        node.process(&mut block);
        for (x, y) in input.iter().zip(&block) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn sustained_input_stays_bounded() {
        let mut node = configured(1.0, 1.0);
        let mut block: Vec<f64> = (0..96000).map(|i| (i as f64 * 0.05).sin()).collect();
        node.process(&mut block);
        assert!(block.iter().all(|x| x.abs() < 8.0), "reverb should not blow up");
    }
}
