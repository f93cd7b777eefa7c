//! Transient shaper.
//!
//! Envelope-derivative processor: a one-pole attack/release envelope tracks
//! the input level; the per-sample envelope delta, normalized against the
//! previous level, drives independent gain for rising edges (attack) and
//! falling edges (sustain). Positive amounts emphasize, negative amounts
//! soften.

use libm::exp;

use crate::error::{DspError, check_range};
use crate::math::sanitize;

/// Normalization guard against silence.
const EPSILON: f64 = 1e-9;

/// Attack/sustain transient shaper.
#[derive(Debug, Clone)]
pub struct TransientShaper {
    attack_amount: f64,
    sustain_amount: f64,
    attack_coeff: f64,
    release_coeff: f64,
    envelope: f64,
    prev_envelope: f64,
    sample_rate: f64,
    attack_ms: f64,
    release_ms: f64,
}

impl TransientShaper {
    /// Create a shaper with neutral amounts and 1 ms / 100 ms envelope times.
    pub fn new(sample_rate: f64) -> Result<Self, DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::SampleRateInvalid(sample_rate));
        }
        let mut shaper = Self {
            attack_amount: 0.0,
            sustain_amount: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: 0.0,
            prev_envelope: 0.0,
            sample_rate,
            attack_ms: 1.0,
            release_ms: 100.0,
        };
        shaper.recalculate_coefficients();
        Ok(shaper)
    }

    /// Set the attack emphasis in [-1, 1].
    pub fn set_attack_amount(&mut self, amount: f64) -> Result<(), DspError> {
        self.attack_amount = check_range("attack_amount", amount, -1.0, 1.0)?;
        Ok(())
    }

    /// Set the sustain emphasis in [-1, 1].
    pub fn set_sustain_amount(&mut self, amount: f64) -> Result<(), DspError> {
        self.sustain_amount = check_range("sustain_amount", amount, -1.0, 1.0)?;
        Ok(())
    }

    /// Set the envelope attack time in ms, [0.1, 100].
    pub fn set_attack_ms(&mut self, attack_ms: f64) -> Result<(), DspError> {
        self.attack_ms = check_range("attack_ms", attack_ms, 0.1, 100.0)?;
        self.recalculate_coefficients();
        Ok(())
    }

    /// Set the envelope release time in ms, [1, 1000].
    pub fn set_release_ms(&mut self, release_ms: f64) -> Result<(), DspError> {
        self.release_ms = check_range("release_ms", release_ms, 1.0, 1000.0)?;
        self.recalculate_coefficients();
        Ok(())
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::SampleRateInvalid(sample_rate));
        }
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
        Ok(())
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = 1.0 - exp(-1.0 / (self.attack_ms * 0.001 * self.sample_rate));
        self.release_coeff = 1.0 - exp(-1.0 / (self.release_ms * 0.001 * self.sample_rate));
    }

    /// Process one sample.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let input = sanitize(input);
        let level = input.abs();

        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope += (level - self.envelope) * coeff;

        let delta = self.envelope - self.prev_envelope;
        let norm = (delta.abs() / (self.prev_envelope + EPSILON)).min(1.0);
        let gain = if delta > 0.0 {
            1.0 + self.attack_amount * norm
        } else {
            1.0 + self.sustain_amount * norm
        };
        self.prev_envelope = self.envelope;

        input * gain
    }

    /// Process a block in place.
    pub fn process_in_place(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear envelope state.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.prev_envelope = 0.0;
    }
}
