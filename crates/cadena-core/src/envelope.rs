//! Envelope follower for tracking signal amplitude.
//!
//! Peak detection with separate attack and release time constants. Used by
//! the vocoder band analyzer, the bass enhancer, and the transient shaper.
//! The dynamics core carries its own detector with the half-life coefficient
//! form required by its gain computer.

use libm::exp;

/// Attack/release envelope follower on `|x|`.
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f64,
    attack_coeff: f64,
    release_coeff: f64,
    sample_rate: f64,
    attack_ms: f64,
    release_ms: f64,
}

impl EnvelopeFollower {
    /// Create a follower with 10 ms attack and 100 ms release.
    pub fn new(sample_rate: f64) -> Self {
        let mut follower = Self {
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms: 10.0,
            release_ms: 100.0,
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Create with specified attack and release times.
    pub fn with_times(sample_rate: f64, attack_ms: f64, release_ms: f64) -> Self {
        let mut follower = Self::new(sample_rate);
        follower.attack_ms = attack_ms.max(0.01);
        follower.release_ms = release_ms.max(0.1);
        follower.recalculate_coefficients();
        follower
    }

    /// Set the attack time in milliseconds (floored at 0.01).
    pub fn set_attack_ms(&mut self, attack_ms: f64) {
        self.attack_ms = attack_ms.max(0.01);
        self.recalculate_coefficients();
    }

    /// Set the release time in milliseconds (floored at 0.1).
    pub fn set_release_ms(&mut self, release_ms: f64) {
        self.release_ms = release_ms.max(0.1);
        self.recalculate_coefficients();
    }

    /// Update sample rate and recalculate coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Advance the follower by one sample and return the envelope level.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let input_abs = input.abs();
        let coeff = if input_abs > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * input_abs;
        self.envelope
    }

    /// Current envelope level without processing new input.
    pub fn level(&self) -> f64 {
        self.envelope
    }

    /// Reset the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = exp(-1.0 / (self.attack_ms * self.sample_rate / 1000.0));
        self.release_coeff = exp(-1.0 / (self.release_ms * self.sample_rate / 1000.0));
    }
}
