//! Impulse-response provider seam.
//!
//! Convolution reverb consumes impulse responses through this trait rather
//! than loading files itself. Providers are read-only collaborators injected
//! at chain construction and may be shared across chains.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use libm::exp;

/// Source of impulse responses for convolution processors.
pub trait ImpulseResponseProvider: Send + Sync {
    /// Produce an impulse response at the given sample rate.
    ///
    /// The response is owned by the caller; providers may synthesize or
    /// resample internally.
    fn impulse(&self, sample_rate: f64) -> Vec<f64>;
}

/// Deterministic synthetic room response: exponentially decaying noise.
///
/// The noise source is a fixed-seed LCG, so two providers with the same
/// configuration produce bit-identical responses — reloads and test runs
/// stay reproducible without a random-number dependency.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticRoomIr {
    decay_seconds: f64,
    seed: u64,
}

impl SyntheticRoomIr {
    /// Room with the given RT-style decay time.
    pub fn new(decay_seconds: f64) -> Self {
        Self {
            decay_seconds: decay_seconds.clamp(0.01, 4.0),
            seed: 0x1234_5678_9abc_def1,
        }
    }

    /// Same room shape from a different noise seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed.max(1);
        self
    }
}

impl Default for SyntheticRoomIr {
    fn default() -> Self {
        Self::new(0.15)
    }
}

impl ImpulseResponseProvider for SyntheticRoomIr {
    fn impulse(&self, sample_rate: f64) -> Vec<f64> {
        let length = ((self.decay_seconds * sample_rate) as usize).max(8);
        let mut response = Vec::with_capacity(length);
        // Decay to -60 dB over the configured time.
        let tau = self.decay_seconds / 6.9078;
        let mut state = self.seed;
        for i in 0..length {
            // xorshift64* step.
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            let noise = ((state.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 11) as f64
                / (1u64 << 53) as f64)
                * 2.0
                - 1.0;
            let t = i as f64 / sample_rate;
            let envelope = exp(-t / tau);
            response.push(noise * envelope);
        }
        // Direct-sound spike keeps the dry image localized.
        response[0] = 1.0;
        response
    }
}
