//! One-pole filters for tone controls and detector prefiltering.
//!
//! A single-pole IIR lowpass with the difference equation:
//!
//! ```text
//! y[n] = x[n] + coeff * (y[n-1] - x[n])
//! ```
//!
//! where `coeff = exp(-2π * freq / sample_rate)`, plus the complementary
//! highpass (`x[n] - lowpass(x)[n]`). 6 dB/octave rolloff, zero latency, one
//! multiply per sample. Used for the dynamics sidechain prefilter pair and
//! high-frequency damping in delay/reverb feedback paths.

use crate::math::flush_denormal;
use libm::exp;

/// One-pole (6 dB/oct) lowpass filter.
///
/// A cutoff of 0 Hz disables the filter: `process` passes input through
/// unchanged. The dynamics prefilter relies on this to express "no high
/// cut".
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f64,
    coeff: f64,
    sample_rate: f64,
    freq: f64,
}

impl OnePole {
    /// Create a new one-pole lowpass.
    pub fn new(sample_rate: f64, freq_hz: f64) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency in Hz. 0 disables the filter.
    pub fn set_frequency(&mut self, freq_hz: f64) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Current cutoff frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.freq
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Process one sample through the lowpass.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        if self.freq <= 0.0 {
            return input;
        }
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    fn recalculate_coeff(&mut self) {
        self.coeff = exp(-core::f64::consts::TAU * self.freq / self.sample_rate);
    }
}

/// One-pole (6 dB/oct) highpass filter, complementary to [`OnePole`].
///
/// A cutoff of 0 Hz disables the filter.
#[derive(Debug, Clone)]
pub struct OnePoleHighpass {
    lowpass: OnePole,
}

impl OnePoleHighpass {
    /// Create a new one-pole highpass.
    pub fn new(sample_rate: f64, freq_hz: f64) -> Self {
        Self {
            lowpass: OnePole::new(sample_rate, freq_hz),
        }
    }

    /// Set the cutoff frequency in Hz. 0 disables the filter.
    pub fn set_frequency(&mut self, freq_hz: f64) {
        self.lowpass.set_frequency(freq_hz);
    }

    /// Current cutoff frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.lowpass.frequency()
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.lowpass.set_sample_rate(sample_rate);
    }

    /// Process one sample through the highpass.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        if self.lowpass.freq <= 0.0 {
            return input;
        }
        input - self.lowpass.process(input)
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.lowpass.reset();
    }
}
