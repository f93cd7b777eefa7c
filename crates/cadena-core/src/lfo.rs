//! Low-frequency oscillator for modulation effects.
//!
//! Phase-accumulator oscillator with four waveforms, used by the chorus,
//! flanger, phaser, and tremolo nodes. Output range is [-1, 1].

use libm::sin;

/// LFO waveform selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoWaveform {
    /// Sine wave.
    #[default]
    Sine,
    /// Triangle wave.
    Triangle,
    /// Rising sawtooth.
    Saw,
    /// Square wave.
    Square,
}

impl LfoWaveform {
    /// Normalize a waveform name. Unknown names fall back to sine.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "triangle" => Self::Triangle,
            "saw" | "sawtooth" => Self::Saw,
            "square" => Self::Square,
            _ => Self::Sine,
        }
    }
}

/// Phase-accumulating low-frequency oscillator.
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f64,
    increment: f64,
    rate_hz: f64,
    sample_rate: f64,
    waveform: LfoWaveform,
}

impl Lfo {
    /// Create an LFO with the given rate.
    pub fn new(sample_rate: f64, rate_hz: f64) -> Self {
        let mut lfo = Self {
            phase: 0.0,
            increment: 0.0,
            rate_hz,
            sample_rate,
            waveform: LfoWaveform::default(),
        };
        lfo.recalculate_increment();
        lfo
    }

    /// Set the rate in Hz.
    pub fn set_rate(&mut self, rate_hz: f64) {
        self.rate_hz = rate_hz.max(0.0);
        self.recalculate_increment();
    }

    /// Set the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Update sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_increment();
    }

    /// Offset the phase by a fraction of a cycle (for multi-voice spread).
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase.rem_euclid(1.0);
    }

    /// Advance one sample and return the LFO value in [-1, 1].
    #[inline]
    pub fn next(&mut self) -> f64 {
        let value = match self.waveform {
            LfoWaveform::Sine => sin(core::f64::consts::TAU * self.phase),
            LfoWaveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            LfoWaveform::Saw => 2.0 * self.phase - 1.0,
            LfoWaveform::Square => {
                if self.phase < 0.5 { 1.0 } else { -1.0 }
            }
        };

        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }

    /// Reset the phase to zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn recalculate_increment(&mut self) {
        self.increment = self.rate_hz / self.sample_rate;
    }
}
