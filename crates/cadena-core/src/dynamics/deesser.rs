//! De-esser: frequency-selective dynamics for sibilance control.
//!
//! Detection runs through a cascaded biquad chain (bandpass or highpass,
//! order 1-4) tuned to the sibilance band; the shared dynamics core turns
//! the detected level into a gain. In split-band mode the same cascade
//! extracts the band from the program, the band is recombined as
//! `input + band * (gain - 1)`, and the result is magnitude-limited to
//! `|input * gain|` so phase interactions cannot overshoot the wideband
//! gain. In wideband mode the whole input is multiplied by the gain.
//!
//! The cascades use the constant-skirt bandpass form (peak gain = Q per
//! section), so the extracted band is normalized by `1/Q^order` for an
//! approximately unity passband. That normalization is part of the
//! processor's characterized behavior; keep it when porting.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::biquad::{Biquad, BiquadCoeffs, bandpass_coefficients, highpass_coefficients};
use crate::dynamics::{DynamicsConfig, DynamicsProcessor};
use crate::error::{DspError, check_range};
use crate::math::sanitize;

/// How the de-esser applies its gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeEsserMode {
    /// Extract the sibilance band, attenuate it, recombine.
    #[default]
    SplitBand,
    /// Multiply the whole input by the detector gain.
    Wideband,
}

impl DeEsserMode {
    /// Normalize a mode name. Unknown names fall back to split-band.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "wideband" => Self::Wideband,
            _ => Self::SplitBand,
        }
    }
}

/// Detection filter shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeEsserDetector {
    /// Bandpass cascade centered on the sibilance band.
    #[default]
    Bandpass,
    /// Highpass cascade from the sibilance corner up.
    Highpass,
}

impl DeEsserDetector {
    /// Normalize a detector name. Unknown names fall back to bandpass.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "highpass" => Self::Highpass,
            _ => Self::Bandpass,
        }
    }
}

/// Constant-skirt bandpass section: peak gain = Q.
fn skirt_bandpass(frequency: f64, q: f64, sample_rate: f64) -> BiquadCoeffs {
    // The 0 dB-peak form scaled by Q in the numerator.
    let mut coeffs = bandpass_coefficients(frequency, q, sample_rate);
    coeffs.b0 *= q;
    coeffs.b2 *= q;
    coeffs
}

/// Sibilance de-esser built on the shared dynamics core.
#[derive(Debug, Clone)]
pub struct DeEsser {
    mode: DeEsserMode,
    listen: bool,
    dynamics: DynamicsProcessor,
    detection_chain: Vec<Biquad>,
    band_chain: Vec<Biquad>,
    /// `1/Q^order` passband normalization for the cascade.
    band_norm: f64,
}

impl DeEsser {
    /// Create a de-esser.
    ///
    /// # Errors
    ///
    /// - `frequency` outside (0, sample_rate / 2)
    /// - `q` outside [0.3, 20]
    /// - `order` outside [1, 4]
    /// - invalid dynamics configuration or sample rate
    pub fn new(
        sample_rate: f64,
        frequency: f64,
        q: f64,
        order: usize,
        detector: DeEsserDetector,
        mode: DeEsserMode,
        dynamics_config: DynamicsConfig,
    ) -> Result<Self, DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::SampleRateInvalid(sample_rate));
        }
        let nyquist = sample_rate * 0.5;
        check_range("frequency", frequency, 1.0, nyquist * 0.999)?;
        check_range("q", q, 0.3, 20.0)?;
        check_range("order", order as f64, 1.0, 4.0)?;

        let coeffs = match detector {
            DeEsserDetector::Bandpass => skirt_bandpass(frequency, q, sample_rate),
            DeEsserDetector::Highpass => highpass_coefficients(frequency, q, sample_rate),
        };
        let mut detection_chain = Vec::with_capacity(order);
        let mut band_chain = Vec::with_capacity(order);
        for _ in 0..order {
            detection_chain.push(Biquad::with_coefficients(&coeffs));
            band_chain.push(Biquad::with_coefficients(&coeffs));
        }
        let mut band_norm = 1.0;
        for _ in 0..order {
            band_norm /= q;
        }

        Ok(Self {
            mode,
            listen: false,
            dynamics: DynamicsProcessor::new(sample_rate, dynamics_config)?,
            detection_chain,
            band_chain,
            band_norm,
        })
    }

    /// Replace the output with the detection band (monitoring aid).
    pub fn set_listen(&mut self, listen: bool) {
        self.listen = listen;
    }

    /// Retune the gain path without touching the detection cascades.
    pub fn set_dynamics_config(&mut self, config: DynamicsConfig) -> Result<(), DspError> {
        self.dynamics.set_config(config)
    }

    /// Switch the recombination mode.
    pub fn set_mode(&mut self, mode: DeEsserMode) {
        self.mode = mode;
    }

    /// Process one sample.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let input = sanitize(input);

        let mut detected = input;
        for section in self.detection_chain.iter_mut() {
            detected = section.process(detected);
        }
        detected *= self.band_norm;

        // Unity probe yields the bare detector gain.
        let gain = self.dynamics.process_sample(1.0, detected);

        let mut band = input;
        for section in self.band_chain.iter_mut() {
            band = section.process(band);
        }
        band *= self.band_norm;

        if self.listen {
            return band;
        }

        match self.mode {
            DeEsserMode::Wideband => input * gain,
            DeEsserMode::SplitBand => {
                let out = input + band * (gain - 1.0);
                // Phase interactions between band and program can overshoot
                // the wideband gain; bound the magnitude.
                let limit = (input * gain).abs();
                if out.abs() > limit {
                    limit * out.signum()
                } else {
                    out
                }
            }
        }
    }

    /// Process a block in place.
    pub fn process_in_place(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear filter and detector state.
    pub fn reset(&mut self) {
        for section in self
            .detection_chain
            .iter_mut()
            .chain(self.band_chain.iter_mut())
        {
            section.clear();
        }
        self.dynamics.reset();
    }
}
