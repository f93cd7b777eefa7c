//! Audio environment handed to every runtime.

use crate::error::DspError;

/// The audio environment a node is constructed and configured against.
///
/// Carries the sample rate, validated once at construction. A chain hands
/// the same context to every runtime at construction and on each reload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Context {
    sample_rate: f64,
}

impl Context {
    /// Create a context with a validated sample rate.
    ///
    /// # Errors
    ///
    /// Returns [`DspError::SampleRateInvalid`] if the rate is non-positive
    /// or non-finite.
    pub fn new(sample_rate: f64) -> Result<Self, DspError> {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            Ok(Self { sample_rate })
        } else {
            Err(DspError::SampleRateInvalid(sample_rate))
        }
    }

    /// Sample rate in Hz. Always positive and finite.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Half the sample rate.
    #[inline]
    pub fn nyquist(&self) -> f64 {
        self.sample_rate * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_rates() {
        for rate in [8000.0, 44100.0, 48000.0, 96000.0, 192000.0] {
            let ctx = Context::new(rate).unwrap();
            assert_eq!(ctx.sample_rate(), rate);
            assert_eq!(ctx.nyquist(), rate / 2.0);
        }
    }

    #[test]
    fn rejects_invalid_rates() {
        assert!(Context::new(0.0).is_err());
        assert!(Context::new(-48000.0).is_err());
        assert!(Context::new(f64::NAN).is_err());
        assert!(Context::new(f64::INFINITY).is_err());
    }
}
