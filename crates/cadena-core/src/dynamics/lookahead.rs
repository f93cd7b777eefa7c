//! Lookahead brickwall limiter.
//!
//! The detector runs on the current sample (or the sidechain key) while the
//! program signal is read through a circular delay, so gain reduction lands
//! before the transient it reacts to. The gain path is the shared dynamics
//! core configured as a limiter: ratio 100, 0.1 ms attack, hard knee, no
//! makeup.

use libm::round;

use crate::delay_line::DelayLine;
use crate::dynamics::{DynamicsConfig, DynamicsProcessor};
use crate::error::{DspError, check_range};
use crate::math::sanitize;

/// Limiter with a lookahead delay on the program path.
#[derive(Debug, Clone)]
pub struct LookaheadLimiter {
    detector: DynamicsProcessor,
    delay: DelayLine,
    delay_samples: usize,
}

impl LookaheadLimiter {
    /// Create a lookahead limiter.
    ///
    /// # Errors
    ///
    /// - `threshold_db` outside [-24, 0] (the limiter's own threshold range)
    /// - `lookahead_ms` outside [0, 100]
    /// - `release_ms` outside [1, 5000]
    /// - invalid sample rate
    pub fn new(
        sample_rate: f64,
        threshold_db: f64,
        lookahead_ms: f64,
        release_ms: f64,
    ) -> Result<Self, DspError> {
        check_range("threshold_db", threshold_db, -24.0, 0.0)?;
        check_range("lookahead_ms", lookahead_ms, 0.0, 100.0)?;
        check_range("release_ms", release_ms, 1.0, 5000.0)?;

        let config = DynamicsConfig {
            threshold_db,
            ratio: 100.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            release_ms,
            auto_makeup: false,
            makeup_gain_db: 0.0,
            ..Default::default()
        };
        let detector = DynamicsProcessor::new(sample_rate, config)?;

        let delay_samples = round(lookahead_ms * sample_rate / 1000.0) as usize;
        let delay = DelayLine::new(delay_samples + 1);

        Ok(Self {
            detector,
            delay,
            delay_samples,
        })
    }

    /// Reconfigure threshold and release, preserving the delay contents.
    pub fn set_levels(&mut self, threshold_db: f64, release_ms: f64) -> Result<(), DspError> {
        check_range("threshold_db", threshold_db, -24.0, 0.0)?;
        check_range("release_ms", release_ms, 1.0, 5000.0)?;
        let config = DynamicsConfig {
            threshold_db,
            release_ms,
            ..*self.detector.config()
        };
        self.detector.set_config(config)
    }

    /// Lookahead latency in samples.
    pub fn latency_samples(&self) -> usize {
        self.delay_samples
    }

    /// Process one sample, detecting from `key` (pass the input for
    /// self-keyed limiting).
    #[inline]
    pub fn process_sample(&mut self, input: f64, key: f64) -> f64 {
        let input = sanitize(input);
        // Unity probe through the core yields the bare detector gain.
        let gain = self.detector.process_sample(1.0, key);
        self.delay.write(input);
        let delayed = self.delay.read_integer(self.delay_samples);
        delayed * gain
    }

    /// Process a block in place, self-keyed.
    pub fn process_in_place(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample, *sample);
        }
    }

    /// Process `main` in place, detecting from `side`.
    pub fn process_with_sidechain(&mut self, main: &mut [f64], side: &[f64]) {
        for (sample, &key) in main.iter_mut().zip(side.iter()) {
            *sample = self.process_sample(*sample, key);
        }
    }

    /// Clear detector state and the lookahead delay.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.delay.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::db_to_linear;

    #[test]
    fn latency_matches_lookahead_time() {
        let limiter = LookaheadLimiter::new(48000.0, -6.0, 5.0, 100.0).unwrap();
        assert_eq!(limiter.latency_samples(), 240);
    }

    #[test]
    fn program_is_delayed() {
        let mut limiter = LookaheadLimiter::new(48000.0, 0.0, 1.0, 100.0).unwrap();
        // Quiet impulse below threshold: gain stays ~1, output is the
        // impulse delayed by the lookahead.
        let mut outputs = Vec::new();
        for i in 0..96 {
            let x = if i == 0 { 0.1 } else { 0.0 };
            outputs.push(limiter.process_sample(x, x));
        }
        let latency = limiter.latency_samples();
        assert!(outputs[latency].abs() > 0.05, "impulse should appear after {latency} samples");
        for (i, out) in outputs.iter().enumerate().take(latency) {
            assert!(out.abs() < 1e-6, "sample {i} should be silent, got {out}");
        }
    }

    #[test]
    fn sustained_overshoot_is_held_at_threshold() {
        let mut limiter = LookaheadLimiter::new(48000.0, -12.0, 2.0, 50.0).unwrap();
        let mut out = 0.0;
        for _ in 0..96000 {
            out = limiter.process_sample(1.0, 1.0);
        }
        // Ratio 100 leaves 1/100 of the overshoot: effectively the
        // threshold.
        let threshold = db_to_linear(-12.0);
        assert!(
            (out - threshold).abs() < threshold * 0.05,
            "expected ~{threshold}, got {out}"
        );
    }

    #[test]
    fn zero_lookahead_is_supported() {
        let mut limiter = LookaheadLimiter::new(48000.0, -6.0, 0.0, 100.0).unwrap();
        assert_eq!(limiter.latency_samples(), 0);
        let out = limiter.process_sample(0.1, 0.1);
        assert!((out - 0.1).abs() < 1e-6, "zero lookahead passes the current sample");
    }

    #[test]
    fn threshold_range_is_validated() {
        assert!(LookaheadLimiter::new(48000.0, -30.0, 5.0, 100.0).is_err());
        assert!(LookaheadLimiter::new(48000.0, 1.0, 5.0, 100.0).is_err());
    }
}
