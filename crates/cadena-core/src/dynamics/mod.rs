//! Shared dynamics core.
//!
//! One block of state and logic serves the compressor, expander, gate,
//! limiter, lookahead limiter, and de-esser: an attack/release detector
//! envelope, a log2-domain soft-knee gain computer, an optional one-pole
//! sidechain prefilter pair, and peak or windowed-RMS detection.
//!
//! # Signal Flow (feedforward)
//!
//! ```text
//! sidechain → prefilter (HP·LP) → |x| → [RMS window] → envelope → gain computer
//! input ──────────────────────────────────────────────────────────→ × gain × makeup
//! ```
//!
//! Under the feedback topology the detector observes the previous output
//! magnitude instead of the sidechain, and the optional ratio scaling
//! divides the attack/release times by the ratio to match the legacy
//! feedback response.
//!
//! All gain computation runs in the log2 domain: `thresholdLog2 =
//! thresholdDB · log2(10)/20`, overshoot in octaves, `gain =
//! 2^(−effective · factor)`. The soft knee is quadratic in log magnitude
//! over ±knee/2 around the threshold.

pub mod deesser;
pub mod lookahead;
pub mod multiband;
pub mod transient;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use libm::{ceil, exp, exp2, log2, pow, sqrt};

use crate::error::{DspError, check_range};
use crate::math::sanitize;
use crate::one_pole::{OnePole, OnePoleHighpass};

/// log2(10), for dB → log2-domain conversion.
const LOG2_10: f64 = 3.321928094887362;

/// Detector placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Detect from the sidechain (or input) signal.
    #[default]
    Feedforward,
    /// Detect from the previous output amplitude.
    Feedback,
}

/// Detector level estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorMode {
    /// Instantaneous `|x|`.
    #[default]
    Peak,
    /// Moving average of `x²` over a windowed ring buffer, square-rooted.
    Rms,
}

/// Gain computer orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynamicsMode {
    /// Downward compression: attenuate above the threshold (overshoot form).
    #[default]
    Compress,
    /// Downward expansion: attenuate below the threshold (undershoot form,
    /// clamped to the range floor). Gates add a hold counter on top.
    Expand,
}

/// Validated configuration for the dynamics core.
///
/// Construct with [`Default::default`] and adjust fields; ranges are checked
/// by [`DynamicsProcessor::new`] / [`DynamicsProcessor::set_config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsConfig {
    /// Gain computer orientation.
    pub mode: DynamicsMode,
    /// Detector placement.
    pub topology: Topology,
    /// Level estimation.
    pub detector: DetectorMode,
    /// Under feedback topology, scale attack/release times by the ratio to
    /// approximate the legacy feedback response.
    pub feedback_ratio_scale: bool,
    /// Threshold in dB.
    pub threshold_db: f64,
    /// Ratio in [1, 100].
    pub ratio: f64,
    /// Knee width in dB, [0, 24]. 0 is a hard knee.
    pub knee_db: f64,
    /// Attack time in ms, [0.1, 1000].
    pub attack_ms: f64,
    /// Release time in ms, [1, 5000].
    pub release_ms: f64,
    /// RMS window length in ms, [1, 1000].
    pub rms_window_ms: f64,
    /// Derive makeup gain from threshold and ratio.
    pub auto_makeup: bool,
    /// Manual makeup gain in dB, used when `auto_makeup` is false.
    pub makeup_gain_db: f64,
    /// Sidechain one-pole highpass cutoff in Hz. 0 disables.
    pub sidechain_low_cut_hz: f64,
    /// Sidechain one-pole lowpass cutoff in Hz. 0 disables.
    pub sidechain_high_cut_hz: f64,
    /// Expansion floor in dB, [-120, 0]. Only used in expand mode.
    pub range_db: f64,
    /// Gate hold time in ms. 0 disables the hold counter.
    pub hold_ms: f64,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            mode: DynamicsMode::Compress,
            topology: Topology::Feedforward,
            detector: DetectorMode::Peak,
            feedback_ratio_scale: false,
            threshold_db: -20.0,
            ratio: 4.0,
            knee_db: 6.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            rms_window_ms: 50.0,
            auto_makeup: false,
            makeup_gain_db: 0.0,
            sidechain_low_cut_hz: 0.0,
            sidechain_high_cut_hz: 0.0,
            range_db: -80.0,
            hold_ms: 0.0,
        }
    }
}

impl DynamicsConfig {
    /// Validate every field against its documented range.
    pub fn validate(&self, sample_rate: f64) -> Result<(), DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::SampleRateInvalid(sample_rate));
        }
        check_range("threshold_db", self.threshold_db, -144.0, 24.0)?;
        check_range("ratio", self.ratio, 1.0, 100.0)?;
        check_range("knee_db", self.knee_db, 0.0, 24.0)?;
        check_range("attack_ms", self.attack_ms, 0.1, 1000.0)?;
        check_range("release_ms", self.release_ms, 1.0, 5000.0)?;
        check_range("rms_window_ms", self.rms_window_ms, 1.0, 1000.0)?;
        check_range("makeup_gain_db", self.makeup_gain_db, -48.0, 48.0)?;
        check_range("range_db", self.range_db, -120.0, 0.0)?;
        check_range("hold_ms", self.hold_ms, 0.0, 10000.0)?;

        let nyquist = sample_rate * 0.5;
        let low = self.sidechain_low_cut_hz;
        let high = self.sidechain_high_cut_hz;
        if !(low.is_finite() && low >= 0.0 && low < nyquist) {
            return Err(DspError::ParamOutOfRange {
                name: "sidechain_low_cut_hz",
                value: low,
                min: 0.0,
                max: nyquist,
            });
        }
        if !(high.is_finite() && high >= 0.0 && high < nyquist) {
            return Err(DspError::ParamOutOfRange {
                name: "sidechain_high_cut_hz",
                value: high,
                min: 0.0,
                max: nyquist,
            });
        }
        if low > 0.0 && high > 0.0 && low >= high {
            return Err(DspError::ParamOutOfRange {
                name: "sidechain_low_cut_hz",
                value: low,
                min: 0.0,
                max: high,
            });
        }
        Ok(())
    }
}

/// The shared dynamics processor.
///
/// Per-sample state evolves identically through [`process_sample`],
/// [`process_in_place`], and [`process_with_sidechain`]; the block forms are
/// plain loops over the sample form.
///
/// [`process_sample`]: Self::process_sample
/// [`process_in_place`]: Self::process_in_place
/// [`process_with_sidechain`]: Self::process_with_sidechain
#[derive(Debug, Clone)]
pub struct DynamicsProcessor {
    config: DynamicsConfig,
    sample_rate: f64,

    // Derived coefficients.
    attack_coeff: f64,
    release_coeff: f64,
    threshold_log2: f64,
    knee_width_log2: f64,
    inv_knee_width_log2: f64,
    compression_factor: f64,
    makeup_gain_lin: f64,
    range_lin: f64,
    hold_samples: u64,

    // Detector state.
    envelope: f64,
    previous_abs_sample: f64,
    previous_gain: f64,
    hold_counter: u64,

    // RMS window.
    rms_buf: Vec<f64>,
    rms_pos: usize,
    rms_sum: f64,

    // Sidechain prefilter.
    low_cut: OnePoleHighpass,
    high_cut: OnePole,
}

impl DynamicsProcessor {
    /// Create a processor with a validated configuration.
    pub fn new(sample_rate: f64, config: DynamicsConfig) -> Result<Self, DspError> {
        config.validate(sample_rate)?;
        let mut processor = Self {
            config,
            sample_rate,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            threshold_log2: 0.0,
            knee_width_log2: 0.0,
            inv_knee_width_log2: 0.0,
            compression_factor: 0.0,
            makeup_gain_lin: 1.0,
            range_lin: 0.0,
            hold_samples: 0,
            envelope: 0.0,
            previous_abs_sample: 0.0,
            previous_gain: 1.0,
            hold_counter: 0,
            rms_buf: Vec::new(),
            rms_pos: 0,
            rms_sum: 0.0,
            low_cut: OnePoleHighpass::new(sample_rate, config.sidechain_low_cut_hz),
            high_cut: OnePole::new(sample_rate, config.sidechain_high_cut_hz),
        };
        processor.update_derived();
        Ok(processor)
    }

    /// Replace the configuration, preserving continuous detector state.
    pub fn set_config(&mut self, config: DynamicsConfig) -> Result<(), DspError> {
        config.validate(self.sample_rate)?;
        self.config = config;
        self.low_cut.set_frequency(config.sidechain_low_cut_hz);
        self.high_cut.set_frequency(config.sidechain_high_cut_hz);
        self.update_derived();
        Ok(())
    }

    /// Replace the sample rate, recomputing every derived coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), DspError> {
        self.config.validate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.low_cut.set_sample_rate(sample_rate);
        self.high_cut.set_sample_rate(sample_rate);
        self.update_derived();
        Ok(())
    }

    /// Current configuration.
    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    /// Current detector envelope level (linear).
    pub fn envelope(&self) -> f64 {
        self.envelope
    }

    /// The feedback detector's stored gain from the previous sample
    /// (floored at 1e-9). Stays 1 under the feedforward topology.
    pub fn last_gain(&self) -> f64 {
        self.previous_gain
    }

    /// Clear all continuous state.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.previous_abs_sample = 0.0;
        self.previous_gain = 1.0;
        self.hold_counter = 0;
        self.rms_buf.fill(0.0);
        self.rms_pos = 0;
        self.rms_sum = 0.0;
        self.low_cut.reset();
        self.high_cut.reset();
    }

    fn update_derived(&mut self) {
        let cfg = &self.config;

        // Feedback ratio scaling divides the times by the ratio.
        let time_scale = if cfg.topology == Topology::Feedback && cfg.feedback_ratio_scale {
            1.0 / cfg.ratio
        } else {
            1.0
        };

        let attack_s = cfg.attack_ms * 0.001 * time_scale;
        let release_s = cfg.release_ms * 0.001 * time_scale;
        self.attack_coeff = 1.0 - exp(-core::f64::consts::LN_2 / (attack_s * self.sample_rate));
        self.release_coeff = exp(-core::f64::consts::LN_2 / (release_s * self.sample_rate));

        self.threshold_log2 = cfg.threshold_db * LOG2_10 / 20.0;
        self.knee_width_log2 = cfg.knee_db * LOG2_10 / 20.0;
        self.inv_knee_width_log2 = if cfg.knee_db > 0.0 {
            1.0 / self.knee_width_log2
        } else {
            0.0
        };

        self.compression_factor = match cfg.mode {
            DynamicsMode::Compress => {
                if cfg.topology == Topology::Feedback && cfg.feedback_ratio_scale {
                    cfg.ratio - 1.0
                } else {
                    1.0 - 1.0 / cfg.ratio
                }
            }
            DynamicsMode::Expand => cfg.ratio - 1.0,
        };

        let makeup_db = if cfg.auto_makeup {
            -cfg.threshold_db * (1.0 - 1.0 / cfg.ratio)
        } else {
            cfg.makeup_gain_db
        };
        self.makeup_gain_lin = pow(10.0, makeup_db / 20.0);
        self.range_lin = pow(10.0, cfg.range_db / 20.0);
        self.hold_samples = (cfg.hold_ms * self.sample_rate / 1000.0) as u64;

        let window = ceil(cfg.rms_window_ms * self.sample_rate / 1000.0) as usize;
        let window = window.max(1);
        if self.rms_buf.len() != window {
            self.rms_buf = vec![0.0; window];
            self.rms_pos = 0;
            self.rms_sum = 0.0;
        }
    }

    /// Static gain curve for the current envelope level `level` (> 0).
    #[inline]
    fn computed_gain(&self, level: f64) -> f64 {
        let level_log2 = log2(level.max(1e-30));
        match self.config.mode {
            DynamicsMode::Compress => {
                let overshoot = level_log2 - self.threshold_log2;
                self.knee_gain(overshoot)
            }
            DynamicsMode::Expand => {
                let undershoot = self.threshold_log2 - level_log2;
                self.knee_gain(undershoot).max(self.range_lin)
            }
        }
    }

    /// Soft-knee transfer on the signed excess (overshoot or undershoot).
    #[inline]
    fn knee_gain(&self, excess: f64) -> f64 {
        if self.config.knee_db <= 0.0 {
            return exp2(-excess.max(0.0) * self.compression_factor);
        }
        let half_width = self.knee_width_log2 * 0.5;
        if excess < -half_width {
            1.0
        } else {
            let effective = if excess > half_width {
                excess
            } else {
                let edge = excess + half_width;
                edge * edge * 0.5 * self.inv_knee_width_log2
            };
            exp2(-effective * self.compression_factor)
        }
    }

    /// Push a prefiltered detector sample through the RMS window.
    #[inline]
    fn windowed_rms(&mut self, source: f64) -> f64 {
        let squared = source * source;
        self.rms_sum += squared - self.rms_buf[self.rms_pos];
        self.rms_buf[self.rms_pos] = squared;
        self.rms_pos = (self.rms_pos + 1) % self.rms_buf.len();
        // Running-sum drift can push the accumulator fractionally negative.
        sqrt(self.rms_sum.max(0.0) / self.rms_buf.len() as f64)
    }

    /// Process one sample with an explicit detector input.
    ///
    /// For self-keyed use pass the input as its own sidechain.
    #[inline]
    pub fn process_sample(&mut self, input: f64, sidechain: f64) -> f64 {
        let input = sanitize(input);
        let sidechain = sanitize(sidechain);

        // Detector source.
        let source = match self.config.topology {
            Topology::Feedforward => {
                let filtered = self.high_cut.process(self.low_cut.process(sidechain));
                filtered.abs()
            }
            Topology::Feedback => self.previous_abs_sample,
        };
        let source = match self.config.detector {
            DetectorMode::Peak => source,
            DetectorMode::Rms => self.windowed_rms(source),
        };

        // Envelope with independent attack and release.
        if source > self.envelope {
            self.envelope += (source - self.envelope) * self.attack_coeff;
        } else {
            self.envelope = source + (self.envelope - source) * self.release_coeff;
        }

        let mut gain = self.computed_gain(self.envelope);

        // Gate hold: reset the counter whenever the static curve is open,
        // and force unity gain while it runs down.
        if self.hold_samples > 0 {
            if gain >= 1.0 {
                self.hold_counter = self.hold_samples;
            } else if self.hold_counter > 0 {
                self.hold_counter -= 1;
                gain = 1.0;
            }
        }

        let output = input * gain * self.makeup_gain_lin;

        if self.config.topology == Topology::Feedback {
            self.previous_abs_sample = output.abs();
            self.previous_gain = gain.max(1e-9);
        }

        output
    }

    /// Process a block in place, self-keyed.
    pub fn process_in_place(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample, *sample);
        }
    }

    /// Process `main` in place, detecting from `side`.
    ///
    /// Both slices must have equal length; extra detector samples are
    /// ignored.
    pub fn process_with_sidechain(&mut self, main: &mut [f64], side: &[f64]) {
        for (sample, &key) in main.iter_mut().zip(side.iter()) {
            *sample = self.process_sample(*sample, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::db_to_linear;

    fn processor(config: DynamicsConfig) -> DynamicsProcessor {
        DynamicsProcessor::new(48000.0, config).unwrap()
    }

    #[test]
    fn unity_ratio_is_identity() {
        let config = DynamicsConfig {
            ratio: 1.0,
            knee_db: 0.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        for i in 0..2000 {
            let x = ((i as f64) * 0.013).sin() * 0.9;
            let y = proc.process_sample(x, x);
            assert!((y - x).abs() < 1e-12, "ratio 1 must be identity, {x} -> {y}");
        }
    }

    #[test]
    fn compresses_above_threshold() {
        let config = DynamicsConfig {
            threshold_db: -20.0,
            ratio: 4.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            release_ms: 50.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        // 0 dBFS input, threshold -20 dB, ratio 4: steady-state output is
        // -15 dB (20 dB overshoot compressed to 5 dB above threshold).
        let mut out = 0.0;
        for _ in 0..48000 {
            out = proc.process_sample(1.0, 1.0);
        }
        let expected = db_to_linear(-15.0);
        assert!(
            (out - expected).abs() < 1e-3,
            "expected {expected}, got {out}"
        );
    }

    #[test]
    fn below_threshold_is_untouched() {
        let config = DynamicsConfig {
            threshold_db: -20.0,
            ratio: 8.0,
            knee_db: 0.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        let quiet = db_to_linear(-40.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = proc.process_sample(quiet, quiet);
        }
        assert!((out - quiet).abs() < 1e-9);
    }

    #[test]
    fn soft_knee_engages_below_the_threshold() {
        let hard = DynamicsConfig {
            threshold_db: -20.0,
            ratio: 4.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            ..Default::default()
        };
        let soft = DynamicsConfig {
            knee_db: 12.0,
            ..hard
        };
        let mut hard = processor(hard);
        let mut soft = processor(soft);
        // Just below the threshold but inside the knee: the hard knee is
        // still transparent while the soft knee already reduces.
        let level = db_to_linear(-22.0);
        let mut hard_out = 0.0;
        let mut soft_out = 0.0;
        for _ in 0..48000 {
            hard_out = hard.process_sample(level, level);
            soft_out = soft.process_sample(level, level);
        }
        assert!((hard_out - level).abs() < 1e-9, "hard knee should be transparent");
        assert!(soft_out < level * 0.999, "soft knee should already reduce, got {soft_out}");
    }

    #[test]
    fn auto_makeup_restores_nominal_level() {
        let config = DynamicsConfig {
            threshold_db: -20.0,
            ratio: 4.0,
            knee_db: 0.0,
            auto_makeup: true,
            attack_ms: 0.1,
            ..Default::default()
        };
        let mut proc = processor(config);
        // Auto makeup is -threshold*(1-1/ratio) = 15 dB; a 0 dBFS steady
        // input lands at -15 dB + 15 dB = 0 dB.
        let mut out = 0.0;
        for _ in 0..48000 {
            out = proc.process_sample(1.0, 1.0);
        }
        assert!((out - 1.0).abs() < 1e-3, "auto makeup should restore unity, got {out}");
    }

    #[test]
    fn expander_attenuates_below_threshold() {
        let config = DynamicsConfig {
            mode: DynamicsMode::Expand,
            threshold_db: -20.0,
            ratio: 3.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            release_ms: 1.0,
            range_db: -60.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        let quiet = db_to_linear(-40.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = proc.process_sample(quiet, quiet);
        }
        assert!(out < quiet * 0.5, "expander should attenuate, got {out} vs input {quiet}");
        // The range floor bounds the attenuation.
        assert!(out >= quiet * db_to_linear(-60.0));
    }

    #[test]
    fn expander_range_floor_limits_attenuation() {
        let config = DynamicsConfig {
            mode: DynamicsMode::Expand,
            threshold_db: -10.0,
            ratio: 100.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            release_ms: 1.0,
            range_db: -12.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        let quiet = db_to_linear(-60.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = proc.process_sample(quiet, quiet);
        }
        let floor = quiet * db_to_linear(-12.0);
        assert!(
            (out - floor).abs() < floor * 0.01,
            "gain should sit at the -12 dB floor: got {out}, floor {floor}"
        );
    }

    #[test]
    fn gate_hold_keeps_gain_open() {
        let config = DynamicsConfig {
            mode: DynamicsMode::Expand,
            threshold_db: -20.0,
            ratio: 10.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            release_ms: 1.0,
            hold_ms: 10.0,
            range_db: -80.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        // Open the gate with a loud signal.
        for _ in 0..4800 {
            proc.process_sample(0.5, 0.5);
        }
        // During the hold window a quiet signal passes at unity.
        let quiet = db_to_linear(-50.0);
        let out = proc.process_sample(quiet, quiet);
        assert!(
            (out - quiet).abs() < 1e-12,
            "hold should force unity gain, got {out} for input {quiet}"
        );
    }

    #[test]
    fn feedback_topology_tracks_output() {
        let config = DynamicsConfig {
            topology: Topology::Feedback,
            threshold_db: -20.0,
            ratio: 4.0,
            knee_db: 0.0,
            attack_ms: 1.0,
            release_ms: 50.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = proc.process_sample(1.0, 1.0);
        }
        // Feedback compression is shallower than feedforward at the same
        // settings but must still attenuate and settle finitely.
        assert!(out < 1.0 && out > 0.0);
        assert!(out.is_finite());
    }

    #[test]
    fn rms_detector_is_finite_and_smooth() {
        let config = DynamicsConfig {
            detector: DetectorMode::Rms,
            rms_window_ms: 5.0,
            threshold_db: -20.0,
            ratio: 4.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        for i in 0..48000 {
            let x = ((i as f64) * 0.07).sin();
            let y = proc.process_sample(x, x);
            assert!(y.is_finite());
        }
    }

    #[test]
    fn sidechain_prefilter_ignores_rumble() {
        // Low-cut at 500 Hz: a 20 Hz detector signal barely moves the
        // envelope, so the compressor leaves the program alone.
        let config = DynamicsConfig {
            threshold_db: -30.0,
            ratio: 10.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            sidechain_low_cut_hz: 500.0,
            ..Default::default()
        };
        let mut proc = processor(config);
        let mut min_out: f64 = 1.0;
        for i in 0..48000 {
            let rumble = (core::f64::consts::TAU * 20.0 * i as f64 / 48000.0).sin();
            let out = proc.process_sample(0.1, rumble);
            min_out = min_out.min(out / 0.1);
        }
        assert!(min_out > 0.8, "rumble should be filtered out of the key, min gain {min_out}");
    }

    #[test]
    fn prefilter_cutoff_ordering_is_validated() {
        let config = DynamicsConfig {
            sidechain_low_cut_hz: 2000.0,
            sidechain_high_cut_hz: 500.0,
            ..Default::default()
        };
        assert!(DynamicsProcessor::new(48000.0, config).is_err());
    }

    #[test]
    fn config_validation_rejects_bad_ranges() {
        let mut config = DynamicsConfig {
            ratio: 0.5,
            ..Default::default()
        };
        assert!(DynamicsProcessor::new(48000.0, config).is_err());
        config.ratio = f64::NAN;
        assert!(DynamicsProcessor::new(48000.0, config).is_err());
        config.ratio = 4.0;
        config.attack_ms = 0.0;
        assert!(DynamicsProcessor::new(48000.0, config).is_err());
        config.attack_ms = 10.0;
        assert!(DynamicsProcessor::new(0.0, config).is_err());
    }

    #[test]
    fn block_and_sample_paths_evolve_identically() {
        let config = DynamicsConfig {
            detector: DetectorMode::Rms,
            rms_window_ms: 3.0,
            threshold_db: -18.0,
            ratio: 6.0,
            knee_db: 9.0,
            ..Default::default()
        };
        let mut by_block = processor(config);
        let mut by_sample = processor(config);

        let input: Vec<f64> = (0..1024).map(|i| ((i as f64) * 0.11).sin()).collect();
        let mut block = input.clone();
        by_block.process_in_place(&mut block);

        for (i, &x) in input.iter().enumerate() {
            let y = by_sample.process_sample(x, x);
            assert!(
                (y - block[i]).abs() < 1e-12,
                "paths diverged at sample {i}: {y} vs {}",
                block[i]
            );
        }
    }

    #[test]
    fn non_finite_input_is_treated_as_zero() {
        let mut proc = processor(DynamicsConfig::default());
        for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let y = proc.process_sample(x, x);
            assert_eq!(y, 0.0);
        }
    }
}
