//! Nonlinear 4-stage Moog ladder lowpass filter.
//!
//! Five kernel families share one state layout (four stage values, cached
//! stage saturations, previous input/output):
//!
//! - *Classic* - explicit-Euler ladder, feedback from stage 4, exact `tanh`
//!   saturation per stage.
//! - *Lightweight* variants - the same ladder with the clipped rational
//!   `tanh` approximation ([`tanh_pade`](crate::math::tanh_pade)).
//! - *ImprovedClassic* - classic integration with the thermal-voltage
//!   scaled coefficient `2·Vt·(1 − e^(−2π·fc))`.
//! - *Huovilainen* - tuning and resonance polynomials compensating the
//!   explicit integration's frequency warp, with half-sample feedback
//!   smoothing.
//! - *Zdf* - zero-delay feedback discretization; the implicit loop
//!   `u = x − k·y₄` is solved per sample by Newton-Raphson with chained
//!   `sech²` derivatives.
//!
//! Oversampling runs the kernel at 2/4/8× the host rate on linearly
//! interpolated sub-inputs, with one identical anti-alias biquad on each
//! side of the kernel at ≈ 0.225 × the host rate. At 1× no anti-alias
//! filtering is applied.
//!
//! Stage values are clipped to ±32 after every update; a non-finite result
//! at the sample boundary is replaced by zero.
//!
//! References: Stilson & Smith, "Analyzing the Moog VCF with Considerations
//! for Digital Implementation", ICMC 1996; Huovilainen, "Non-linear Digital
//! Implementation of the Moog Ladder Filter", DAFx 2004; Zavalishin, "The
//! Art of VA Filter Design".

use libm::{exp, tan, tanh};

use crate::biquad::{Biquad, lowpass_coefficients};
use crate::error::{DspError, check_range};
use crate::math::{sanitize, tanh_pade};

/// Anti-alias cutoff as a fraction of the host sample rate.
const AA_CUTOFF_RATIO: f64 = 0.225;

/// Stage saturation bound.
const STAGE_LIMIT: f64 = 32.0;

/// Newton-Raphson termination threshold for the ZDF kernel.
const ZDF_EPSILON: f64 = 1e-15;

/// Ladder kernel selection. Closed enumeration, normalized once at
/// configure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoogVariant {
    /// Explicit ladder with exact `tanh`.
    #[default]
    Classic,
    /// Explicit ladder with the rational `tanh` approximation.
    ClassicLightweight,
    /// Thermal-voltage scaled coefficient, exact `tanh`.
    ImprovedClassic,
    /// Thermal-voltage scaled coefficient, rational `tanh`.
    ImprovedClassicLightweight,
    /// Huovilainen tuning/resonance polynomials with half-sample feedback.
    Huovilainen,
    /// Zero-delay feedback with Newton-Raphson loop solving.
    Zdf,
}

impl MoogVariant {
    /// Normalize a variant name. Unknown names fall back to classic.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "lightweight" | "classic-lightweight" => Self::ClassicLightweight,
            "improved" | "improved-classic" => Self::ImprovedClassic,
            "improved-lightweight" | "improved-classic-lightweight" => {
                Self::ImprovedClassicLightweight
            }
            "huovilainen" => Self::Huovilainen,
            "zdf" => Self::Zdf,
            _ => Self::Classic,
        }
    }

    fn uses_exact_tanh(self) -> bool {
        !matches!(
            self,
            Self::ClassicLightweight | Self::ImprovedClassicLightweight
        )
    }
}

/// Clip a stage value, zeroing non-finite intermediates.
#[inline]
fn clip_stage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-STAGE_LIMIT, STAGE_LIMIT)
    } else {
        0.0
    }
}

/// Nonlinear Moog ladder filter with selectable kernel and oversampling.
#[derive(Debug, Clone)]
pub struct MoogFilter {
    sample_rate: f64,

    // Parameters.
    cutoff_hz: f64,
    resonance: f64,
    drive: f64,
    input_gain: f64,
    output_gain: f64,
    thermal_voltage: f64,
    oversampling: usize,
    normalize_output: bool,
    variant: MoogVariant,
    newton_iterations: usize,

    // Derived.
    g: f64,
    feedback: f64,
    drive_scale: f64,
    output_scale: f64,
    zdf_g: f64,
    zdf_gk: f64,

    // State.
    stage: [f64; 4],
    tanh_stage: [f64; 3],
    prev_input: f64,
    prev_output: f64,

    // Anti-alias path (oversampling > 1 only).
    aa_pre: Biquad,
    aa_post: Biquad,
}

impl MoogFilter {
    /// Create a ladder filter with neutral defaults: 1 kHz cutoff, zero
    /// resonance, unity gains, classic kernel, no oversampling.
    pub fn new(sample_rate: f64) -> Result<Self, DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::SampleRateInvalid(sample_rate));
        }
        let mut filter = Self {
            sample_rate,
            cutoff_hz: 1000.0,
            resonance: 0.0,
            drive: 1.0,
            input_gain: 1.0,
            output_gain: 1.0,
            thermal_voltage: 1.0,
            oversampling: 1,
            normalize_output: false,
            variant: MoogVariant::Classic,
            newton_iterations: 4,
            g: 0.0,
            feedback: 0.0,
            drive_scale: 0.5,
            output_scale: 1.0,
            zdf_g: 0.0,
            zdf_gk: 0.0,
            stage: [0.0; 4],
            tanh_stage: [0.0; 3],
            prev_input: 0.0,
            prev_output: 0.0,
            aa_pre: Biquad::new(),
            aa_post: Biquad::new(),
        };
        filter.update_derived();
        Ok(filter)
    }

    /// Set the cutoff frequency in Hz, [1, sample_rate / 2).
    pub fn set_cutoff_hz(&mut self, cutoff_hz: f64) -> Result<(), DspError> {
        let nyquist = self.sample_rate * 0.5;
        self.cutoff_hz = check_range("cutoff_hz", cutoff_hz, 1.0, nyquist * 0.999)?;
        self.update_derived();
        Ok(())
    }

    /// Set the resonance, [0, 4]. Self-oscillation begins near 4.
    pub fn set_resonance(&mut self, resonance: f64) -> Result<(), DspError> {
        self.resonance = check_range("resonance", resonance, 0.0, 4.0)?;
        self.update_derived();
        Ok(())
    }

    /// Set the saturation drive, [0.1, 24].
    pub fn set_drive(&mut self, drive: f64) -> Result<(), DspError> {
        self.drive = check_range("drive", drive, 0.1, 24.0)?;
        self.update_derived();
        Ok(())
    }

    /// Set the linear input gain, [0, 24].
    pub fn set_input_gain(&mut self, gain: f64) -> Result<(), DspError> {
        self.input_gain = check_range("input_gain", gain, 0.0, 24.0)?;
        Ok(())
    }

    /// Set the linear output gain, [0, 24].
    pub fn set_output_gain(&mut self, gain: f64) -> Result<(), DspError> {
        self.output_gain = check_range("output_gain", gain, 0.0, 24.0)?;
        self.update_derived();
        Ok(())
    }

    /// Set the thermal voltage scale, [0.1, 10].
    pub fn set_thermal_voltage(&mut self, vt: f64) -> Result<(), DspError> {
        self.thermal_voltage = check_range("thermal_voltage", vt, 0.1, 10.0)?;
        self.update_derived();
        Ok(())
    }

    /// Set the oversampling factor; must be 1, 2, 4, or 8.
    pub fn set_oversampling(&mut self, factor: usize) -> Result<(), DspError> {
        if !matches!(factor, 1 | 2 | 4 | 8) {
            return Err(DspError::ParamOutOfRange {
                name: "oversampling",
                value: factor as f64,
                min: 1.0,
                max: 8.0,
            });
        }
        self.oversampling = factor;
        self.update_derived();
        Ok(())
    }

    /// Enable resonance-compensated output normalization.
    pub fn set_normalize_output(&mut self, normalize: bool) {
        self.normalize_output = normalize;
        self.update_derived();
    }

    /// Select the ladder kernel.
    pub fn set_variant(&mut self, variant: MoogVariant) {
        self.variant = variant;
        self.update_derived();
    }

    /// Newton-Raphson iteration budget for the ZDF kernel, [1, 8].
    pub fn set_newton_iterations(&mut self, iterations: usize) -> Result<(), DspError> {
        check_range("newton_iterations", iterations as f64, 1.0, 8.0)?;
        self.newton_iterations = iterations;
        Ok(())
    }

    /// Update the sample rate, preserving stage state.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::SampleRateInvalid(sample_rate));
        }
        self.sample_rate = sample_rate;
        let nyquist = sample_rate * 0.5;
        self.cutoff_hz = self.cutoff_hz.min(nyquist * 0.999);
        self.update_derived();
        Ok(())
    }

    /// Selected kernel variant.
    pub fn variant(&self) -> MoogVariant {
        self.variant
    }

    /// Oversampling factor.
    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    fn update_derived(&mut self) {
        let fs_os = self.sample_rate * self.oversampling as f64;
        let fc = self.cutoff_hz / fs_os;
        let vt = self.thermal_voltage;

        self.drive_scale = 0.5 * self.drive / vt;

        let base = 1.0 - exp(-core::f64::consts::TAU * fc);
        match self.variant {
            MoogVariant::Classic | MoogVariant::ClassicLightweight => {
                self.g = base;
                self.feedback = self.resonance;
            }
            MoogVariant::ImprovedClassic | MoogVariant::ImprovedClassicLightweight => {
                self.g = 2.0 * vt * base;
                self.feedback = self.resonance;
            }
            MoogVariant::Huovilainen => {
                let fcr = (1.8730 * fc * fc * fc + 0.4955 * fc * fc - 0.6490 * fc + 0.9988)
                    .max(0.0);
                self.g = 2.0 * vt * (1.0 - exp(-core::f64::consts::TAU * fc * fcr));
                self.feedback =
                    self.resonance * (-3.9364 * fc * fc + 1.8409 * fc + 0.9968).max(0.0);
            }
            MoogVariant::Zdf => {
                self.zdf_g = tan(core::f64::consts::PI * fc);
                self.zdf_gk = self.zdf_g / (1.0 + self.zdf_g);
                self.feedback = self.resonance;
            }
        }

        // 10^(res/10) is the square of the legacy 10^(res/20) makeup.
        let makeup = libm::pow(10.0, self.resonance / 10.0);
        let normalize = if self.normalize_output {
            1.0 / (1.0 + 0.5 * self.resonance)
        } else {
            1.0
        };
        self.output_scale = self.output_gain * makeup * normalize;

        if self.oversampling > 1 {
            let coeffs =
                lowpass_coefficients(AA_CUTOFF_RATIO * self.sample_rate, 0.7071, fs_os);
            self.aa_pre.set_coefficients(&coeffs);
            self.aa_post.set_coefficients(&coeffs);
        }
    }

    #[inline]
    fn saturate(&self, x: f64) -> f64 {
        if self.variant.uses_exact_tanh() {
            tanh(x)
        } else {
            tanh_pade(x)
        }
    }

    /// One kernel sub-step for the explicit (classic-family) ladders.
    #[inline]
    fn step_classic(&mut self, sub_input: f64) -> f64 {
        let feedback_tap = if self.variant == MoogVariant::Huovilainen {
            // Half-sample smoothing of the feedback path.
            0.5 * (self.stage[3] + self.prev_output)
        } else {
            self.stage[3]
        };
        let u = sub_input - self.feedback * feedback_tap;

        let ds = self.drive_scale;
        let g = self.g;

        let mut upstream = self.saturate(ds * u);
        for i in 0..4 {
            let own = if i < 3 {
                self.tanh_stage[i]
            } else {
                self.saturate(ds * self.stage[3])
            };
            self.stage[i] = clip_stage(self.stage[i] + g * (upstream - own));
            if i < 3 {
                self.tanh_stage[i] = self.saturate(ds * self.stage[i]);
                upstream = self.tanh_stage[i];
            }
        }

        self.prev_output = self.stage[3];
        self.stage[3]
    }

    /// One kernel sub-step for the ZDF ladder.
    ///
    /// Solves `u = input − k·y₄` for the stage-4 output by Newton-Raphson,
    /// then commits the state update `sᵢ ← sᵢ + 2·vᵢ` with the converged
    /// input.
    #[inline]
    fn step_zdf(&mut self, sub_input: f64) -> f64 {
        let shape = self.drive_scale;
        let gk = self.zdf_gk;
        let k = self.feedback;

        let mut y3 = self.prev_output;
        for _ in 0..self.newton_iterations {
            let u = sub_input - k * y3;
            let mut xi = u;
            let mut derivative = 1.0;
            for s in self.stage {
                let t_x = self.saturate(shape * xi);
                let t_s = self.saturate(shape * s);
                let v = (gk / shape) * (t_x - t_s);
                // d(y)/d(xi) = gk · sech²(shape·xi)
                derivative *= gk * (1.0 - t_x * t_x);
                xi = v + s;
            }
            let residual = xi - y3;
            let jacobian = -k * derivative - 1.0;
            if jacobian.abs() < ZDF_EPSILON {
                y3 = xi;
                break;
            }
            let next = y3 - residual / jacobian;
            let step = next - y3;
            y3 = next;
            if step.abs() < ZDF_EPSILON {
                break;
            }
        }

        // Commit: forward pass at the converged loop input.
        let exact = self.variant.uses_exact_tanh();
        let u = sub_input - k * y3;
        let mut xi = u;
        let mut output = 0.0;
        for s in self.stage.iter_mut() {
            let t_x = if exact { tanh(shape * xi) } else { tanh_pade(shape * xi) };
            let t_s = if exact { tanh(shape * *s) } else { tanh_pade(shape * *s) };
            let v = (gk / shape) * (t_x - t_s);
            let y = v + *s;
            *s = clip_stage(*s + 2.0 * v);
            xi = y;
            output = y;
        }

        self.prev_output = output;
        output
    }

    #[inline]
    fn kernel(&mut self, sub_input: f64) -> f64 {
        match self.variant {
            MoogVariant::Zdf => self.step_zdf(sub_input),
            _ => self.step_classic(sub_input),
        }
    }

    /// Process one sample at the host rate.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let input = sanitize(input) * self.input_gain;

        let output = if self.oversampling == 1 {
            self.kernel(input)
        } else {
            let factor = self.oversampling as f64;
            let mut last = 0.0;
            for i in 0..self.oversampling {
                let t = (i as f64 + 1.0) / factor;
                let sub = self.prev_input + t * (input - self.prev_input);
                let filtered = self.aa_pre.process(sub);
                let processed = self.kernel(filtered);
                last = self.aa_post.process(processed);
            }
            last
        };
        self.prev_input = input;

        let scaled = output * self.output_scale;
        if scaled.is_finite() { scaled } else { 0.0 }
    }

    /// Process a block in place.
    pub fn process_in_place(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear all continuous state.
    pub fn reset(&mut self) {
        self.stage = [0.0; 4];
        self.tanh_stage = [0.0; 3];
        self.prev_input = 0.0;
        self.prev_output = 0.0;
        self.aa_pre.clear();
        self.aa_post.clear();
    }
}
