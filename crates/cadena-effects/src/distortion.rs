//! Distortion node with a closed family of waveshaping modes.
//!
//! Signal flow: `input → drive → waveshaper → output level → mix`. The mode
//! and approximation strings are normalized into closed enums once at
//! configure time; the per-sample path never touches a string.

use cadena_core::{
    Context, DspError, NodeParams, Runtime, db_to_linear, hard_clip, sanitize, tanh_pade,
};
use libm::{sqrt, tanh};

/// Waveshaping algorithm. Closed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistortionMode {
    /// Abrupt clipping at ±1.
    HardClip,
    /// Hyperbolic-tangent saturation.
    Tanh,
    /// Progressive saturation ladder; the index (1-8) sets the hardness.
    Waveshaper(u8),
    /// Cubic soft clip.
    #[default]
    SoftClip,
    /// `x / (1 + |x|)` saturation.
    Saturate,
    /// `x / sqrt(1 + x²)` saturation.
    Saturate2,
    /// Threshold-knee soft saturation.
    SoftSat,
    /// Fixed Chebyshev harmonic blend.
    Chebyshev,
}

impl DistortionMode {
    /// Normalize a mode name. `waveshaper1` … `waveshaper8` select the
    /// ladder; unknown names fall back to soft clip.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("waveshaper")
            && let Ok(n) = rest.parse::<u8>()
            && (1..=8).contains(&n)
        {
            return Self::Waveshaper(n);
        }
        match lower.as_str() {
            "hardclip" => Self::HardClip,
            "tanh" => Self::Tanh,
            "saturate" => Self::Saturate,
            "saturate2" => Self::Saturate2,
            "softsat" => Self::SoftSat,
            "chebyshev" => Self::Chebyshev,
            _ => Self::SoftClip,
        }
    }
}

/// Nonlinearity evaluation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistortionApprox {
    /// Rational approximations of the transcendental shapes.
    Polynomial,
    /// Exact library transcendentals.
    #[default]
    Exact,
}

impl DistortionApprox {
    /// Normalize an approximation name. Unknown names fall back to exact.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "polynomial" => Self::Polynomial,
            _ => Self::Exact,
        }
    }
}

/// Cubic soft clip: linear through the origin, flattening into ±1.
#[inline]
fn soft_clip_cubic(x: f64) -> f64 {
    if x <= -1.0 {
        -2.0 / 3.0
    } else if x >= 1.0 {
        2.0 / 3.0
    } else {
        x - x * x * x / 3.0
    }
}

/// Soft saturation with a knee at |x| = 0.5 (musicdsp soft-sat shape).
#[inline]
fn soft_sat(x: f64) -> f64 {
    const THRESHOLD: f64 = 0.5;
    let magnitude = x.abs();
    let shaped = if magnitude <= THRESHOLD {
        magnitude
    } else {
        let excess = magnitude - THRESHOLD;
        THRESHOLD + excess / (1.0 + (excess / (1.0 - THRESHOLD)) * (excess / (1.0 - THRESHOLD)))
    };
    shaped.min(1.0) * x.signum()
}

/// Distortion effect node.
///
/// Parameters: `mode` string (see [`DistortionMode`]), default `softclip`;
/// `approx` string in {polynomial, exact}, default `exact`; `driveDb`
/// default 12 clamp [0, 40]; `outputDb` default 0 clamp [-24, 24]; `mix`
/// default 1 clamp [0, 1].
pub struct DistortionNode {
    mode: DistortionMode,
    approx: DistortionApprox,
    drive: f64,
    output_gain: f64,
    mix: f64,
}

impl DistortionNode {
    /// Create a distortion node.
    pub fn new(_ctx: &Context) -> Self {
        Self {
            mode: DistortionMode::default(),
            approx: DistortionApprox::default(),
            drive: db_to_linear(12.0),
            output_gain: 1.0,
            mix: 1.0,
        }
    }

    #[inline]
    fn saturate_tanh(&self, x: f64) -> f64 {
        match self.approx {
            DistortionApprox::Exact => tanh(x),
            DistortionApprox::Polynomial => tanh_pade(x),
        }
    }

    #[inline]
    fn shape(&self, x: f64) -> f64 {
        match self.mode {
            DistortionMode::HardClip => hard_clip(x, 1.0),
            DistortionMode::Tanh => self.saturate_tanh(x),
            DistortionMode::Waveshaper(n) => {
                let hardness = f64::from(n);
                self.saturate_tanh(x * hardness) / self.saturate_tanh(hardness)
            }
            DistortionMode::SoftClip => soft_clip_cubic(x) * 1.5,
            DistortionMode::Saturate => x / (1.0 + x.abs()),
            DistortionMode::Saturate2 => x / sqrt(1.0 + x * x),
            DistortionMode::SoftSat => soft_sat(x),
            DistortionMode::Chebyshev => {
                // Fixed 2nd..4th harmonic blend over the clamped input:
                // T2 = 2x²−1, T3 = 4x³−3x, T4 = 8x⁴−8x²+1. The even terms
                // leave a -0.2 offset at silence; the constant restores it.
                let x = hard_clip(x, 1.0);
                let x2 = x * x;
                let t2 = 2.0 * x2 - 1.0;
                let t3 = (4.0 * x2 - 3.0) * x;
                let t4 = 8.0 * x2 * x2 - 8.0 * x2 + 1.0;
                let blended = x + 0.30 * t2 + 0.20 * t3 + 0.10 * t4 + 0.20;
                hard_clip(blended, 1.0)
            }
        }
    }
}

impl Runtime for DistortionNode {
    fn configure(&mut self, _ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.mode = DistortionMode::from_name(params.text("mode"));
        self.approx = DistortionApprox::from_name(params.text("approx"));
        self.drive = db_to_linear(params.number_clamped("driveDb", 12.0, 0.0, 40.0));
        self.output_gain = db_to_linear(params.number_clamped("outputDb", 0.0, -24.0, 24.0));
        self.mix = params.number_clamped("mix", 1.0, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let wet = self.shape(input * self.drive) * self.output_gain;
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(mode: &str) -> DistortionNode {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("d", "distortion");
        params.set_text("mode", mode);
        params.set_number("driveDb", 20.0);
        let mut node = DistortionNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();
        node
    }

    #[test]
    fn mode_names_normalize() {
        assert_eq!(DistortionMode::from_name("hardclip"), DistortionMode::HardClip);
        assert_eq!(DistortionMode::from_name("waveshaper3"), DistortionMode::Waveshaper(3));
        assert_eq!(DistortionMode::from_name("waveshaper9"), DistortionMode::SoftClip);
        assert_eq!(DistortionMode::from_name(""), DistortionMode::SoftClip);
        assert_eq!(DistortionApprox::from_name("polynomial"), DistortionApprox::Polynomial);
        assert_eq!(DistortionApprox::from_name("exact"), DistortionApprox::Exact);
    }

    #[test]
    fn all_modes_produce_finite_bounded_output() {
        let modes = [
            "hardclip", "tanh", "softclip", "saturate", "saturate2", "softsat", "chebyshev",
            "waveshaper1", "waveshaper4", "waveshaper8",
        ];
        for mode in modes {
            let mut node = configured(mode);
            let mut block: Vec<f64> = (0..2048).map(|i| (i as f64 * 0.13).sin() * 2.0).collect();
            node.process(&mut block);
            for &x in &block {
                assert!(x.is_finite(), "{mode}: non-finite output");
                assert!(x.abs() <= 20.0, "{mode}: runaway output {x}");
            }
        }
    }

    #[test]
    fn hard_clip_limits_at_one() {
        let mut node = configured("hardclip");
        let mut block = vec![10.0, -10.0];
        node.process(&mut block);
        assert_eq!(block, vec![1.0, -1.0]);
    }

    #[test]
    fn polynomial_approx_tracks_exact() {
        let ctx = Context::new(48000.0).unwrap();
        let mut exact_params = NodeParams::new("d", "distortion");
        exact_params.set_text("mode", "tanh");
        exact_params.set_number("driveDb", 6.0);
        let mut poly_params = exact_params.clone();
        poly_params.set_text("approx", "polynomial");

        let mut exact = DistortionNode::new(&ctx);
        exact.configure(&ctx, &exact_params).unwrap();
        let mut poly = DistortionNode::new(&ctx);
        poly.configure(&ctx, &poly_params).unwrap();

        let input: Vec<f64> = (0..512).map(|i| (i as f64 * 0.07).sin() * 0.5).collect();
        let mut a = input.clone();
        let mut b = input.clone();
        exact.process(&mut a);
        poly.process(&mut b);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 0.05, "approximation drifted: {x} vs {y}");
        }
    }
}
