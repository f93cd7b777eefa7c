//! Mathematical utility functions for DSP.
//!
//! Allocation-free helpers suitable for `no_std`. All functions operate on
//! `f64` samples and use `libm` entry points so the crate builds without a
//! platform math library.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Hygiene
//!
//! - [`sanitize`] - Replace NaN/±Inf with zero (applied at node ingress)
//! - [`flush_denormal`] - Zero sub-1e-20 magnitudes in feedback paths
//!
//! # Waveshaping
//!
//! - [`soft_clip`] - exact tanh saturation
//! - [`tanh_pade`] - rational tanh approximation, clipped to [-1, 1]
//! - [`hard_clip`] - abrupt limiting at a threshold

use libm::{exp, log, tanh};

/// Convert decibels to linear gain.
///
/// 0 dB → 1.0, −6.02 dB → 0.5, +6.02 dB → 2.0.
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f64 = core::f64::consts::LN_10 / 20.0;
    exp(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// The input is floored at 1e-12 to keep the logarithm finite.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    const FACTOR: f64 = 20.0 / core::f64::consts::LN_10;
    log(linear.max(1e-12)) * FACTOR
}

/// Replace non-finite values with zero.
///
/// Applied at every node's ingress so NaN/±Inf never propagate through
/// filter state or published output.
#[inline]
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Flush denormal-range values to zero.
///
/// Feedback paths (one-poles, combs, ladder stages) decay into the denormal
/// range where arithmetic is orders of magnitude slower on some CPUs.
#[inline]
pub fn flush_denormal(x: f64) -> f64 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Linear interpolation between `a` and `b` by `t`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Soft clip using the exact hyperbolic tangent.
#[inline]
pub fn soft_clip(x: f64) -> f64 {
    tanh(x)
}

/// Rational tanh approximation, saturating to ±1 outside |x| > 3.
///
/// Padé-style: `x·(27 + x²) / (27 + 9·x²)`, clamped to [-1, 1]. Used by the
/// lightweight Moog ladder variants where four exact `tanh` calls per stage
/// per sub-step dominate the cost.
#[inline]
pub fn tanh_pade(x: f64) -> f64 {
    let x2 = x * x;
    (x * (27.0 + x2) / (27.0 + 9.0 * x2)).clamp(-1.0, 1.0)
}

/// Hard clip to the ±threshold range.
#[inline]
pub fn hard_clip(x: f64, threshold: f64) -> f64 {
    x.clamp(-threshold, threshold)
}
