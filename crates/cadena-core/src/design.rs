//! Filter coefficient design seam.
//!
//! The filter node does not design coefficients itself: it hands a
//! [`FilterSpec`] to an injected [`FilterDesigner`] and cascades whatever
//! biquad sections come back. The default [`RbjDesigner`] implements the RBJ
//! cookbook responses; alternative family designs (Bessel, Chebyshev,
//! elliptic pole placements) can be supplied by callers without touching the
//! node. Designers are read-only collaborators and may be shared across
//! chains.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use libm::cos;

use crate::biquad::{
    BiquadCoeffs, allpass_coefficients, bandpass_coefficients, highpass_coefficients,
    highshelf_coefficients, lowpass_coefficients, lowshelf_coefficients, notch_coefficients,
    peaking_coefficients,
};
use crate::error::{DspError, check_range};

/// Filter response shape. Closed enumeration; strings are normalized once at
/// configure time via [`FilterKind::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Lowpass response.
    #[default]
    Lowpass,
    /// Highpass response.
    Highpass,
    /// Bandpass response (constant peak gain).
    Bandpass,
    /// Notch (band-reject) response.
    Notch,
    /// Allpass response.
    Allpass,
    /// Peaking (bell) EQ response.
    Peak,
    /// Low shelf response.
    LowShelf,
    /// High shelf response.
    HighShelf,
}

impl FilterKind {
    /// Normalize a kind name, mapping the bell synonyms onto [`Peak`].
    ///
    /// Returns `None` for names outside the closed set.
    ///
    /// [`Peak`]: FilterKind::Peak
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lowpass" => Some(Self::Lowpass),
            "highpass" => Some(Self::Highpass),
            "bandpass" => Some(Self::Bandpass),
            "notch" => Some(Self::Notch),
            "allpass" => Some(Self::Allpass),
            "peak" | "bandeq" | "band-eq" | "bell" | "bandbell" => Some(Self::Peak),
            "lowshelf" => Some(Self::LowShelf),
            "highshelf" => Some(Self::HighShelf),
            _ => None,
        }
    }
}

/// Filter design family. Closed enumeration; unknown names default to
/// [`Rbj`](FilterFamily::Rbj).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterFamily {
    /// RBJ Audio EQ Cookbook designs.
    #[default]
    Rbj,
    /// Butterworth (maximally flat magnitude).
    Butterworth,
    /// Bessel (maximally flat group delay).
    Bessel,
    /// Chebyshev type I (passband ripple).
    Chebyshev1,
    /// Chebyshev type II (stopband ripple).
    Chebyshev2,
    /// Elliptic (both ripples).
    Elliptic,
    /// Moog ladder — routed to the ladder filter, not a biquad cascade.
    Moog,
}

impl FilterFamily {
    /// Normalize a family name. Unknown names fall back to RBJ.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "butterworth" => Self::Butterworth,
            "bessel" => Self::Bessel,
            "chebyshev1" => Self::Chebyshev1,
            "chebyshev2" => Self::Chebyshev2,
            "elliptic" => Self::Elliptic,
            "moog" => Self::Moog,
            _ => Self::Rbj,
        }
    }
}

/// A complete coefficient design request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Response shape.
    pub kind: FilterKind,
    /// Design family. The default designer realizes every family with RBJ
    /// sections; the field exists for external designers.
    pub family: FilterFamily,
    /// Characteristic frequency in Hz. Must be in (0, sample_rate / 2).
    pub frequency: f64,
    /// Gain in dB for peaking/shelf responses. Ignored elsewhere.
    pub gain_db: f64,
    /// Quality factor.
    pub q: f64,
    /// Filter order. Lowpass/highpass orders above 2 must be even and are
    /// realized as a Butterworth-Q cascade; for the other kinds the order
    /// counts cascaded identical sections.
    pub order: usize,
    /// Sample rate in Hz.
    pub sample_rate: f64,
}

impl FilterSpec {
    /// Spec with the given kind and frequency at order 2, unity gain,
    /// Q = 0.707.
    pub fn new(kind: FilterKind, frequency: f64, sample_rate: f64) -> Self {
        Self {
            kind,
            family: FilterFamily::Rbj,
            frequency,
            gain_db: 0.0,
            q: core::f64::consts::FRAC_1_SQRT_2,
            order: 2,
            sample_rate,
        }
    }
}

/// Coefficient design seam consumed by the filter node and the de-esser.
pub trait FilterDesigner: Send + Sync {
    /// Produce the biquad cascade realizing `spec`, in processing order.
    fn design(&self, spec: &FilterSpec) -> Result<Vec<BiquadCoeffs>, DspError>;
}

/// Default designer: RBJ cookbook sections.
///
/// Non-RBJ families are realized with RBJ sections as well — the family
/// field is honored by external designers with real pole-placement tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbjDesigner;

impl RbjDesigner {
    /// Validate the common part of a spec.
    fn validate(spec: &FilterSpec) -> Result<(), DspError> {
        if !(spec.sample_rate.is_finite() && spec.sample_rate > 0.0) {
            return Err(DspError::SampleRateInvalid(spec.sample_rate));
        }
        let nyquist = spec.sample_rate * 0.5;
        check_range("frequency", spec.frequency, 1.0, nyquist * 0.999)?;
        check_range("q", spec.q, 0.01, 100.0)?;
        check_range("order", spec.order as f64, 1.0, 24.0)?;
        Ok(())
    }
}

impl FilterDesigner for RbjDesigner {
    fn design(&self, spec: &FilterSpec) -> Result<Vec<BiquadCoeffs>, DspError> {
        Self::validate(spec)?;

        let f = spec.frequency;
        let sr = spec.sample_rate;

        match spec.kind {
            FilterKind::Lowpass | FilterKind::Highpass => {
                let order = spec.order.max(2);
                if order > 2 && order % 2 != 0 {
                    return Err(DspError::ParamOutOfRange {
                        name: "order",
                        value: order as f64,
                        min: 2.0,
                        max: 24.0,
                    });
                }
                let pairs = order / 2;
                let mut sections = Vec::with_capacity(pairs);
                for k in 0..pairs {
                    // Butterworth Q ladder; a single section honors the
                    // caller's Q instead.
                    let q = if pairs == 1 {
                        spec.q
                    } else {
                        let theta = (2.0 * k as f64 + 1.0) * core::f64::consts::PI
                            / (2.0 * order as f64);
                        1.0 / (2.0 * cos(theta))
                    };
                    sections.push(match spec.kind {
                        FilterKind::Lowpass => lowpass_coefficients(f, q, sr),
                        _ => highpass_coefficients(f, q, sr),
                    });
                }
                Ok(sections)
            }
            FilterKind::Bandpass => Ok(repeated(bandpass_coefficients(f, spec.q, sr), spec.order)),
            FilterKind::Notch => Ok(repeated(notch_coefficients(f, spec.q, sr), spec.order)),
            FilterKind::Allpass => Ok(repeated(allpass_coefficients(f, spec.q, sr), spec.order)),
            FilterKind::Peak => Ok(repeated(
                peaking_coefficients(f, spec.gain_db, spec.q, sr),
                spec.order,
            )),
            FilterKind::LowShelf => Ok(repeated(
                lowshelf_coefficients(f, spec.gain_db, spec.q, sr),
                spec.order,
            )),
            FilterKind::HighShelf => Ok(repeated(
                highshelf_coefficients(f, spec.gain_db, spec.q, sr),
                spec.order,
            )),
        }
    }
}

fn repeated(coeffs: BiquadCoeffs, count: usize) -> Vec<BiquadCoeffs> {
    let mut sections = Vec::with_capacity(count.max(1));
    for _ in 0..count.max(1) {
        sections.push(coeffs);
    }
    sections
}
