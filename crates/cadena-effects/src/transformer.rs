//! Transformer emulation node.
//!
//! Core saturation with the low-frequency rolloff of an iron core: a tanh
//! stage for hysteresis-style compression, a one-pole highpass for the LF
//! corner, and a gentle top-end droop. The quality setting trades corner
//! frequencies and drive against transparency.

use cadena_core::{Context, DspError, NodeParams, OnePole, OnePoleHighpass, Runtime, sanitize};
use libm::tanh;

/// Transformer voicing. Closed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformerQuality {
    /// Balanced corners, moderate saturation.
    #[default]
    Standard,
    /// Narrow bandwidth, heavy saturation.
    Vintage,
    /// Wide bandwidth, light saturation.
    Transparent,
}

impl TransformerQuality {
    /// Normalize a quality name. Unknown names fall back to standard.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "vintage" => Self::Vintage,
            "transparent" => Self::Transparent,
            _ => Self::Standard,
        }
    }

    /// (low corner Hz, high corner Hz, drive multiplier).
    fn voicing(self) -> (f64, f64, f64) {
        match self {
            Self::Standard => (30.0, 18000.0, 1.0),
            Self::Vintage => (60.0, 12000.0, 2.0),
            Self::Transparent => (15.0, 20000.0, 0.5),
        }
    }
}

/// Transformer emulation node.
///
/// Parameters: `quality` string in {standard, vintage, transparent},
/// default standard; `driveDb` default 0 clamp [-12, 24]; `mix` default 1
/// clamp [0, 1].
pub struct TransformerNode {
    low_corner: OnePoleHighpass,
    high_corner: OnePole,
    drive: f64,
    mix: f64,
    sample_rate: f64,
}

impl TransformerNode {
    /// Create a transformer node.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            low_corner: OnePoleHighpass::new(sample_rate, 30.0),
            high_corner: OnePole::new(sample_rate, 18000.0_f64.min(sample_rate * 0.45)),
            drive: 1.0,
            mix: 1.0,
            sample_rate,
        }
    }
}

impl Runtime for TransformerNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.sample_rate = ctx.sample_rate();
        let quality = TransformerQuality::from_name(params.text("quality"));
        let (low, high, drive_mult) = quality.voicing();

        self.low_corner.set_sample_rate(self.sample_rate);
        self.high_corner.set_sample_rate(self.sample_rate);
        self.low_corner.set_frequency(low);
        self.high_corner.set_frequency(high.min(self.sample_rate * 0.45));

        let drive_db = params.number_clamped("driveDb", 0.0, -12.0, 24.0);
        self.drive = cadena_core::db_to_linear(drive_db) * drive_mult;
        self.mix = params.number_clamped("mix", 1.0, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let driven = tanh(input * self.drive) / self.drive.max(1e-9);
            let banded = self.high_corner.process(self.low_corner.process(driven));
            *sample = input * (1.0 - self.mix) + banded * self.mix;
        }
    }

    fn reset(&mut self) {
        self.low_corner.reset();
        self.high_corner.reset();
    }
}
