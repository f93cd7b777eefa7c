//! Channel vocoder node.
//!
//! A bank of log-spaced bandpass filters analyzes the modulator (the port-1
//! sidechain mix), a per-band envelope follower extracts its spectral
//! contour, and a second identical bank filters the carrier (the main
//! input). Each carrier band is scaled by its modulator envelope and the
//! bands are summed, imprinting the modulator's spectrum on the carrier.
//!
//! Without a sidechain connection the block processor feeds the node its
//! own input, which degenerates to a band-limited envelope-follower chain.

use cadena_core::{
    Biquad, Context, DspError, EnvelopeFollower, NodeParams, Runtime, SidechainRuntime,
    bandpass_coefficients, sanitize,
};
use libm::{exp, log};

const MIN_BANDS: usize = 4;
const MAX_BANDS: usize = 24;
const LOW_EDGE_HZ: f64 = 100.0;
const HIGH_EDGE_HZ: f64 = 8000.0;

/// One vocoder band: carrier filter, modulator filter, envelope.
struct Band {
    carrier: Biquad,
    modulator: Biquad,
    envelope: EnvelopeFollower,
}

/// Channel vocoder node (`vocoder`). Sidechain-aware: port 1 carries the
/// modulator.
///
/// Parameters: `bands` default 16 clamp [4, 24]; `q` default 6 clamp
/// [1, 20]; `attackMs` default 5 clamp [0.1, 100]; `releaseMs` default 40
/// clamp [1, 500]; `gain` default 4 clamp [0.1, 24].
pub struct VocoderNode {
    bands: Vec<Band>,
    gain: f64,
    q: f64,
    attack_ms: f64,
    release_ms: f64,
    sample_rate: f64,
}

impl VocoderNode {
    /// Create a vocoder at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let mut node = Self {
            bands: Vec::new(),
            gain: 4.0,
            q: 6.0,
            attack_ms: 5.0,
            release_ms: 40.0,
            sample_rate: ctx.sample_rate(),
        };
        node.build_bank(16);
        node
    }

    /// Log-spaced center frequencies, rebuilt when the band count changes.
    fn build_bank(&mut self, count: usize) {
        let high = HIGH_EDGE_HZ.min(self.sample_rate * 0.45);
        let ratio = log(high / LOW_EDGE_HZ);
        self.bands = (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                let center = LOW_EDGE_HZ * exp(ratio * t);
                let coeffs = bandpass_coefficients(center, self.q, self.sample_rate);
                Band {
                    carrier: Biquad::with_coefficients(&coeffs),
                    modulator: Biquad::with_coefficients(&coeffs),
                    envelope: EnvelopeFollower::with_times(
                        self.sample_rate,
                        self.attack_ms,
                        self.release_ms,
                    ),
                }
            })
            .collect();
    }
}

impl Runtime for VocoderNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        let count = params.number_clamped("bands", 16.0, MIN_BANDS as f64, MAX_BANDS as f64) as usize;
        let q = params.number_clamped("q", 6.0, 1.0, 20.0);
        self.attack_ms = params.number_clamped("attackMs", 5.0, 0.1, 100.0);
        self.release_ms = params.number_clamped("releaseMs", 40.0, 1.0, 500.0);
        self.gain = params.number_clamped("gain", 4.0, 0.1, 24.0);

        let structure_changed = count != self.bands.len()
            || (q - self.q).abs() > f64::EPSILON
            || (sample_rate - self.sample_rate).abs() > f64::EPSILON;
        self.q = q;
        self.sample_rate = sample_rate;
        if structure_changed {
            self.build_bank(count);
        } else {
            for band in self.bands.iter_mut() {
                band.envelope.set_attack_ms(self.attack_ms);
                band.envelope.set_release_ms(self.release_ms);
            }
        }
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        // Self-keyed: the input is both carrier and modulator.
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let mut out = 0.0;
            for band in self.bands.iter_mut() {
                let carrier_band = band.carrier.process(input);
                let mod_band = band.modulator.process(input);
                let level = band.envelope.process(mod_band);
                out += carrier_band * level;
            }
            *sample = out * self.gain;
        }
    }

    fn reset(&mut self) {
        for band in self.bands.iter_mut() {
            band.carrier.clear();
            band.modulator.clear();
            band.envelope.reset();
        }
    }
}

impl SidechainRuntime for VocoderNode {
    fn process_with_sidechain(&mut self, main: &mut [f64], side: &[f64]) {
        for (sample, &key) in main.iter_mut().zip(side.iter()) {
            let carrier = sanitize(*sample);
            let modulator = sanitize(key);
            let mut out = 0.0;
            for band in self.bands.iter_mut() {
                let carrier_band = band.carrier.process(carrier);
                let mod_band = band.modulator.process(modulator);
                let level = band.envelope.process(mod_band);
                out += carrier_band * level;
            }
            *sample = out * self.gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> VocoderNode {
        let ctx = Context::new(48000.0).unwrap();
        let mut node = VocoderNode::new(&ctx);
        node.configure(&ctx, &NodeParams::new("v", "vocoder")).unwrap();
        node
    }

    #[test]
    fn silent_modulator_mutes_the_carrier() {
        let mut node = configured();
        // Carrier: saw-ish wideband tone. Modulator: silence.
        let mut main: Vec<f64> = (0..24000).map(|i| ((i % 97) as f64 / 48.5) - 1.0).collect();
        let side = vec![0.0; 24000];
        node.process_with_sidechain(&mut main, &side);
        let tail: f64 = main[12000..].iter().map(|x| x.abs()).fold(0.0, f64::max);
        assert!(tail < 0.01, "silent modulator should close all bands, peak {tail}");
    }

    #[test]
    fn modulator_energy_opens_the_bands() {
        let mut node = configured();
        let mut main: Vec<f64> = (0..48000).map(|i| ((i % 97) as f64 / 48.5) - 1.0).collect();
        let side: Vec<f64> = (0..48000)
            .map(|i| (std::f64::consts::TAU * 500.0 * i as f64 / 48000.0).sin())
            .collect();
        node.process_with_sidechain(&mut main, &side);
        let energy: f64 = main[24000..].iter().map(|x| x * x).sum();
        assert!(energy > 0.1, "modulated carrier should pass energy, got {energy}");
        assert!(main.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn band_count_is_configurable() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("v", "vocoder");
        params.set_number("bands", 8.0);
        let mut node = VocoderNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();
        assert_eq!(node.bands.len(), 8);
    }

    #[test]
    fn self_keyed_process_is_finite() {
        let mut node = configured();
        let mut block: Vec<f64> = (0..4800).map(|i| (i as f64 * 0.09).sin()).collect();
        node.process(&mut block);
        assert!(block.iter().all(|x| x.is_finite()));
    }
}
