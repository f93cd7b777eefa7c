//! Tremolo node: LFO amplitude modulation with selectable waveform.

use cadena_core::{Context, DspError, Lfo, LfoWaveform, NodeParams, Runtime, sanitize};

/// Tremolo effect node.
///
/// Parameters: `rateHz` default 5 clamp [0.1, 20]; `depth` default 0.5
/// clamp [0, 1]; `waveform` string in {sine, triangle, saw, square},
/// default sine.
pub struct TremoloNode {
    lfo: Lfo,
    depth: f64,
}

impl TremoloNode {
    /// Create a tremolo at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        Self {
            lfo: Lfo::new(ctx.sample_rate(), 5.0),
            depth: 0.5,
        }
    }
}

impl Runtime for TremoloNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.lfo.set_sample_rate(ctx.sample_rate());
        self.lfo.set_rate(params.number_clamped("rateHz", 5.0, 0.1, 20.0));
        self.lfo.set_waveform(LfoWaveform::from_name(params.text("waveform")));
        self.depth = params.number_clamped("depth", 0.5, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            // Map the bipolar LFO to a unipolar gain dipping by `depth`.
            let gain = 1.0 - self.depth * 0.5 * (1.0 - self.lfo.next());
            *sample = input * gain;
        }
    }

    fn reset(&mut self) {
        self.lfo.reset();
    }
}
