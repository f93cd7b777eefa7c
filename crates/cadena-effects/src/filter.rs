//! Designer-driven filter nodes.
//!
//! [`FilterNode`] covers the whole `filter*` family: the node type fixes the
//! default response kind, `kind`/`family` string parameters override it, and
//! the injected [`FilterDesigner`] turns the resolved spec into a biquad
//! cascade. A `family=moog` request routes processing through the embedded
//! ladder filter instead of the cascade.
//!
//! [`MoogFilterNode`] is the dedicated `filter-moog` node: family and kind
//! are forced (moog/lowpass) and the order parameter selects the
//! oversampling ladder.

use std::sync::Arc;

use cadena_core::{
    Biquad, Context, DspError, FilterDesigner, FilterFamily, FilterKind, FilterSpec, MoogFilter,
    MoogVariant, NodeParams, Runtime, sanitize,
};

/// Resolve the default response kind from a node type tag.
fn kind_for_node_type(effect_type: &str) -> FilterKind {
    match effect_type {
        "filter-highpass" => FilterKind::Highpass,
        "filter-bandpass" => FilterKind::Bandpass,
        "filter-notch" => FilterKind::Notch,
        "filter-allpass" => FilterKind::Allpass,
        "filter-peak" => FilterKind::Peak,
        "filter-lowshelf" => FilterKind::LowShelf,
        "filter-highshelf" => FilterKind::HighShelf,
        _ => FilterKind::Lowpass,
    }
}

/// Biquad-cascade filter node for the `filter*` types.
///
/// Parameters: `freq` default 1200 clamp [20, 0.49·sample_rate]; `gain`
/// default 0 clamp [-24, 24]; `q` default 0.707 clamp [0.2, 8]; `order`
/// default 2 clamp [1, 8]; `kind` and `family` string overrides (see
/// [`FilterKind::from_name`] / [`FilterFamily::from_name`]).
pub struct FilterNode {
    designer: Arc<dyn FilterDesigner>,
    cascade: Vec<Biquad>,
    moog: MoogFilter,
    use_moog: bool,
    current_spec: Option<FilterSpec>,
}

impl FilterNode {
    /// Create a filter node using the given coefficient designer.
    pub fn new(ctx: &Context, designer: Arc<dyn FilterDesigner>) -> Result<Self, DspError> {
        Ok(Self {
            designer,
            cascade: Vec::new(),
            moog: MoogFilter::new(ctx.sample_rate())?,
            use_moog: false,
            current_spec: None,
        })
    }
}

impl Runtime for FilterNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        let freq = params.number_clamped("freq", 1200.0, 20.0, 0.49 * sample_rate);
        let gain_db = params.number_clamped("gain", 0.0, -24.0, 24.0);
        let q = params.number_clamped("q", 0.707, 0.2, 8.0);
        let order = params.number_clamped("order", 2.0, 1.0, 8.0) as usize;

        let family = FilterFamily::from_name(params.text("family"));
        let kind = FilterKind::from_name(params.text("kind"))
            .unwrap_or_else(|| kind_for_node_type(&params.effect_type));

        if family == FilterFamily::Moog {
            // Ladder path: kind is forced to lowpass by the topology.
            self.use_moog = true;
            self.moog.set_sample_rate(sample_rate)?;
            self.moog.set_cutoff_hz(freq)?;
            // Map the biquad Q range onto ladder resonance.
            self.moog.set_resonance(((q - 0.707) / 2.0).clamp(0.0, 4.0))?;
            self.current_spec = None;
            return Ok(());
        }
        self.use_moog = false;

        let spec = FilterSpec {
            kind,
            family,
            frequency: freq,
            gain_db,
            q,
            order,
            sample_rate,
        };
        if self.current_spec == Some(spec) {
            return Ok(());
        }

        let sections = self.designer.design(&spec)?;
        if sections.len() == self.cascade.len() {
            // Same topology: swap coefficients, keep filter state.
            for (biquad, coeffs) in self.cascade.iter_mut().zip(&sections) {
                biquad.set_coefficients(coeffs);
            }
        } else {
            self.cascade = sections.iter().map(Biquad::with_coefficients).collect();
        }
        self.current_spec = Some(spec);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        if self.use_moog {
            self.moog.process_in_place(block);
            return;
        }
        for sample in block.iter_mut() {
            let mut x = sanitize(*sample);
            for section in self.cascade.iter_mut() {
                x = section.process(x);
            }
            *sample = x;
        }
    }

    fn reset(&mut self) {
        for section in self.cascade.iter_mut() {
            section.clear();
        }
        self.moog.reset();
    }
}

/// Ladder filter node (`filter-moog`): family and kind are forced.
///
/// Parameters: `freq` default 1200 clamp [20, 0.49·sample_rate];
/// `resonance` default 0.5 clamp [0, 4]; `drive` default 1 clamp [0.1, 24];
/// `inputGain` default 1 clamp [0, 24]; `outputGain` default 1 clamp
/// [0, 24]; `thermalVoltage` default 1 clamp [0.1, 10]; `order` default 4
/// clamp [1, 16] (selects 1/2/4/8× oversampling for <4/<8/<12/≥12);
/// `variant` string (see [`MoogVariant::from_name`]); `normalizeOutput`
/// flag; `newtonIterations` default 4 clamp [1, 8].
pub struct MoogFilterNode {
    filter: MoogFilter,
}

impl MoogFilterNode {
    /// Create a ladder filter node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        Ok(Self {
            filter: MoogFilter::new(ctx.sample_rate())?,
        })
    }
}

impl Runtime for MoogFilterNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        self.filter.set_sample_rate(sample_rate)?;
        self.filter.set_variant(MoogVariant::from_name(params.text("variant")));

        let order = params.number_clamped("order", 4.0, 1.0, 16.0) as usize;
        let oversampling = if order < 4 {
            1
        } else if order < 8 {
            2
        } else if order < 12 {
            4
        } else {
            8
        };
        self.filter.set_oversampling(oversampling)?;

        self.filter
            .set_cutoff_hz(params.number_clamped("freq", 1200.0, 20.0, 0.49 * sample_rate))?;
        self.filter
            .set_resonance(params.number_clamped("resonance", 0.5, 0.0, 4.0))?;
        self.filter
            .set_drive(params.number_clamped("drive", 1.0, 0.1, 24.0))?;
        self.filter
            .set_input_gain(params.number_clamped("inputGain", 1.0, 0.0, 24.0))?;
        self.filter
            .set_output_gain(params.number_clamped("outputGain", 1.0, 0.0, 24.0))?;
        self.filter
            .set_thermal_voltage(params.number_clamped("thermalVoltage", 1.0, 0.1, 10.0))?;
        self.filter
            .set_normalize_output(params.number("normalizeOutput", 0.0) != 0.0);
        self.filter
            .set_newton_iterations(params.number_clamped("newtonIterations", 4.0, 1.0, 8.0) as usize)?;
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        self.filter.process_in_place(block);
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}
