//! Dynamics effect nodes.
//!
//! Thin [`Runtime`] adapters over the shared dynamics core: each node reads
//! its parameter contract (defaults + clamps), assembles a
//! [`DynamicsConfig`], and hands blocks to the wrapped processor.
//! Reconfiguration goes through `set_config`, which preserves detector
//! state, so live parameter changes do not click.

use cadena_core::{
    Context, DeEsser, DeEsserDetector, DeEsserMode, DetectorMode, DspError, DynamicsConfig,
    DynamicsMode, DynamicsProcessor, LookaheadLimiter, MultibandCompressor, NodeParams, Runtime,
    SidechainRuntime, Topology, TransientShaper,
};

/// Read the detector-placement options shared by the compressor-family
/// nodes.
fn read_common_detector(params: &NodeParams, ctx: &Context, config: &mut DynamicsConfig) {
    config.topology = match params.text("topology").to_ascii_lowercase().as_str() {
        "feedback" => Topology::Feedback,
        _ => Topology::Feedforward,
    };
    config.feedback_ratio_scale = params.number("feedbackRatioScale", 0.0) != 0.0;
    config.detector = match params.text("detector").to_ascii_lowercase().as_str() {
        "rms" => DetectorMode::Rms,
        _ => DetectorMode::Peak,
    };
    config.rms_window_ms = params.number_clamped("rmsWindowMs", 50.0, 1.0, 1000.0);
    let max_cut = ctx.sample_rate() * 0.49;
    config.sidechain_low_cut_hz =
        params.number_clamped("sidechainLowCutHz", 0.0, 0.0, max_cut);
    config.sidechain_high_cut_hz =
        params.number_clamped("sidechainHighCutHz", 0.0, 0.0, max_cut);
    if config.sidechain_low_cut_hz > 0.0
        && config.sidechain_high_cut_hz > 0.0
        && config.sidechain_low_cut_hz >= config.sidechain_high_cut_hz
    {
        // Contradictory prefilter corners: drop the high cut.
        config.sidechain_high_cut_hz = 0.0;
    }
}

/// Downward compressor node (`dyn-compressor`).
///
/// Parameters: `thresholdDB` default -20 clamp [-60, 0]; `ratio` default 4
/// clamp [1, 100]; `kneeDB` default 6 clamp [0, 24]; `attackMs` default 10
/// clamp [0.1, 1000]; `releaseMs` default 100 clamp [1, 5000];
/// `makeupGainDB` default 0 clamp [0, 24]; auto-makeup disabled. Optional
/// detector options: `topology`, `detector`, `rmsWindowMs`,
/// `feedbackRatioScale`, `sidechainLowCutHz`, `sidechainHighCutHz`.
pub struct CompressorNode {
    processor: DynamicsProcessor,
    sample_rate: f64,
}

impl CompressorNode {
    /// Create a compressor node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        Ok(Self {
            processor: DynamicsProcessor::new(ctx.sample_rate(), DynamicsConfig::default())?,
            sample_rate: ctx.sample_rate(),
        })
    }
}

impl Runtime for CompressorNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        if (ctx.sample_rate() - self.sample_rate).abs() > f64::EPSILON {
            self.processor.set_sample_rate(ctx.sample_rate())?;
            self.sample_rate = ctx.sample_rate();
        }
        let mut config = DynamicsConfig {
            mode: DynamicsMode::Compress,
            threshold_db: params.number_clamped("thresholdDB", -20.0, -60.0, 0.0),
            ratio: params.number_clamped("ratio", 4.0, 1.0, 100.0),
            knee_db: params.number_clamped("kneeDB", 6.0, 0.0, 24.0),
            attack_ms: params.number_clamped("attackMs", 10.0, 0.1, 1000.0),
            release_ms: params.number_clamped("releaseMs", 100.0, 1.0, 5000.0),
            makeup_gain_db: params.number_clamped("makeupGainDB", 0.0, 0.0, 24.0),
            auto_makeup: false,
            ..Default::default()
        };
        read_common_detector(params, ctx, &mut config);
        self.processor.set_config(config)
    }

    fn process(&mut self, block: &mut [f64]) {
        self.processor.process_in_place(block);
    }

    fn reset(&mut self) {
        self.processor.reset();
    }
}

/// Brickwall-style limiter node (`dyn-limiter`): a compressor pinned to
/// ratio 100, 0.1 ms attack, hard knee, no makeup.
///
/// Parameters: `thresholdDB` default -6 clamp [-24, 0]; `releaseMs` default
/// 100 clamp [1, 5000].
pub struct LimiterNode {
    processor: DynamicsProcessor,
    sample_rate: f64,
}

impl LimiterNode {
    /// Create a limiter node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        let config = DynamicsConfig {
            threshold_db: -6.0,
            ratio: 100.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            ..Default::default()
        };
        Ok(Self {
            processor: DynamicsProcessor::new(ctx.sample_rate(), config)?,
            sample_rate: ctx.sample_rate(),
        })
    }
}

impl Runtime for LimiterNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        if (ctx.sample_rate() - self.sample_rate).abs() > f64::EPSILON {
            self.processor.set_sample_rate(ctx.sample_rate())?;
            self.sample_rate = ctx.sample_rate();
        }
        let config = DynamicsConfig {
            threshold_db: params.number_clamped("thresholdDB", -6.0, -24.0, 0.0),
            ratio: 100.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            release_ms: params.number_clamped("releaseMs", 100.0, 1.0, 5000.0),
            auto_makeup: false,
            makeup_gain_db: 0.0,
            ..Default::default()
        };
        self.processor.set_config(config)
    }

    fn process(&mut self, block: &mut [f64]) {
        self.processor.process_in_place(block);
    }

    fn reset(&mut self) {
        self.processor.reset();
    }
}

/// Lookahead limiter node (`dyn-lookahead`). Sidechain-aware: a port-1
/// connection drives the detector while the main path is delayed.
///
/// Parameters: `thresholdDB` default -6 clamp [-24, 0]; `lookaheadMs`
/// default 5 clamp [0, 100]; `releaseMs` default 100 clamp [1, 5000].
pub struct LookaheadLimiterNode {
    limiter: LookaheadLimiter,
    lookahead_ms: f64,
    sample_rate: f64,
}

impl LookaheadLimiterNode {
    /// Create a lookahead limiter node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        Ok(Self {
            limiter: LookaheadLimiter::new(ctx.sample_rate(), -6.0, 5.0, 100.0)?,
            lookahead_ms: 5.0,
            sample_rate: ctx.sample_rate(),
        })
    }
}

impl Runtime for LookaheadLimiterNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let threshold_db = params.number_clamped("thresholdDB", -6.0, -24.0, 0.0);
        let lookahead_ms = params.number_clamped("lookaheadMs", 5.0, 0.0, 100.0);
        let release_ms = params.number_clamped("releaseMs", 100.0, 1.0, 5000.0);

        let structural = (lookahead_ms - self.lookahead_ms).abs() > f64::EPSILON
            || (ctx.sample_rate() - self.sample_rate).abs() > f64::EPSILON;
        if structural {
            self.limiter =
                LookaheadLimiter::new(ctx.sample_rate(), threshold_db, lookahead_ms, release_ms)?;
            self.lookahead_ms = lookahead_ms;
            self.sample_rate = ctx.sample_rate();
        } else {
            self.limiter.set_levels(threshold_db, release_ms)?;
        }
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        self.limiter.process_in_place(block);
    }

    fn reset(&mut self) {
        self.limiter.reset();
    }

    fn latency_samples(&self) -> usize {
        self.limiter.latency_samples()
    }
}

impl SidechainRuntime for LookaheadLimiterNode {
    fn process_with_sidechain(&mut self, main: &mut [f64], side: &[f64]) {
        self.limiter.process_with_sidechain(main, side);
    }
}

/// Noise gate node (`dyn-gate`): downward expander with a hold counter.
///
/// Parameters: `thresholdDB` default -40 clamp [-80, 0]; `ratio` default 10
/// clamp [1, 100]; `attackMs` default 1 clamp [0.1, 1000]; `releaseMs`
/// default 100 clamp [1, 5000]; `holdMs` default 50 clamp [0, 500];
/// `rangeDB` default -80 clamp [-120, 0].
pub struct GateNode {
    processor: DynamicsProcessor,
    sample_rate: f64,
}

impl GateNode {
    /// Create a gate node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        let config = DynamicsConfig {
            mode: DynamicsMode::Expand,
            threshold_db: -40.0,
            ratio: 10.0,
            knee_db: 0.0,
            attack_ms: 1.0,
            hold_ms: 50.0,
            ..Default::default()
        };
        Ok(Self {
            processor: DynamicsProcessor::new(ctx.sample_rate(), config)?,
            sample_rate: ctx.sample_rate(),
        })
    }
}

impl Runtime for GateNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        if (ctx.sample_rate() - self.sample_rate).abs() > f64::EPSILON {
            self.processor.set_sample_rate(ctx.sample_rate())?;
            self.sample_rate = ctx.sample_rate();
        }
        let config = DynamicsConfig {
            mode: DynamicsMode::Expand,
            threshold_db: params.number_clamped("thresholdDB", -40.0, -80.0, 0.0),
            ratio: params.number_clamped("ratio", 10.0, 1.0, 100.0),
            knee_db: params.number_clamped("kneeDB", 0.0, 0.0, 24.0),
            attack_ms: params.number_clamped("attackMs", 1.0, 0.1, 1000.0),
            release_ms: params.number_clamped("releaseMs", 100.0, 1.0, 5000.0),
            hold_ms: params.number_clamped("holdMs", 50.0, 0.0, 500.0),
            range_db: params.number_clamped("rangeDB", -80.0, -120.0, 0.0),
            ..Default::default()
        };
        self.processor.set_config(config)
    }

    fn process(&mut self, block: &mut [f64]) {
        self.processor.process_in_place(block);
    }

    fn reset(&mut self) {
        self.processor.reset();
    }
}

/// Downward expander node (`dyn-expander`).
///
/// Parameters: `thresholdDB` default -40 clamp [-60, 0]; `ratio` default 2
/// clamp [1, 100]; `kneeDB` default 6 clamp [0, 24]; `attackMs` default 5
/// clamp [0.1, 1000]; `releaseMs` default 150 clamp [1, 5000]; `rangeDB`
/// default -40 clamp [-120, 0].
pub struct ExpanderNode {
    processor: DynamicsProcessor,
    sample_rate: f64,
}

impl ExpanderNode {
    /// Create an expander node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        let config = DynamicsConfig {
            mode: DynamicsMode::Expand,
            threshold_db: -40.0,
            ratio: 2.0,
            range_db: -40.0,
            ..Default::default()
        };
        Ok(Self {
            processor: DynamicsProcessor::new(ctx.sample_rate(), config)?,
            sample_rate: ctx.sample_rate(),
        })
    }
}

impl Runtime for ExpanderNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        if (ctx.sample_rate() - self.sample_rate).abs() > f64::EPSILON {
            self.processor.set_sample_rate(ctx.sample_rate())?;
            self.sample_rate = ctx.sample_rate();
        }
        let config = DynamicsConfig {
            mode: DynamicsMode::Expand,
            threshold_db: params.number_clamped("thresholdDB", -40.0, -60.0, 0.0),
            ratio: params.number_clamped("ratio", 2.0, 1.0, 100.0),
            knee_db: params.number_clamped("kneeDB", 6.0, 0.0, 24.0),
            attack_ms: params.number_clamped("attackMs", 5.0, 0.1, 1000.0),
            release_ms: params.number_clamped("releaseMs", 150.0, 1.0, 5000.0),
            range_db: params.number_clamped("rangeDB", -40.0, -120.0, 0.0),
            ..Default::default()
        };
        self.processor.set_config(config)
    }

    fn process(&mut self, block: &mut [f64]) {
        self.processor.process_in_place(block);
    }

    fn reset(&mut self) {
        self.processor.reset();
    }
}

/// De-esser node (`dyn-deesser`).
///
/// Parameters: `freqHz` default 6000 clamp [1000, 16000]; `q` default 2
/// clamp [0.3, 20]; `order` default 2 clamp [1, 4]; `mode` string in
/// {splitband, wideband}; `detector` string in {bandpass, highpass};
/// `thresholdDB` default -30 clamp [-60, 0]; `ratio` default 4 clamp
/// [1, 100]; `attackMs` default 0.5 clamp [0.1, 100]; `releaseMs` default
/// 50 clamp [1, 1000]; `listen` flag.
pub struct DeEsserNode {
    deesser: DeEsser,
    structure: (f64, f64, usize, DeEsserDetector, f64),
}

impl DeEsserNode {
    /// Create a de-esser node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        let config = Self::dynamics_defaults();
        Ok(Self {
            deesser: DeEsser::new(
                ctx.sample_rate(),
                6000.0,
                2.0,
                2,
                DeEsserDetector::Bandpass,
                DeEsserMode::SplitBand,
                config,
            )?,
            structure: (6000.0, 2.0, 2, DeEsserDetector::Bandpass, ctx.sample_rate()),
        })
    }

    fn dynamics_defaults() -> DynamicsConfig {
        DynamicsConfig {
            threshold_db: -30.0,
            ratio: 4.0,
            knee_db: 0.0,
            attack_ms: 0.5,
            release_ms: 50.0,
            ..Default::default()
        }
    }
}

impl Runtime for DeEsserNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let freq = params.number_clamped("freqHz", 6000.0, 1000.0, 16000.0);
        let freq = freq.min(ctx.sample_rate() * 0.49);
        let q = params.number_clamped("q", 2.0, 0.3, 20.0);
        let order = params.number_clamped("order", 2.0, 1.0, 4.0) as usize;
        let detector = DeEsserDetector::from_name(params.text("detector"));
        let mode = DeEsserMode::from_name(params.text("mode"));

        let config = DynamicsConfig {
            threshold_db: params.number_clamped("thresholdDB", -30.0, -60.0, 0.0),
            ratio: params.number_clamped("ratio", 4.0, 1.0, 100.0),
            attack_ms: params.number_clamped("attackMs", 0.5, 0.1, 100.0),
            release_ms: params.number_clamped("releaseMs", 50.0, 1.0, 1000.0),
            ..Self::dynamics_defaults()
        };

        let structure = (freq, q, order, detector, ctx.sample_rate());
        if structure != self.structure {
            self.deesser =
                DeEsser::new(ctx.sample_rate(), freq, q, order, detector, mode, config)?;
            self.structure = structure;
        } else {
            self.deesser.set_mode(mode);
            self.deesser.set_dynamics_config(config)?;
        }
        self.deesser.set_listen(params.number("listen", 0.0) != 0.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        self.deesser.process_in_place(block);
    }

    fn reset(&mut self) {
        self.deesser.reset();
    }
}

/// Transient shaper node (`dyn-transient`).
///
/// Parameters: `attackAmount` default 0.3 clamp [-1, 1]; `sustainAmount`
/// default 0 clamp [-1, 1]; `attackMs` default 1 clamp [0.1, 100];
/// `releaseMs` default 100 clamp [1, 1000].
pub struct TransientNode {
    shaper: TransientShaper,
}

impl TransientNode {
    /// Create a transient shaper node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        Ok(Self {
            shaper: TransientShaper::new(ctx.sample_rate())?,
        })
    }
}

impl Runtime for TransientNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.shaper.set_sample_rate(ctx.sample_rate())?;
        self.shaper
            .set_attack_amount(params.number_clamped("attackAmount", 0.3, -1.0, 1.0))?;
        self.shaper
            .set_sustain_amount(params.number_clamped("sustainAmount", 0.0, -1.0, 1.0))?;
        self.shaper
            .set_attack_ms(params.number_clamped("attackMs", 1.0, 0.1, 100.0))?;
        self.shaper
            .set_release_ms(params.number_clamped("releaseMs", 100.0, 1.0, 1000.0))?;
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        self.shaper.process_in_place(block);
    }

    fn reset(&mut self) {
        self.shaper.reset();
    }
}

/// Multiband compressor node (`dyn-multiband`).
///
/// Parameters: `bands` default 3 clamp [2, 8]; `crossover1` …
/// `crossover{bands-1}` crossover frequencies (log-spaced defaults between
/// 120 Hz and 8 kHz); `order` default 4, rounded to even, clamp [2, 8];
/// per-band overrides `b{i}ThresholdDB`, `b{i}Ratio`, `b{i}KneeDB`,
/// `b{i}AttackMs`, `b{i}ReleaseMs`, `b{i}MakeupGainDB` falling back to the
/// unprefixed compressor defaults.
pub struct MultibandNode {
    compressor: MultibandCompressor,
    structure: (usize, Vec<f64>, usize, f64),
}

impl MultibandNode {
    /// Create a multiband compressor node.
    pub fn new(ctx: &Context) -> Result<Self, DspError> {
        let freqs = Self::default_crossovers(3);
        let configs = vec![DynamicsConfig::default(); 3];
        Ok(Self {
            compressor: MultibandCompressor::new(ctx.sample_rate(), &freqs, 4, &configs)?,
            structure: (3, freqs, 4, ctx.sample_rate()),
        })
    }

    /// Log-spaced crossover defaults between 120 Hz and 8 kHz.
    fn default_crossovers(bands: usize) -> Vec<f64> {
        let splits = bands - 1;
        (1..=splits)
            .map(|i| {
                let t = i as f64 / bands as f64;
                120.0 * libm::pow(8000.0 / 120.0, t)
            })
            .collect()
    }

    fn band_config(params: &NodeParams, band: usize) -> DynamicsConfig {
        let read = |key: &str, default: f64, min: f64, max: f64| {
            let prefixed = format!("b{}{}", band + 1, key);
            let fallback = {
                // Unprefixed key with a lowercase first letter.
                let mut chars = key.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            };
            let value = params.number(&prefixed, params.number(&fallback, default));
            value.clamp(min, max)
        };
        DynamicsConfig {
            threshold_db: read("ThresholdDB", -20.0, -60.0, 0.0),
            ratio: read("Ratio", 4.0, 1.0, 100.0),
            knee_db: read("KneeDB", 6.0, 0.0, 24.0),
            attack_ms: read("AttackMs", 10.0, 0.1, 1000.0),
            release_ms: read("ReleaseMs", 100.0, 1.0, 5000.0),
            makeup_gain_db: read("MakeupGainDB", 0.0, 0.0, 24.0),
            ..Default::default()
        }
    }
}

impl Runtime for MultibandNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let bands = params.number_clamped("bands", 3.0, 2.0, 8.0) as usize;
        let order = {
            let raw = params.number_clamped("order", 4.0, 2.0, 8.0) as usize;
            (raw / 2) * 2
        };
        let defaults = Self::default_crossovers(bands);
        let nyquist = ctx.sample_rate() * 0.5;
        let freqs: Vec<f64> = defaults
            .iter()
            .enumerate()
            .map(|(i, &default)| {
                params.number_clamped(
                    &format!("crossover{}", i + 1),
                    default,
                    20.0,
                    nyquist * 0.95,
                )
            })
            .collect();

        let configs: Vec<DynamicsConfig> =
            (0..bands).map(|b| Self::band_config(params, b)).collect();

        let structure = (bands, freqs.clone(), order, ctx.sample_rate());
        if structure != self.structure {
            self.compressor =
                MultibandCompressor::new(ctx.sample_rate(), &freqs, order, &configs)?;
            self.structure = structure;
        } else {
            for (b, config) in configs.into_iter().enumerate() {
                self.compressor.set_band_config(b, config)?;
            }
        }
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        self.compressor.process_in_place(block);
    }

    fn reset(&mut self) {
        self.compressor.reset();
    }
}
