//! Effect registry and factories for the cadena effect-chain engine.
//!
//! The registry maps effect-type tags (the `type` field of a graph node) to
//! factories that produce [`NodeRuntime`] instances. The chain looks up a
//! factory per non-structural node at load time; unknown types are
//! tolerated there (the node becomes a passthrough), so registration
//! completeness is a policy decision, not a correctness requirement.
//!
//! [`default_registry`] wires every builtin node type. Factories that need
//! collaborators (the filter designer, the impulse-response provider)
//! capture them at registry construction; [`default_registry_with`] injects
//! replacements.
//!
//! # Example
//!
//! ```rust
//! use cadena_registry::default_registry;
//! use cadena_core::Context;
//!
//! let registry = default_registry();
//! let ctx = Context::new(48000.0).unwrap();
//!
//! let factory = registry.lookup("dyn-compressor").unwrap();
//! let runtime = factory(&ctx).unwrap();
//! assert!(!runtime.is_sidechain());
//!
//! let factory = registry.lookup("vocoder").unwrap();
//! assert!(factory(&ctx).unwrap().is_sidechain());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use cadena_core::{
    Context, DspError, FilterDesigner, ImpulseResponseProvider, NodeRuntime, RbjDesigner,
    SyntheticRoomIr,
};
use cadena_effects::{
    BassNode, BitcrusherNode, ChebyshevNode, ChorusNode, CompressorNode, ConvolutionNode,
    DeEsserNode, DelayNode, DistortionNode, ExpanderNode, FdnReverbNode, FilterNode, FlangerNode,
    FreeverbNode, GateNode, GranularNode, LimiterNode, LookaheadLimiterNode, MoogFilterNode,
    MultibandNode, PhaserNode, PitchSpectralNode, PitchTimeNode, RingModNode, SimpleDelayNode,
    SpectralFreezeNode, TransformerNode, TransientNode, TremoloNode, VocoderNode, WidenerNode,
};

/// Factory producing a runtime for one node.
pub type RuntimeFactory = Box<dyn Fn(&Context) -> Result<NodeRuntime, DspError> + Send + Sync>;

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two registrations for the same type name.
    DuplicateEffect(String),
    /// The type name was empty.
    EmptyEffectType,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEffect(name) => write!(f, "effect type '{name}' already registered"),
            Self::EmptyEffectType => write!(f, "effect type name is empty"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Maps effect-type names to runtime factories.
///
/// A factory is a non-null callable by construction; the "nil factory"
/// failure mode of a registration API does not exist here.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<String, RuntimeFactory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for an effect type.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyEffectType`] for an empty name,
    /// [`RegistryError::DuplicateEffect`] when the name is taken.
    pub fn register(
        &mut self,
        effect_type: &str,
        factory: RuntimeFactory,
    ) -> Result<(), RegistryError> {
        if effect_type.is_empty() {
            return Err(RegistryError::EmptyEffectType);
        }
        if self.entries.contains_key(effect_type) {
            return Err(RegistryError::DuplicateEffect(effect_type.to_string()));
        }
        self.entries.insert(effect_type.to_string(), factory);
        Ok(())
    }

    /// Register a factory, aborting on misuse.
    ///
    /// Intended for startup-time registration tables where a duplicate or
    /// empty name is a programming error.
    ///
    /// # Panics
    ///
    /// Panics on any [`RegistryError`].
    pub fn must_register(&mut self, effect_type: &str, factory: RuntimeFactory) {
        if let Err(err) = self.register(effect_type, factory) {
            panic!("effect registration failed: {err}");
        }
    }

    /// Look up the factory for an effect type.
    pub fn lookup(&self, effect_type: &str) -> Option<&RuntimeFactory> {
        self.entries.get(effect_type)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Wrap an infallible generic constructor.
macro_rules! generic {
    ($ctor:expr) => {
        Box::new(move |ctx: &Context| Ok(NodeRuntime::Generic(Box::new($ctor(ctx)))))
    };
}

/// Wrap a fallible generic constructor.
macro_rules! generic_try {
    ($ctor:expr) => {
        Box::new(move |ctx: &Context| Ok(NodeRuntime::Generic(Box::new($ctor(ctx)?))))
    };
}

/// Registry with every builtin effect type, using the default filter
/// designer and synthetic impulse-response provider.
pub fn default_registry() -> Registry {
    default_registry_with(Arc::new(RbjDesigner), Arc::new(SyntheticRoomIr::default()))
}

/// Registry with every builtin effect type and caller-supplied
/// collaborators for the filter and convolution nodes.
pub fn default_registry_with(
    designer: Arc<dyn FilterDesigner>,
    ir_provider: Arc<dyn ImpulseResponseProvider>,
) -> Registry {
    let mut registry = Registry::new();

    // Modulation.
    registry.must_register("chorus", generic!(ChorusNode::new));
    registry.must_register("flanger", generic!(FlangerNode::new));
    registry.must_register("phaser", generic!(PhaserNode::new));
    registry.must_register("tremolo", generic!(TremoloNode::new));
    registry.must_register("ringmod", generic!(RingModNode::new));
    registry.must_register("widener", generic!(WidenerNode::new));

    // Nonlinear.
    registry.must_register("distortion", generic!(DistortionNode::new));
    registry.must_register("dist-cheb", generic!(ChebyshevNode::new));
    registry.must_register("bitcrusher", generic!(BitcrusherNode::new));
    registry.must_register("transformer", generic!(TransformerNode::new));

    // Filters. The `filter*` family shares one node type parameterized by
    // the node's type tag; each registration captures the shared designer.
    for filter_type in [
        "filter",
        "filter-lowpass",
        "filter-highpass",
        "filter-bandpass",
        "filter-notch",
        "filter-allpass",
        "filter-peak",
        "filter-lowshelf",
        "filter-highshelf",
    ] {
        let designer = Arc::clone(&designer);
        registry.must_register(
            filter_type,
            Box::new(move |ctx: &Context| {
                Ok(NodeRuntime::Generic(Box::new(FilterNode::new(
                    ctx,
                    Arc::clone(&designer),
                )?)))
            }),
        );
    }
    registry.must_register("filter-moog", generic_try!(MoogFilterNode::new));
    registry.must_register("bass", generic!(BassNode::new));

    // Time-based.
    registry.must_register("delay", generic!(DelayNode::new));
    registry.must_register("delay-simple", generic!(SimpleDelayNode::new));

    // Reverb.
    registry.must_register("reverb", generic!(FreeverbNode::new));
    registry.must_register("reverb-freeverb", generic!(FreeverbNode::new));
    registry.must_register("reverb-fdn", generic!(FdnReverbNode::new));
    {
        let ir_provider = Arc::clone(&ir_provider);
        registry.must_register(
            "reverb-conv",
            Box::new(move |ctx: &Context| {
                Ok(NodeRuntime::Generic(Box::new(ConvolutionNode::new(
                    ctx,
                    Arc::clone(&ir_provider),
                ))))
            }),
        );
    }

    // Pitch, spectral, granular.
    registry.must_register("pitch-time", generic!(PitchTimeNode::new));
    registry.must_register("pitch-spectral", generic!(PitchSpectralNode::new));
    registry.must_register("spectral-freeze", generic!(SpectralFreezeNode::new));
    registry.must_register("granular", generic!(GranularNode::new));

    // Dynamics.
    registry.must_register("dyn-compressor", generic_try!(CompressorNode::new));
    registry.must_register("dyn-limiter", generic_try!(LimiterNode::new));
    registry.must_register("dyn-gate", generic_try!(GateNode::new));
    registry.must_register("dyn-expander", generic_try!(ExpanderNode::new));
    registry.must_register("dyn-deesser", generic_try!(DeEsserNode::new));
    registry.must_register("dyn-transient", generic_try!(TransientNode::new));
    registry.must_register("dyn-multiband", generic_try!(MultibandNode::new));

    // Sidechain consumers.
    registry.must_register(
        "dyn-lookahead",
        Box::new(|ctx: &Context| {
            Ok(NodeRuntime::Sidechain(Box::new(LookaheadLimiterNode::new(
                ctx,
            )?)))
        }),
    );
    registry.must_register(
        "vocoder",
        Box::new(|ctx: &Context| Ok(NodeRuntime::Sidechain(Box::new(VocoderNode::new(ctx))))),
    );

    registry
}
