//! The per-node processing contract.
//!
//! Every effect node in a chain implements [`Runtime`]. Nodes that can
//! consume a sidechain additionally implement [`SidechainRuntime`]; whether a
//! node has that capability is decided once, at factory time, by wrapping it
//! in the matching [`NodeRuntime`] variant. The block processor matches on
//! the variant instead of performing dynamic casts in the hot path.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use crate::context::Context;
use crate::error::DspError;
use crate::params::NodeParams;

/// Object-safe contract for a per-node audio processor.
///
/// A runtime is created once by its factory, configured on every graph
/// reload, and then asked to process blocks in place. Mutable DSP state
/// (filter taps, envelopes, delay lines) is carried across blocks;
/// block-to-block continuity is a correctness requirement.
pub trait Runtime: Send {
    /// Apply the node's parameters for the given audio environment.
    ///
    /// Idempotent. May reinitialize DSP state when the sample rate or a
    /// structural parameter changes, but must preserve continuous state
    /// whenever possible.
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError>;

    /// Transform a block in place.
    ///
    /// Must be allocation-free after the first configure at a given block
    /// size, and must produce only finite output for finite input. NaN or
    /// infinity in the input may be treated as zero.
    fn process(&mut self, block: &mut [f64]);

    /// Clear continuous DSP state without changing parameters.
    fn reset(&mut self);

    /// Processing latency in samples (lookahead delays, spectral frames).
    ///
    /// Default is 0.
    fn latency_samples(&self) -> usize {
        0
    }
}

/// Optional capability for nodes that read a secondary detector input.
pub trait SidechainRuntime: Runtime {
    /// Transform `main` in place, reading `side` (same length) as the
    /// detector or analysis signal.
    fn process_with_sidechain(&mut self, main: &mut [f64], side: &[f64]);
}

/// A node runtime with its sidechain capability resolved at factory time.
pub enum NodeRuntime {
    /// A node that processes its mixed main input only.
    Generic(Box<dyn Runtime>),
    /// A node that additionally consumes the port-1 sidechain mix.
    Sidechain(Box<dyn SidechainRuntime>),
}

impl NodeRuntime {
    /// Configure the wrapped runtime.
    pub fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        match self {
            Self::Generic(rt) => rt.configure(ctx, params),
            Self::Sidechain(rt) => rt.configure(ctx, params),
        }
    }

    /// Process a block in place through the wrapped runtime.
    pub fn process(&mut self, block: &mut [f64]) {
        match self {
            Self::Generic(rt) => rt.process(block),
            Self::Sidechain(rt) => rt.process(block),
        }
    }

    /// Clear the wrapped runtime's continuous state.
    pub fn reset(&mut self) {
        match self {
            Self::Generic(rt) => rt.reset(),
            Self::Sidechain(rt) => rt.reset(),
        }
    }

    /// Reported latency of the wrapped runtime.
    pub fn latency_samples(&self) -> usize {
        match self {
            Self::Generic(rt) => rt.latency_samples(),
            Self::Sidechain(rt) => rt.latency_samples(),
        }
    }

    /// True when the node was constructed with the sidechain capability.
    pub fn is_sidechain(&self) -> bool {
        matches!(self, Self::Sidechain(_))
    }
}

impl core::fmt::Debug for NodeRuntime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Generic(_) => f.write_str("NodeRuntime::Generic"),
            Self::Sidechain(_) => f.write_str("NodeRuntime::Sidechain"),
        }
    }
}
