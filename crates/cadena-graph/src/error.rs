//! Error types for graph compilation and chain control.

use cadena_core::DspError;
use thiserror::Error;

/// Errors surfaced by [`compile`](crate::compile) and
/// [`EffectChain::load_graph`](crate::EffectChain::load_graph).
///
/// An unknown effect type is not an error: the node stays in the graph
/// without a runtime and behaves as a passthrough.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The transport document could not be parsed.
    #[error("invalid graph JSON: {0}")]
    InvalidGraphJson(#[from] serde_json::Error),

    /// The compiled order does not cover every node.
    #[error("graph contains a cycle")]
    CyclicGraph,

    /// A runtime's configure surfaced a DSP-level error. The chain keeps
    /// the previously installed graph.
    #[error("configuring node '{id}' failed: {source}")]
    ConfigureFailed {
        /// Id of the node whose configuration failed.
        id: String,
        /// The underlying DSP error.
        source: DspError,
    },
}
