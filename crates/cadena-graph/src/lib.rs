//! Cadena Graph - declarative routing for effect chains.
//!
//! This crate turns a JSON graph description into a running effect chain:
//!
//! - [`compile`] parses the document into a [`CompiledGraph`]: validated
//!   nodes, port-addressed edges, and a Kahn topological order.
//! - [`EffectChain`] owns the compiled graph, synchronizes per-node
//!   runtimes against the registry across reloads, and executes the
//!   per-block traversal: parent mixing, main/sidechain partitioning,
//!   band-splitter routing, and the output copy-back.
//!
//! # Example
//!
//! ```rust
//! use cadena_core::Context;
//! use cadena_graph::EffectChain;
//! use cadena_registry::default_registry;
//!
//! let ctx = Context::new(48000.0).unwrap();
//! let mut chain = EffectChain::new(ctx, default_registry());
//!
//! chain.load_graph(r#"{
//!     "nodes": [
//!         {"id": "_input", "type": "_input"},
//!         {"id": "comp", "type": "dyn-compressor", "params": {"ratio": 4.0}},
//!         {"id": "_output", "type": "_output"}
//!     ],
//!     "connections": [
//!         {"from": "_input", "to": "comp"},
//!         {"from": "comp", "to": "_output"}
//!     ]
//! }"#).unwrap();
//!
//! let mut block = vec![0.1, 0.2, 0.3, 0.4];
//! assert!(chain.process(&mut block));
//! ```

pub mod chain;
pub mod compile;
pub mod error;
pub mod transport;

pub use chain::EffectChain;
pub use compile::{
    CompiledGraph, Edge, INPUT_ID, OUTPUT_ID, compile, is_sidechain_aware, is_structural,
};
pub use error::GraphError;
