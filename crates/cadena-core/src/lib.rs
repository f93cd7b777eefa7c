//! Cadena Core - DSP primitives and processors for the effect-chain engine
//!
//! This crate provides the foundational building blocks for the cadena audio
//! graph: the per-node [`Runtime`] contract, the parameter bag every node is
//! configured from, and the DSP that the heavier effect nodes are built on.
//!
//! # Core Abstractions
//!
//! ## Node contract
//!
//! - [`Runtime`] - Object-safe trait every effect node implements
//! - [`SidechainRuntime`] - Optional capability for sidechain consumers
//! - [`NodeRuntime`] - Capability decided at factory time, not by downcasting
//! - [`NodeParams`] - Parameter bag with default-on-missing/NaN/Inf lookup
//! - [`Context`] - Audio environment (validated sample rate)
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`FilterDesigner`] - Coefficient design seam consumed by the filter node
//! - [`OnePole`] / [`OnePoleHighpass`] - Single-pole tone/prefilter sections
//! - [`MoogFilter`] - Nonlinear 4-stage ladder with selectable variants
//! - [`LinkwitzRiley`] / [`MultibandSplitter`] - Crossover network
//!
//! ## Dynamics
//!
//! - [`DynamicsProcessor`] - Shared envelope/gain-computer core used by the
//!   compressor, expander, gate, limiter, lookahead limiter, and de-esser
//! - [`LookaheadLimiter`], [`DeEsser`], [`TransientShaper`],
//!   [`MultibandCompressor`]
//!
//! ## Utilities
//!
//! - [`DelayLine`] - Circular delay with fractional read
//! - [`EnvelopeFollower`] - Attack/release amplitude tracking
//! - [`Lfo`] - Low-frequency oscillator (4 waveforms)
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`sanitize`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cadena-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths after the
//!   first configure at a given block size
//! - **Finite output**: Non-finite input samples are treated as zero; nodes
//!   never publish NaN or infinity
//! - **Errors are values**: All fallible configuration returns [`DspError`]

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod context;
pub mod crossover;
pub mod delay_line;
pub mod design;
pub mod dynamics;
pub mod envelope;
pub mod error;
pub mod ir;
pub mod lfo;
pub mod math;
pub mod moog;
pub mod one_pole;
pub mod params;
pub mod runtime;

// Re-export main types at crate root
pub use biquad::{
    Biquad, BiquadCoeffs, allpass_coefficients, bandpass_coefficients, highpass_coefficients,
    highshelf_coefficients, lowpass_coefficients, lowshelf_coefficients, notch_coefficients,
    peaking_coefficients,
};
pub use context::Context;
pub use crossover::{LinkwitzRiley, MultibandSplitter, MAX_BANDS};
pub use delay_line::DelayLine;
pub use design::{FilterDesigner, FilterFamily, FilterKind, FilterSpec, RbjDesigner};
pub use dynamics::deesser::{DeEsser, DeEsserDetector, DeEsserMode};
pub use dynamics::lookahead::LookaheadLimiter;
pub use dynamics::multiband::MultibandCompressor;
pub use dynamics::transient::TransientShaper;
pub use dynamics::{DetectorMode, DynamicsConfig, DynamicsMode, DynamicsProcessor, Topology};
pub use envelope::EnvelopeFollower;
pub use error::DspError;
pub use ir::{ImpulseResponseProvider, SyntheticRoomIr};
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    db_to_linear, flush_denormal, hard_clip, lerp, linear_to_db, sanitize, soft_clip, tanh_pade,
};
pub use moog::{MoogFilter, MoogVariant};
pub use one_pole::{OnePole, OnePoleHighpass};
pub use params::NodeParams;
pub use runtime::{NodeRuntime, Runtime, SidechainRuntime};
