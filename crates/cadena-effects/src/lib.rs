//! Cadena Effects - effect node implementations
//!
//! Every type in this crate adapts a DSP processor to the
//! [`Runtime`](cadena_core::Runtime) contract: parameters are read from the
//! node's [`NodeParams`](cadena_core::NodeParams) with documented defaults
//! and clamped ranges at configure time, string-valued options are
//! normalized into closed enums once, and processing runs block-in-place
//! with state carried across blocks.
//!
//! Node families:
//!
//! - **Modulation**: [`ChorusNode`], [`FlangerNode`], [`PhaserNode`],
//!   [`TremoloNode`], [`RingModNode`], [`WidenerNode`]
//! - **Nonlinear**: [`DistortionNode`], [`ChebyshevNode`],
//!   [`BitcrusherNode`], [`TransformerNode`]
//! - **Filters**: [`FilterNode`] (designer-driven biquad cascades),
//!   [`MoogFilterNode`] (ladder), [`BassNode`]
//! - **Time**: [`DelayNode`], [`SimpleDelayNode`]
//! - **Reverb**: [`FreeverbNode`], [`FdnReverbNode`], [`ConvolutionNode`]
//! - **Spectral / granular**: [`PitchTimeNode`], [`PitchSpectralNode`],
//!   [`SpectralFreezeNode`], [`GranularNode`]
//! - **Dynamics**: [`CompressorNode`], [`LimiterNode`],
//!   [`LookaheadLimiterNode`], [`GateNode`], [`ExpanderNode`],
//!   [`DeEsserNode`], [`TransientNode`], [`MultibandNode`]
//! - **Sidechain consumers**: [`LookaheadLimiterNode`], [`VocoderNode`]

pub mod bass;
pub mod bitcrusher;
pub mod cheb;
pub mod chorus;
pub mod delay;
pub mod distortion;
pub mod dynamics;
pub mod filter;
pub mod flanger;
pub mod granular;
pub mod phaser;
pub mod pitch_spectral;
pub mod pitch_time;
pub mod reverb;
pub mod reverb_conv;
pub mod reverb_fdn;
pub mod ringmod;
pub mod spectral_freeze;
pub mod transformer;
pub mod tremolo;
pub mod vocoder;
pub mod widener;

pub use bass::BassNode;
pub use bitcrusher::BitcrusherNode;
pub use cheb::ChebyshevNode;
pub use chorus::ChorusNode;
pub use delay::{DelayNode, SimpleDelayNode};
pub use distortion::{DistortionApprox, DistortionMode, DistortionNode};
pub use dynamics::{
    CompressorNode, DeEsserNode, ExpanderNode, GateNode, LimiterNode, LookaheadLimiterNode,
    MultibandNode, TransientNode,
};
pub use filter::{FilterNode, MoogFilterNode};
pub use flanger::FlangerNode;
pub use granular::GranularNode;
pub use phaser::PhaserNode;
pub use pitch_spectral::PitchSpectralNode;
pub use pitch_time::PitchTimeNode;
pub use reverb::FreeverbNode;
pub use reverb_conv::ConvolutionNode;
pub use reverb_fdn::FdnReverbNode;
pub use ringmod::RingModNode;
pub use spectral_freeze::SpectralFreezeNode;
pub use transformer::TransformerNode;
pub use tremolo::TremoloNode;
pub use vocoder::VocoderNode;
pub use widener::WidenerNode;
