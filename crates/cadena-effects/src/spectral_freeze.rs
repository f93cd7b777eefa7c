//! Spectral freeze node.
//!
//! STFT processor that can lock the current magnitude spectrum and sustain
//! it indefinitely. While frozen, each synthesis frame reuses the captured
//! magnitudes; the phase mode decides how bin phases evolve:
//!
//! - *running* - phases advance at each bin's nominal frequency (smooth,
//!   tonal sustain)
//! - *random* - phases are re-drawn from a deterministic LCG every frame
//!   (diffuse, noise-like sustain)
//! - *original* - the captured phases are replayed verbatim (comb-like
//!   buzz, the raw legacy behavior)
//!
//! Unfrozen, the node is a windowed analysis/resynthesis passthrough with
//! the same latency, so toggling the freeze never clicks from a latency
//! jump.

use cadena_core::{Context, DspError, NodeParams, Runtime, sanitize};
use libm::{atan2, cos, sin, sqrt};
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

const FFT_SIZE: usize = 2048;
const OVERSAMP: usize = 4;
const HOP: usize = FFT_SIZE / OVERSAMP;
const HALF: usize = FFT_SIZE / 2;

/// Hann window value for index `i` of `FFT_SIZE`.
#[inline]
fn hann(i: usize) -> f64 {
    0.5 - 0.5 * cos(core::f64::consts::TAU * i as f64 / FFT_SIZE as f64)
}

/// How bin phases evolve while frozen. Closed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreezePhaseMode {
    /// Advance each bin at its nominal frequency.
    #[default]
    Running,
    /// Redraw phases every frame from a deterministic LCG.
    Random,
    /// Replay the captured phases.
    Original,
}

impl FreezePhaseMode {
    /// Normalize a phase-mode name. Unknown names fall back to running.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "random" => Self::Random,
            "original" => Self::Original,
            _ => Self::Running,
        }
    }
}

/// Spectral freeze node (`spectral-freeze`).
///
/// Parameters: `freeze` flag (0/1) default 0; `phaseMode` string in
/// {running, random, original}; `mix` default 1 clamp [0, 1].
pub struct SpectralFreezeNode {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    in_fifo: Vec<f64>,
    out_fifo: Vec<f64>,
    out_accum: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    frozen_mag: Vec<f64>,
    frozen_phase: Vec<f64>,
    running_phase: Vec<f64>,
    fifo_fill: usize,
    frozen: bool,
    have_capture: bool,
    phase_mode: FreezePhaseMode,
    mix: f64,
    rng_state: u64,
}

impl SpectralFreezeNode {
    /// Create a spectral freeze at the context's sample rate.
    pub fn new(_ctx: &Context) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(FFT_SIZE),
            inverse: planner.plan_fft_inverse(FFT_SIZE),
            in_fifo: vec![0.0; FFT_SIZE],
            out_fifo: vec![0.0; FFT_SIZE],
            out_accum: vec![0.0; 2 * FFT_SIZE],
            spectrum: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            frozen_mag: vec![0.0; HALF + 1],
            frozen_phase: vec![0.0; HALF + 1],
            running_phase: vec![0.0; HALF + 1],
            fifo_fill: FFT_SIZE - HOP,
            frozen: false,
            have_capture: false,
            phase_mode: FreezePhaseMode::default(),
            mix: 1.0,
            rng_state: 0x9e3779b97f4a7c15,
        }
    }

    #[inline]
    fn next_random_phase(&mut self) -> f64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.rng_state >> 11) as f64 / (1u64 << 53) as f64 * core::f64::consts::TAU
    }

    fn process_frame(&mut self) {
        for i in 0..FFT_SIZE {
            self.spectrum[i] = Complex::new(self.in_fifo[i] * hann(i), 0.0);
        }
        self.forward.process(&mut self.spectrum);

        if self.frozen && !self.have_capture {
            // Capture the spectrum the moment the freeze engages.
            for k in 0..=HALF {
                let c = self.spectrum[k];
                self.frozen_mag[k] = sqrt(c.re * c.re + c.im * c.im);
                self.frozen_phase[k] = atan2(c.im, c.re);
                self.running_phase[k] = self.frozen_phase[k];
            }
            self.have_capture = true;
        }

        if self.frozen && self.have_capture {
            let expected = core::f64::consts::TAU * HOP as f64 / FFT_SIZE as f64;
            for k in 0..=HALF {
                let phase = match self.phase_mode {
                    FreezePhaseMode::Running => {
                        self.running_phase[k] += k as f64 * expected;
                        self.running_phase[k]
                    }
                    FreezePhaseMode::Random => self.next_random_phase(),
                    FreezePhaseMode::Original => self.frozen_phase[k],
                };
                self.spectrum[k] = Complex::new(
                    self.frozen_mag[k] * cos(phase),
                    self.frozen_mag[k] * sin(phase),
                );
            }
            for k in HALF + 1..FFT_SIZE {
                self.spectrum[k] = self.spectrum[FFT_SIZE - k].conj();
            }
        }

        self.inverse.process(&mut self.spectrum);

        // Unnormalized transforms both ways; fold 1/N into the
        // overlap-add gain.
        let scale = 1.0 / (HALF as f64 * OVERSAMP as f64);
        for i in 0..FFT_SIZE {
            self.out_accum[i] += hann(i) * self.spectrum[i].re * scale;
        }

        self.out_fifo[..HOP].copy_from_slice(&self.out_accum[..HOP]);
        self.out_accum.copy_within(HOP.., 0);
        let tail = 2 * FFT_SIZE - HOP;
        self.out_accum[tail..].fill(0.0);
        self.in_fifo.copy_within(HOP.., 0);
    }
}

impl Runtime for SpectralFreezeNode {
    fn configure(&mut self, _ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let freeze = params.number("freeze", 0.0) != 0.0;
        if freeze && !self.frozen {
            self.have_capture = false;
        }
        self.frozen = freeze;
        self.phase_mode = FreezePhaseMode::from_name(params.text("phaseMode"));
        self.mix = params.number_clamped("mix", 1.0, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        let latency = FFT_SIZE - HOP;
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            self.in_fifo[self.fifo_fill] = input;
            let wet = self.out_fifo[self.fifo_fill - latency];
            self.fifo_fill += 1;
            if self.fifo_fill >= FFT_SIZE {
                self.fifo_fill = latency;
                self.process_frame();
            }
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.in_fifo.fill(0.0);
        self.out_fifo.fill(0.0);
        self.out_accum.fill(0.0);
        self.running_phase.fill(0.0);
        self.fifo_fill = FFT_SIZE - HOP;
        self.have_capture = false;
    }

    fn latency_samples(&self) -> usize {
        FFT_SIZE - HOP
    }
}
