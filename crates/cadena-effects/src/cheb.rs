//! Chebyshev waveshaper node.
//!
//! Chebyshev polynomials of the first kind map a full-scale sine at the
//! input to the k-th harmonic at the output, so a weighted sum of T₂…T₉
//! synthesizes a controlled harmonic series. The harmonic mode selects
//! which polynomials participate.

use cadena_core::{Context, DspError, NodeParams, Runtime, hard_clip, sanitize};

const MAX_HARMONICS: usize = 8;

/// Which harmonics participate in the blend. Closed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarmonicMode {
    /// All harmonics 2..=N+1.
    #[default]
    All,
    /// Odd harmonics only (3, 5, 7, 9).
    Odd,
    /// Even harmonics only (2, 4, 6, 8).
    Even,
}

impl HarmonicMode {
    /// Normalize a mode name. Unknown names fall back to all.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "odd" => Self::Odd,
            "even" => Self::Even,
            _ => Self::All,
        }
    }
}

/// Chebyshev harmonic distortion node (`dist-cheb`).
///
/// Parameters: `harmonics` default 4 clamp [1, 8]; `mode` string in
/// {all, odd, even}, default all; `drive` default 1 clamp [0.1, 10];
/// `mix` default 1 clamp [0, 1].
pub struct ChebyshevNode {
    harmonics: usize,
    mode: HarmonicMode,
    drive: f64,
    mix: f64,
}

impl ChebyshevNode {
    /// Create a Chebyshev shaper.
    pub fn new(_ctx: &Context) -> Self {
        Self {
            harmonics: 4,
            mode: HarmonicMode::default(),
            drive: 1.0,
            mix: 1.0,
        }
    }

    /// Weighted Chebyshev blend of the clamped input.
    #[inline]
    fn shape(&self, x: f64) -> f64 {
        let x = hard_clip(x, 1.0);

        // Chebyshev recurrence: T₀ = 1, T₁ = x, Tₙ = 2x·Tₙ₋₁ − Tₙ₋₂.
        let mut t_prev = 1.0;
        let mut t_curr = x;
        let mut sum = x;
        let mut dc = 0.0;
        let mut used = 0;
        let mut k = 2usize;
        while used < self.harmonics && k < 2 + 2 * MAX_HARMONICS {
            let t_next = 2.0 * x * t_curr - t_prev;
            t_prev = t_curr;
            t_curr = t_next;

            let include = match self.mode {
                HarmonicMode::All => true,
                HarmonicMode::Odd => k % 2 == 1,
                HarmonicMode::Even => k % 2 == 0,
            };
            if include {
                used += 1;
                let weight = 1.0 / (used + 1) as f64;
                sum += weight * t_curr;
                // Even-order polynomials carry a DC term: Tₖ(0) = ±1.
                if k % 2 == 0 {
                    let t_at_zero = if k % 4 == 0 { 1.0 } else { -1.0 };
                    dc += weight * t_at_zero;
                }
            }
            k += 1;
        }
        hard_clip(sum - dc, 1.0)
    }
}

impl Runtime for ChebyshevNode {
    fn configure(&mut self, _ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        self.harmonics = params.number_clamped("harmonics", 4.0, 1.0, MAX_HARMONICS as f64) as usize;
        self.mode = HarmonicMode::from_name(params.text("mode"));
        self.drive = params.number_clamped("drive", 1.0, 0.1, 10.0);
        self.mix = params.number_clamped("mix", 1.0, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let wet = self.shape(input * self.drive);
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {}
}
