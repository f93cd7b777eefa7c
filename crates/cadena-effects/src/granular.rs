//! Granular texture node.
//!
//! A scheduler launches short Hann-windowed grains that replay slices of
//! the recent input history at jittered offsets. Grain start jitter comes
//! from a deterministic LCG, so a given parameter set renders identically
//! on every run.

use cadena_core::{Context, DelayLine, DspError, NodeParams, Runtime, sanitize};
use libm::cos;

const MAX_GRAINS: usize = 8;
const HISTORY_SECONDS: f64 = 2.0;

/// One playing grain.
#[derive(Debug, Clone, Copy, Default)]
struct Grain {
    active: bool,
    /// Offset into the history at launch (samples).
    offset: f64,
    /// Grain length in samples.
    length: f64,
    /// Samples played so far.
    age: f64,
}

impl Grain {
    /// Hann envelope over the grain's age.
    #[inline]
    fn window(&self) -> f64 {
        0.5 - 0.5 * cos(core::f64::consts::TAU * self.age / self.length)
    }
}

/// Granular cloud node (`granular`).
///
/// Parameters: `grainMs` default 80 clamp [10, 200]; `density` default 4
/// clamp [1, 8] (concurrent grains); `spreadMs` default 100 clamp [0, 500]
/// (start-offset jitter); `mix` default 0.7 clamp [0, 1].
pub struct GranularNode {
    history: DelayLine,
    grains: [Grain; MAX_GRAINS],
    grain_samples: f64,
    density: usize,
    spread_samples: f64,
    mix: f64,
    spawn_countdown: f64,
    rng_state: u64,
    sample_rate: f64,
}

impl GranularNode {
    /// Create a granular node at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            history: DelayLine::from_time(sample_rate, HISTORY_SECONDS),
            grains: [Grain::default(); MAX_GRAINS],
            grain_samples: 80.0 / 1000.0 * sample_rate,
            density: 4,
            spread_samples: 100.0 / 1000.0 * sample_rate,
            mix: 0.7,
            spawn_countdown: 0.0,
            rng_state: 0x0123_4567_89ab_cdef,
            sample_rate,
        }
    }

    #[inline]
    fn next_random(&mut self) -> f64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.rng_state >> 11) as f64 / (1u64 << 53) as f64
    }

    fn spawn_grain(&mut self) {
        let jitter = self.next_random() * self.spread_samples;
        if let Some(slot) = self.grains.iter_mut().find(|g| !g.active) {
            *slot = Grain {
                active: true,
                offset: self.grain_samples + jitter,
                length: self.grain_samples,
                age: 0.0,
            };
        }
    }
}

impl Runtime for GranularNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.history = DelayLine::from_time(sample_rate, HISTORY_SECONDS);
            self.sample_rate = sample_rate;
        }
        self.grain_samples =
            params.number_clamped("grainMs", 80.0, 10.0, 200.0) / 1000.0 * sample_rate;
        self.density = params.number_clamped("density", 4.0, 1.0, MAX_GRAINS as f64) as usize;
        self.spread_samples =
            params.number_clamped("spreadMs", 100.0, 0.0, 500.0) / 1000.0 * sample_rate;
        self.mix = params.number_clamped("mix", 0.7, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        // One new grain every length/density samples keeps ~density grains
        // in flight.
        let spawn_interval = (self.grain_samples / self.density as f64).max(1.0);
        let normalize = 1.0 / (self.density as f64 * 0.5).max(1.0);

        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            self.history.write(input);

            self.spawn_countdown -= 1.0;
            if self.spawn_countdown <= 0.0 {
                self.spawn_grain();
                self.spawn_countdown = spawn_interval;
            }

            let mut wet = 0.0;
            for grain in self.grains.iter_mut() {
                if !grain.active {
                    continue;
                }
                // The grain replays history at normal speed: delay stays
                // constant while the write head advances.
                wet += self.history.read(grain.offset) * grain.window();
                grain.age += 1.0;
                if grain.age >= grain.length {
                    grain.active = false;
                }
            }
            wet *= normalize;

            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.history.clear();
        self.grains = [Grain::default(); MAX_GRAINS];
        self.spawn_countdown = 0.0;
    }
}
