//! Circular delay line with fractional read.
//!
//! The single delay primitive shared by the lookahead limiter, the modulated
//! delay effects (chorus, flanger), the echo nodes, and the reverbs. The
//! buffer is heap-allocated at construction and never reallocates; no
//! allocations occur during audio processing.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Circular f64 delay line supporting fractional delays via linear
/// interpolation.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
}

impl DelayLine {
    /// Creates a delay line holding up to `max_delay_samples` samples.
    ///
    /// # Panics
    ///
    /// Panics if `max_delay_samples` is 0.
    pub fn new(max_delay_samples: usize) -> Self {
        assert!(max_delay_samples > 0, "delay size must be > 0");
        Self {
            buffer: vec![0.0; max_delay_samples],
            write_pos: 0,
        }
    }

    /// Creates a delay line from a sample rate and maximum delay time.
    pub fn from_time(sample_rate: f64, max_seconds: f64) -> Self {
        let max_samples = (sample_rate * max_seconds) as usize + 1;
        Self::new(max_samples)
    }

    /// Reads a delayed sample with linear interpolation.
    ///
    /// `delay_samples` counts back from the most recently written sample;
    /// 0 reads that sample. Values beyond capacity are clamped.
    #[inline]
    pub fn read(&self, delay_samples: f64) -> f64 {
        debug_assert!(delay_samples >= 0.0);

        let buffer_len = self.buffer.len();
        let delay_clamped = delay_samples.min((buffer_len - 1) as f64);

        let delay_int = delay_clamped as usize;
        let delay_frac = delay_clamped - delay_int as f64;

        let last_written = if self.write_pos == 0 {
            buffer_len - 1
        } else {
            self.write_pos - 1
        };

        let read_pos = if last_written >= delay_int {
            last_written - delay_int
        } else {
            buffer_len + last_written - delay_int
        };

        let next_pos = if read_pos == 0 { buffer_len - 1 } else { read_pos - 1 };

        let sample0 = self.buffer[read_pos];
        let sample1 = self.buffer[next_pos];

        sample0 + (sample1 - sample0) * delay_frac
    }

    /// Reads at an integer delay without interpolation.
    #[inline]
    pub fn read_integer(&self, delay_samples: usize) -> f64 {
        let buffer_len = self.buffer.len();
        let delay = delay_samples.min(buffer_len - 1);
        let last_written = if self.write_pos == 0 {
            buffer_len - 1
        } else {
            self.write_pos - 1
        };
        let read_pos = if last_written >= delay {
            last_written - delay
        } else {
            buffer_len + last_written - delay
        };
        self.buffer[read_pos]
    }

    /// Writes a sample and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f64) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Combined read-then-write.
    #[inline]
    pub fn read_write(&mut self, sample: f64, delay_samples: f64) -> f64 {
        let output = self.read(delay_samples);
        self.write(sample);
        output
    }

    /// Clears the delay line.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Maximum delay capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_delays_are_exact() {
        let mut delay = DelayLine::new(16);
        for i in 0..8 {
            delay.write(i as f64);
        }
        // delay 0 = last written (7), delay 1 = 6, ...
        for d in 0..8 {
            assert_eq!(delay.read(d as f64), (7 - d) as f64);
            assert_eq!(delay.read_integer(d), (7 - d) as f64);
        }
    }

    #[test]
    fn fractional_read_interpolates() {
        let mut delay = DelayLine::new(8);
        delay.write(0.0);
        delay.write(1.0);
        // Halfway between the last written (1.0) and one back (0.0).
        assert!((delay.read(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn wraps_around_capacity() {
        let mut delay = DelayLine::new(4);
        for i in 0..100 {
            delay.write(i as f64);
        }
        assert_eq!(delay.read(0.0), 99.0);
        assert_eq!(delay.read(3.0), 96.0);
    }

    #[test]
    fn clear_zeroes_history() {
        let mut delay = DelayLine::new(8);
        delay.write(1.0);
        delay.clear();
        assert_eq!(delay.read(0.0), 0.0);
        assert_eq!(delay.read(5.0), 0.0);
    }
}
