//! Echo nodes: damped feedback delay and the bare simple echo.

use cadena_core::{Context, DelayLine, DspError, NodeParams, OnePole, Runtime, sanitize};

const MAX_DELAY_SECONDS: f64 = 4.0;

/// Tape-style feedback delay node.
///
/// Parameters: `timeMs` default 350 clamp [1, 4000]; `feedback` default 0.4
/// clamp [0, 0.95]; `dampHz` default 4000 clamp [200, 20000] (feedback-path
/// lowpass); `mix` default 0.35 clamp [0, 1].
pub struct DelayNode {
    line: DelayLine,
    damping: OnePole,
    delay_samples: f64,
    feedback: f64,
    mix: f64,
    sample_rate: f64,
}

impl DelayNode {
    /// Create a delay at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            line: DelayLine::from_time(sample_rate, MAX_DELAY_SECONDS),
            damping: OnePole::new(sample_rate, 4000.0),
            delay_samples: 350.0 / 1000.0 * sample_rate,
            feedback: 0.4,
            mix: 0.35,
            sample_rate,
        }
    }
}

impl Runtime for DelayNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.line = DelayLine::from_time(sample_rate, MAX_DELAY_SECONDS);
            self.damping.set_sample_rate(sample_rate);
            self.sample_rate = sample_rate;
        }
        let time_ms = params.number_clamped("timeMs", 350.0, 1.0, 4000.0);
        self.delay_samples = time_ms / 1000.0 * sample_rate;
        self.feedback = params.number_clamped("feedback", 0.4, 0.0, 0.95);
        self.damping
            .set_frequency(params.number_clamped("dampHz", 4000.0, 200.0, 20000.0));
        self.mix = params.number_clamped("mix", 0.35, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let wet = self.line.read(self.delay_samples);
            let regen = self.damping.process(wet) * self.feedback;
            self.line.write(input + regen);
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        self.damping.reset();
    }
}

/// Bare echo node: single repeat path, no damping (`delay-simple`).
///
/// Parameters: `timeMs` default 250 clamp [1, 4000]; `feedback` default 0.3
/// clamp [0, 0.95]; `mix` default 0.5 clamp [0, 1].
pub struct SimpleDelayNode {
    line: DelayLine,
    delay_samples: f64,
    feedback: f64,
    mix: f64,
    sample_rate: f64,
}

impl SimpleDelayNode {
    /// Create a simple delay at the context's sample rate.
    pub fn new(ctx: &Context) -> Self {
        let sample_rate = ctx.sample_rate();
        Self {
            line: DelayLine::from_time(sample_rate, MAX_DELAY_SECONDS),
            delay_samples: 250.0 / 1000.0 * sample_rate,
            feedback: 0.3,
            mix: 0.5,
            sample_rate,
        }
    }
}

impl Runtime for SimpleDelayNode {
    fn configure(&mut self, ctx: &Context, params: &NodeParams) -> Result<(), DspError> {
        let sample_rate = ctx.sample_rate();
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.line = DelayLine::from_time(sample_rate, MAX_DELAY_SECONDS);
            self.sample_rate = sample_rate;
        }
        let time_ms = params.number_clamped("timeMs", 250.0, 1.0, 4000.0);
        self.delay_samples = time_ms / 1000.0 * sample_rate;
        self.feedback = params.number_clamped("feedback", 0.3, 0.0, 0.95);
        self.mix = params.number_clamped("mix", 0.5, 0.0, 1.0);
        Ok(())
    }

    fn process(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            let input = sanitize(*sample);
            let wet = self.line.read(self.delay_samples);
            self.line.write(input + wet * self.feedback);
            *sample = input * (1.0 - self.mix) + wet * self.mix;
        }
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_appears_at_the_configured_time() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("d", "delay-simple");
        params.set_number("timeMs", 10.0);
        params.set_number("mix", 1.0);
        params.set_number("feedback", 0.0);
        let mut node = SimpleDelayNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        let mut block = vec![0.0; 1024];
        block[0] = 1.0;
        node.process(&mut block);
        // Read-before-write places the echo one sample past the nominal tap.
        let expected = (10.0 / 1000.0 * 48000.0) as usize + 1;
        assert!(
            block[expected].abs() > 0.9,
            "echo should land at sample {expected}, got {}",
            block[expected]
        );
    }

    #[test]
    fn feedback_produces_decaying_repeats() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("d", "delay-simple");
        params.set_number("timeMs", 5.0);
        params.set_number("feedback", 0.5);
        params.set_number("mix", 1.0);
        let mut node = SimpleDelayNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        // Read-before-write: each repeat lands one sample past the tap.
        let lag = (5.0 / 1000.0 * 48000.0) as usize + 1;
        let mut block = vec![0.0; lag * 4 + 8];
        block[0] = 1.0;
        node.process(&mut block);
        let first = block[lag].abs();
        let second = block[lag * 2].abs();
        let third = block[lag * 3].abs();
        assert!(first > 0.9);
        assert!((second - 0.5).abs() < 0.05, "second repeat ~0.5, got {second}");
        assert!((third - 0.25).abs() < 0.05, "third repeat ~0.25, got {third}");
    }

    #[test]
    fn damped_delay_stays_finite_at_high_feedback() {
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("d", "delay");
        params.set_number("feedback", 0.95);
        params.set_number("timeMs", 50.0);
        let mut node = DelayNode::new(&ctx);
        node.configure(&ctx, &params).unwrap();

        let mut block: Vec<f64> = (0..96000).map(|i| (i as f64 * 0.03).sin() * 0.5).collect();
        node.process(&mut block);
        assert!(block.iter().all(|x| x.is_finite()));
        assert!(block.iter().all(|x| x.abs() < 16.0));
    }

    #[test]
    fn block_boundaries_do_not_break_continuity() {
        // One 512-sample block vs two 256-sample blocks must match exactly.
        let ctx = Context::new(48000.0).unwrap();
        let mut params = NodeParams::new("d", "delay");
        params.set_number("timeMs", 3.0);
        params.set_number("feedback", 0.6);
        let mut whole = DelayNode::new(&ctx);
        whole.configure(&ctx, &params).unwrap();
        let mut halves = DelayNode::new(&ctx);
        halves.configure(&ctx, &params).unwrap();

        let input: Vec<f64> = (0..512).map(|i| (i as f64 * 0.11).sin()).collect();
        let mut a = input.clone();
        whole.process(&mut a);

        let mut b = input;
        let (first, second) = b.split_at_mut(256);
        halves.process(first);
        halves.process(second);

        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12, "state must carry across blocks");
        }
    }
}
