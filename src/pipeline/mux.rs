//! Time-base reconciliation onto a fixed tick rate.

use trackmux_common::Rational;

use super::{Buffer, Codec, Status};

/// Accumulated-error-feedback quantizer that re-times buffers onto a track
/// with a fixed integer tick rate ("jiffies").
///
/// Incoming buffers may carry arbitrary rational durations (a live capture
/// clock, a 30000/1001 frame rate); each is emitted as a whole number of
/// ticks. The rounding error of each emission is carried in
/// `input_time - output_time` and corrected on the next buffer, so
/// quantization error never accumulates across a sequence. A buffer never
/// receives zero ticks, which keeps the track advancing even for
/// pathologically short inputs.
pub struct TimeBaseMux {
    jiffies: u32,
    input_time: Rational,
    output_time: Rational,
}

impl TimeBaseMux {
    /// Create a reconciler for a track at `jiffies` ticks per second.
    ///
    /// # Panics
    ///
    /// Panics if `jiffies` is zero.
    pub fn new(jiffies: u32) -> Self {
        assert!(jiffies > 0, "tick rate must be non-zero");
        Self {
            jiffies,
            input_time: Rational::ZERO,
            output_time: Rational::ZERO,
        }
    }

    /// The track's tick rate.
    pub fn jiffies(&self) -> u32 {
        self.jiffies
    }

    /// Total time accepted from upstream.
    pub fn input_time(&self) -> Rational {
        self.input_time
    }

    /// Total time emitted downstream, in whole ticks.
    pub fn output_time(&self) -> Rational {
        self.output_time
    }

    /// Accumulated quantization error, `input_time - output_time`.
    pub fn drift(&self) -> Rational {
        self.input_time - self.output_time
    }
}

impl Codec for TimeBaseMux {
    fn process(&mut self, input: &Buffer, output: &mut Buffer) -> Status {
        output.assign_from(input);
        if input.is_discarded() {
            return Status::Ok;
        }

        self.input_time = self.input_time + input.span();

        // Ideal allocation for this buffer, quantized to whole ticks. The
        // difference carries over and is corrected on the next buffer.
        let pending = self.input_time - self.output_time;
        let quantized = pending.round_to_multiple(self.jiffies);
        let mut ticks = (quantized * i64::from(self.jiffies)).round();
        if ticks < 1 {
            ticks = 1;
        }

        let tick_span = Rational::new(ticks, i64::from(self.jiffies));
        output.timestamp = self.output_time;
        output.duration = tick_span;
        output.sample_count = 1;
        self.output_time = self.output_time + tick_span;

        Status::Ok
    }
}
