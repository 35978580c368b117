//! Window filters: trim to a time window, re-stamp to contiguous time.

use trackmux_common::Rational;

use super::{Buffer, Codec, Status};

/// Discards or truncates buffers outside a half-open `[start, end)` time
/// window.
///
/// Buffers entirely outside the window are passed through with DISCARD
/// set. A buffer straddling a boundary has whole leading or trailing
/// samples cut, clamped so partial trimming never empties it; full
/// removal happens only via the DISCARD path.
pub struct TrimFilter {
    start: Option<Rational>,
    end: Option<Rational>,
}

impl TrimFilter {
    /// Create a trim filter. `None` leaves that side of the window open.
    pub fn new(start: Option<Rational>, end: Option<Rational>) -> Self {
        Self { start, end }
    }
}

fn clamp_cut(cut: i64, sample_count: u32) -> u32 {
    cut.clamp(0, i64::from(sample_count) - 1) as u32
}

impl Codec for TrimFilter {
    fn process(&mut self, input: &Buffer, output: &mut Buffer) -> Status {
        output.assign_from(input);
        if input.is_discarded() {
            return Status::Ok;
        }

        if let Some(start) = self.start {
            if output.end_time() <= start {
                output.mark_discard();
                return Status::Ok;
            }
        }
        if let Some(end) = self.end {
            if output.timestamp >= end {
                output.mark_discard();
                return Status::Ok;
            }
        }
        if output.sample_count == 0 || !output.duration.is_positive() {
            return Status::Ok;
        }

        let sample_size = output.length / output.sample_count as usize;

        if let Some(start) = self.start {
            if output.timestamp < start {
                let delta = start - output.timestamp;
                let cut = clamp_cut((delta / output.duration).floor(), output.sample_count);
                output.offset += cut as usize * sample_size;
                output.length -= cut as usize * sample_size;
                output.sample_count -= cut;
                output.timestamp = start;
            }
        }
        if let Some(end) = self.end {
            if output.end_time() > end {
                let delta = output.end_time() - end;
                let cut = clamp_cut((delta / output.duration).floor(), output.sample_count);
                output.length -= cut as usize * sample_size;
                output.sample_count -= cut;
            }
        }

        Status::Ok
    }
}

/// Re-stamps passing buffers with a monotonically advancing media time,
/// producing gap-free timestamps after upstream discards.
#[derive(Default)]
pub struct AdjustFilter {
    media_time: Rational,
}

impl AdjustFilter {
    /// Create an adjust filter starting at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next timestamp to be assigned.
    pub fn media_time(&self) -> Rational {
        self.media_time
    }
}

impl Codec for AdjustFilter {
    fn process(&mut self, input: &Buffer, output: &mut Buffer) -> Status {
        output.assign_from(input);
        if input.is_discarded() {
            return Status::Ok;
        }
        output.timestamp = self.media_time;
        self.media_time = self.media_time + output.span();
        Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn second_buffer(timestamp: i64) -> Buffer {
        let mut buf = Buffer::with_payload(vec![0u8; 64]);
        buf.sample_count = 1;
        buf.duration = Rational::new(1, 1);
        buf.timestamp = Rational::new(timestamp, 1);
        buf
    }

    #[test]
    fn test_trim_window_over_four_buffers() {
        // Window [1.5, 3.5) over [0,1) [1,2) [2,3) [3,4).
        let mut trim = TrimFilter::new(
            Some(Rational::new(3, 2)),
            Some(Rational::new(7, 2)),
        );
        let mut out = Buffer::new();

        let _ = trim.process(&second_buffer(0), &mut out);
        assert!(out.is_discarded());

        // [1,2) overlaps the window start: retained, clamped to [1.5, 2).
        let _ = trim.process(&second_buffer(1), &mut out);
        assert!(!out.is_discarded());
        assert_eq!(out.timestamp, Rational::new(3, 2));
        assert_eq!(out.sample_count, 1);

        let _ = trim.process(&second_buffer(2), &mut out);
        assert!(!out.is_discarded());
        assert_eq!(out.timestamp, Rational::new(2, 1));
        assert_eq!(out.sample_count, 1);

        // [3,4) overlaps the window end: retained.
        let _ = trim.process(&second_buffer(3), &mut out);
        assert!(!out.is_discarded());
        assert_eq!(out.timestamp, Rational::new(3, 1));

        let _ = trim.process(&second_buffer(4), &mut out);
        assert!(out.is_discarded());
    }

    #[test]
    fn test_trim_cuts_whole_samples_at_audio_granularity() {
        // 1000 samples covering [1, 2) at 1 ms per sample, 2 bytes each.
        let mut buf = Buffer::with_payload(vec![0u8; 2000]);
        buf.sample_count = 1000;
        buf.duration = Rational::new(1, 1000);
        buf.timestamp = Rational::new(1, 1);

        let mut trim = TrimFilter::new(
            Some(Rational::new(3, 2)),
            Some(Rational::new(19, 10)),
        );
        let mut out = Buffer::new();
        let _ = trim.process(&buf, &mut out);

        assert!(!out.is_discarded());
        // 500 leading samples cut, 100 trailing samples cut.
        assert_eq!(out.sample_count, 400);
        assert_eq!(out.offset, 1000);
        assert_eq!(out.length, 800);
        assert_eq!(out.timestamp, Rational::new(3, 2));
        assert_eq!(out.end_time(), Rational::new(19, 10));
    }

    #[test]
    fn test_trim_never_empties_a_straddling_buffer() {
        // A single sample wider than the whole window.
        let mut buf = Buffer::with_payload(vec![0u8; 8]);
        buf.sample_count = 1;
        buf.duration = Rational::new(10, 1);
        buf.timestamp = Rational::ZERO;

        let mut trim = TrimFilter::new(
            Some(Rational::new(4, 1)),
            Some(Rational::new(5, 1)),
        );
        let mut out = Buffer::new();
        let _ = trim.process(&buf, &mut out);
        assert!(!out.is_discarded());
        assert_eq!(out.sample_count, 1);
        assert_eq!(out.length, 8);
    }

    #[test]
    fn test_trim_propagates_discard_untouched() {
        let mut buf = second_buffer(10);
        buf.mark_discard();
        let mut trim = TrimFilter::new(Some(Rational::ZERO), Some(Rational::new(1, 1)));
        let mut out = Buffer::new();
        let status = trim.process(&buf, &mut out);
        assert!(status.is_ok());
        assert!(out.is_discarded());
        assert_eq!(out.timestamp, Rational::new(10, 1));
    }

    #[test]
    fn test_adjust_restamps_contiguously_across_discards() {
        let mut adjust = AdjustFilter::new();
        let mut out = Buffer::new();

        let _ = adjust.process(&second_buffer(7), &mut out);
        assert_eq!(out.timestamp, Rational::ZERO);

        // A discarded buffer does not advance media time.
        let mut dropped = second_buffer(8);
        dropped.mark_discard();
        let _ = adjust.process(&dropped, &mut out);
        assert_eq!(adjust.media_time(), Rational::new(1, 1));

        let _ = adjust.process(&second_buffer(42), &mut out);
        assert_eq!(out.timestamp, Rational::new(1, 1));
        assert_eq!(adjust.media_time(), Rational::new(2, 1));
    }
}
