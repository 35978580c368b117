//! Pipeline integration: window filters feeding the time-base reconciler.

use trackmux::pipeline::{
    AdjustFilter, Buffer, BufferFlags, Codec, Format, FormatKey, FormatValue, Status, TimeBaseMux,
    TrimFilter,
};
use trackmux::Rational;

fn source_buffer(second: i64) -> Buffer {
    let mut buf = Buffer::with_payload(vec![second as u8; 32]);
    buf.format = Format::new().with(FormatKey::Encoding, "raw");
    buf.sample_count = 1;
    buf.duration = Rational::new(1, 1);
    buf.timestamp = Rational::new(second, 1);
    buf
}

/// Run one buffer through trim → adjust → mux, honoring the stage contract
/// (a FAILED output gets DISCARD before forwarding).
fn run_chain(
    trim: &mut TrimFilter,
    adjust: &mut AdjustFilter,
    mux: &mut TimeBaseMux,
    input: &Buffer,
) -> Buffer {
    let mut trimmed = Buffer::new();
    if !trim.process(input, &mut trimmed).is_ok() {
        trimmed.mark_discard();
    }
    let mut adjusted = Buffer::new();
    if !adjust.process(&trimmed, &mut adjusted).is_ok() {
        adjusted.mark_discard();
    }
    let mut out = Buffer::new();
    if !mux.process(&adjusted, &mut out).is_ok() {
        out.mark_discard();
    }
    out
}

#[test]
fn trim_adjust_mux_chain_produces_contiguous_ticks() {
    // Ten one-second buffers, keep [2, 7): five seconds survive, re-stamped
    // from zero, emitted as exact 30-tick runs.
    let mut trim = TrimFilter::new(Some(Rational::new(2, 1)), Some(Rational::new(7, 1)));
    let mut adjust = AdjustFilter::new();
    let mut mux = TimeBaseMux::new(30);

    let mut emitted = 0;
    for second in 0..10 {
        let out = run_chain(&mut trim, &mut adjust, &mut mux, &source_buffer(second));
        if !out.is_discarded() {
            emitted += 1;
            assert_eq!(out.duration, Rational::new(1, 1));
        }
    }

    assert_eq!(emitted, 5);
    assert_eq!(mux.input_time(), Rational::new(5, 1));
    assert_eq!(mux.output_time(), Rational::new(5, 1));
    assert_eq!(adjust.media_time(), Rational::new(5, 1));
}

#[test]
fn discarded_buffers_flow_through_without_side_effects() {
    let mut trim = TrimFilter::new(Some(Rational::ZERO), None);
    let mut adjust = AdjustFilter::new();
    let mut mux = TimeBaseMux::new(30);

    let mut input = source_buffer(0);
    input.flags.insert(BufferFlags::DISCARD);
    let out = run_chain(&mut trim, &mut adjust, &mut mux, &input);

    assert!(out.is_discarded());
    assert_eq!(adjust.media_time(), Rational::ZERO);
    assert_eq!(mux.input_time(), Rational::ZERO);
}

#[test]
fn failed_stage_output_is_discarded_by_the_caller() {
    /// A stage whose transformation always fails.
    struct BrokenCodec;
    impl Codec for BrokenCodec {
        fn process(&mut self, input: &Buffer, output: &mut Buffer) -> Status {
            output.copy_metadata_from(input);
            Status::Failed
        }
    }

    let mut broken = BrokenCodec;
    let mut mux = TimeBaseMux::new(30);

    let input = source_buffer(0);
    let mut mid = Buffer::new();
    if !broken.process(&input, &mut mid).is_ok() {
        mid.mark_discard();
    }
    let mut out = Buffer::new();
    let status = mux.process(&mid, &mut out);

    assert!(status.is_ok());
    assert!(out.is_discarded());
    assert_eq!(mux.input_time(), Rational::ZERO);
}

#[test]
fn keyframe_flag_survives_the_chain() {
    let mut trim = TrimFilter::new(None, None);
    let mut adjust = AdjustFilter::new();
    let mut mux = TimeBaseMux::new(30);

    let mut input = source_buffer(0);
    input.flags.insert(BufferFlags::KEYFRAME);
    let out = run_chain(&mut trim, &mut adjust, &mut mux, &input);

    assert!(out.flags.contains(BufferFlags::KEYFRAME));
    assert!(!out.is_discarded());
}

#[test]
fn formats_compose_across_stages() {
    // A decoder knows the encoding; a later stage fills in dimensions
    // without clobbering what upstream established.
    let decoded = Format::new().with(FormatKey::Encoding, "raw");
    let probed = Format::new()
        .with(FormatKey::Width, 640)
        .with(FormatKey::Height, 480)
        .with(FormatKey::Encoding, "unknown");

    let combined = decoded.prepend(&probed);
    assert_eq!(combined.int(FormatKey::Width), Some(640));
    assert_eq!(
        combined.get(FormatKey::Encoding),
        Some(&FormatValue::Text("raw".to_string()))
    );
}
