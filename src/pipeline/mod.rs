//! Sample pipeline: buffers, formats, and the codec stage contract.
//!
//! A pipeline is a chain of [`Codec`] stages through which [`Buffer`]s
//! flow: application → window filters → time-base reconciler → container
//! writer. Stages carry their accumulators as explicit fields; there is no
//! global state and no internal threading, so each `process` call runs to
//! completion on the caller's thread.

mod buffer;
mod format;
mod mux;
mod window;

pub use buffer::{Buffer, BufferFlags};
pub use format::{Format, FormatKey, FormatValue};
pub use mux::TimeBaseMux;
pub use window::{AdjustFilter, TrimFilter};

/// Outcome of a codec stage's `process` call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The output buffer is valid (possibly carrying DISCARD).
    Ok,
    /// The output buffer is unusable; the caller must set DISCARD on it
    /// before forwarding.
    Failed,
}

impl Status {
    /// Whether processing succeeded.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// A processing stage: decoder, filter, or multiplexer.
///
/// Contract: a stage copies the metadata it does not change from `input`
/// to `output`; an input carrying DISCARD is propagated unchanged with no
/// further work; otherwise the stage performs its transformation and sets
/// `output`'s format. Handing the same input twice must produce the same
/// effect twice: accumulators are explicit fields, never hidden state.
pub trait Codec {
    /// Process one buffer. `input` is borrowed only for this call; the
    /// caller may reuse both buffers afterwards.
    fn process(&mut self, input: &Buffer, output: &mut Buffer) -> Status;
}
