//! The unit of data interchange between pipeline stages.

use trackmux_common::Rational;

use super::Format;

/// Independent boolean markers carried by a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferFlags(u8);

impl BufferFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The buffer must be dropped by downstream stages.
    pub const DISCARD: Self = Self(1);
    /// The sample is decodable without prior context.
    pub const KEYFRAME: Self = Self(1 << 1);
    /// No further buffers follow on this stream.
    pub const END_OF_MEDIA: Self = Self(1 << 2);

    /// Whether all flags in `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the flags in `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the flags in `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for BufferFlags {
    type Output = BufferFlags;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One sample (or a run of samples) moving through the pipeline.
///
/// Buffers are reused by callers across stages; a stage must not assume
/// ownership beyond the `process` call it is handed the buffer in. The
/// payload is opaque to the engine; `offset` and `length` delimit the
/// valid region.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    /// Format of the payload.
    pub format: Format,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Start of the valid region within the payload.
    pub offset: usize,
    /// Length of the valid region.
    pub length: usize,
    /// Number of samples in the valid region.
    pub sample_count: u32,
    /// Duration of a single sample.
    pub duration: Rational,
    /// Absolute timestamp of the first sample.
    pub timestamp: Rational,
    /// Flag markers.
    pub flags: BufferFlags,
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer owning `payload`, valid over its full length.
    pub fn with_payload(payload: Vec<u8>) -> Self {
        let length = payload.len();
        Self {
            payload,
            length,
            ..Self::default()
        }
    }

    /// The valid payload region.
    pub fn data(&self) -> &[u8] {
        &self.payload[self.offset..self.offset + self.length]
    }

    /// Total time covered: `duration × sample_count`.
    pub fn span(&self) -> Rational {
        self.duration * i64::from(self.sample_count)
    }

    /// Timestamp just past the last sample.
    pub fn end_time(&self) -> Rational {
        self.timestamp + self.span()
    }

    /// Whether the DISCARD flag is set.
    pub fn is_discarded(&self) -> bool {
        self.flags.contains(BufferFlags::DISCARD)
    }

    /// Set the DISCARD flag.
    pub fn mark_discard(&mut self) {
        self.flags.insert(BufferFlags::DISCARD);
    }

    /// Copy format, timing, and flags from another buffer, leaving the
    /// payload untouched.
    pub fn copy_metadata_from(&mut self, other: &Buffer) {
        self.format = other.format.clone();
        self.sample_count = other.sample_count;
        self.duration = other.duration;
        self.timestamp = other.timestamp;
        self.flags = other.flags;
    }

    /// Copy everything from another buffer, reusing this buffer's payload
    /// allocation where possible.
    pub fn assign_from(&mut self, other: &Buffer) {
        self.payload.clone_from(&other.payload);
        self.offset = other.offset;
        self.length = other.length;
        self.copy_metadata_from(other);
    }
}
