//! Partially-specified media formats and their composition algebra.
//!
//! A `Format` is an immutable key→value map: an encoding id, frame
//! dimensions, a sample rate, whatever a stage knows about its data.
//! Formats compose with three operations instead of subclassing:
//! `intersect` keeps only what two formats agree on, `prepend` fills gaps
//! from another format, `append` overrides with another format's values.

use std::collections::BTreeMap;
use trackmux_common::Rational;

/// Keys a format may specify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatKey {
    /// Encoding identifier (e.g. "raw", "jpeg").
    Encoding,
    /// Frame width in pixels.
    Width,
    /// Frame height in pixels.
    Height,
    /// Frames per second.
    FrameRate,
    /// Audio sample rate in Hz.
    SampleRate,
    /// Audio channel count.
    Channels,
    /// Bits per audio sample.
    SampleBits,
}

/// A value under a format key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatValue {
    /// Integer-valued entry (dimensions, rates, counts).
    Int(i64),
    /// Text-valued entry (encoding ids).
    Text(String),
    /// Exact-fraction entry (frame rates like 30000/1001).
    Fraction(Rational),
}

impl From<i64> for FormatValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FormatValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Rational> for FormatValue {
    fn from(value: Rational) -> Self {
        Self::Fraction(value)
    }
}

/// An immutable, partially-specified key→value format description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Format {
    entries: BTreeMap<FormatKey, FormatValue>,
}

impl Format {
    /// Create an empty (fully unspecified) format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style entry insertion.
    pub fn with(mut self, key: FormatKey, value: impl Into<FormatValue>) -> Self {
        self.entries.insert(key, value.into());
        self
    }

    /// Look up a key.
    pub fn get(&self, key: FormatKey) -> Option<&FormatValue> {
        self.entries.get(&key)
    }

    /// Integer value under a key, if present and integer-valued.
    pub fn int(&self, key: FormatKey) -> Option<i64> {
        match self.entries.get(&key) {
            Some(FormatValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Number of specified keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is specified.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the entries both formats agree on.
    pub fn intersect(&self, other: &Format) -> Format {
        let entries = self
            .entries
            .iter()
            .filter(|(k, v)| other.entries.get(k) == Some(v))
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        Format { entries }
    }

    /// Fill in missing keys from `other` without overriding existing ones.
    pub fn prepend(&self, other: &Format) -> Format {
        let mut entries = other.entries.clone();
        entries.extend(self.entries.iter().map(|(k, v)| (*k, v.clone())));
        Format { entries }
    }

    /// Merge `other` in, overriding existing keys with its values.
    pub fn append(&self, other: &Format) -> Format {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (*k, v.clone())));
        Format { entries }
    }
}
