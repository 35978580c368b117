//! Four-character chunk type codes.

use std::fmt;
use std::str::FromStr;

/// Four-character chunk type code.
///
/// Tags are raw bytes, not guaranteed UTF-8; `as_str` falls back to `????`
/// for display when a tag is not printable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    /// IFF composite chunk.
    pub const FORM: Self = Self(*b"FORM");
    /// IFF/RIFF list of chunks.
    pub const LIST: Self = Self(*b"LIST");
    /// IFF concatenation group.
    pub const CAT: Self = Self(*b"CAT ");
    /// IFF shared-properties group.
    pub const PROP: Self = Self(*b"PROP");
    /// RIFF outer container.
    pub const RIFF: Self = Self(*b"RIFF");
    /// Filler chunk.
    pub const JUNK: Self = Self(*b"JUNK");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Raw tag bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChunkTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 {
            return Err(format!("Invalid chunk tag '{}': must be 4 bytes", s));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for ChunkTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serialize")]
impl<'de> serde::Deserialize<'de> for ChunkTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ChunkTag::FORM.to_string(), "FORM");
        assert_eq!(ChunkTag::CAT.to_string(), "CAT ");
        assert_eq!(ChunkTag([0xff, 0x00, 0x01, 0x02]).to_string(), "????");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("FORM".parse::<ChunkTag>().unwrap(), ChunkTag::FORM);
        assert_eq!("abcd".parse::<ChunkTag>().unwrap(), ChunkTag(*b"abcd"));
        assert!("abc".parse::<ChunkTag>().is_err());
        assert!("abcde".parse::<ChunkTag>().is_err());
    }

    #[test]
    fn test_roundtrip_bytes() {
        let tag = ChunkTag::from_bytes(*b"mvhd");
        assert_eq!(tag.as_bytes(), b"mvhd");
    }
}
