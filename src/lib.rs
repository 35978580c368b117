//! Trackmux - chunked media-container engine
//!
//! This library crate exposes the sample pipeline and the diagnostic sift
//! visitor; the container writer/reader and shared leaf types live in the
//! `trackmux-container` and `trackmux-common` crates and are re-exported
//! here for convenience.

pub mod pipeline;
pub mod sift;

pub use trackmux_common::{ChunkTag, Error, Rational, Result};
pub use trackmux_container::{Chunk, ChunkReader, ChunkVisitor, GroupChunk, SegmentWriter};
