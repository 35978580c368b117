//! Trackmux-Container: self-sizing segment writer and visitor-driven chunk reader
//!
//! This crate implements the generic container skeleton shared by IFF-style
//! chunk trees, QuickTime-style atom trees, and RIFF-style chunk streams:
//! length-prefixed, four-character-tagged segments nested to arbitrary depth.
//!
//! # Modules
//!
//! - `chunk` - Chunk descriptors, group contexts, and the visitor contract
//! - `writer` - Single-pass segment writer with deferred header patch-back
//! - `reader` - Depth-first streaming parser driving a visitor
//!
//! # Architecture
//!
//! Writing is single-pass over a seekable sink. Opening a segment reserves
//! header space at the current end-of-data; children are written directly
//! after it. When a segment finishes, the writer seeks back to the reserved
//! header, patches the final size and tag, and restores the cursor. A
//! segment whose size exceeds the 32-bit field must be opened wide: its
//! 16-byte header holds an escape value in the size slot and a 64-bit size
//! after the tag.
//!
//! Reading walks the tree depth-first inside the declared bounds of each
//! group, handing leaf bodies to a [`ChunkVisitor`] and maintaining the
//! property/collection context each group inherits from its parent.

pub mod chunk;
pub mod reader;
pub mod writer;

pub use chunk::{
    Chunk, ChunkVisitor, GroupChunk, StoredChunk, HEADER_LEN, SIZE_ESCAPE, WIDE_HEADER_LEN,
};
pub use reader::{ChunkReader, DEFAULT_MAX_CHUNK_SIZE};
pub use writer::{SegmentId, SegmentWriter};
