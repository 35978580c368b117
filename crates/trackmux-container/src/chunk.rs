//! Chunk descriptors and the visitor contract for container traversal.

use std::collections::BTreeMap;
use trackmux_common::{ChunkTag, Result};

/// Normal segment header: 32-bit size plus four-byte tag.
pub const HEADER_LEN: u64 = 8;
/// Wide segment header: escape value, tag, then a 64-bit size.
pub const WIDE_HEADER_LEN: u64 = 16;
/// Reserved value in the 32-bit size slot signalling that a 64-bit size
/// follows the tag.
pub const SIZE_ESCAPE: u32 = 1;

/// Parsed chunk header.
///
/// Sizes are inclusive of the header: a leaf with a 4-byte body and a
/// normal header reports size 12.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Chunk {
    /// Chunk type code.
    pub tag: ChunkTag,
    /// Tag of the enclosing group, if any.
    pub group: Option<ChunkTag>,
    /// Declared size including the header.
    pub size: u64,
    /// Header length in bytes (8, or 16 for wide chunks).
    pub header_len: u8,
    /// Absolute byte position of the header in the source.
    pub scan: u64,
}

impl Chunk {
    /// Body size (declared size minus header).
    pub fn body_len(&self) -> u64 {
        self.size.saturating_sub(u64::from(self.header_len))
    }

    /// Whether this chunk used the wide (64-bit size) header.
    pub fn is_wide(&self) -> bool {
        u64::from(self.header_len) == WIDE_HEADER_LEN
    }
}

/// A leaf chunk retained in a group context: descriptor plus body bytes.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    /// Chunk descriptor.
    pub chunk: Chunk,
    /// Body bytes.
    pub data: Vec<u8>,
}

/// A composite chunk during traversal.
///
/// Each group accumulates the leaf chunks seen directly in its body as
/// *properties* (at most one per tag, last one wins) and as a *collection*
/// (ordered, repeating). A nested group starts with a copy of its parent's
/// contexts, so properties established in an outer group remain visible
/// inside inner groups until overridden.
#[derive(Debug, Clone)]
pub struct GroupChunk {
    chunk: Chunk,
    props: BTreeMap<ChunkTag, StoredChunk>,
    collection: Vec<StoredChunk>,
}

impl GroupChunk {
    pub(crate) fn new(chunk: Chunk) -> Self {
        Self {
            chunk,
            props: BTreeMap::new(),
            collection: Vec::new(),
        }
    }

    /// Open a nested group inheriting the parent's contexts by value.
    pub(crate) fn nested(chunk: Chunk, parent: &GroupChunk) -> Self {
        Self {
            chunk,
            props: parent.props.clone(),
            collection: parent.collection.clone(),
        }
    }

    pub(crate) fn record(&mut self, chunk: Chunk, data: Vec<u8>) {
        self.props.insert(
            chunk.tag,
            StoredChunk {
                chunk,
                data: data.clone(),
            },
        );
        self.collection.push(StoredChunk { chunk, data });
    }

    /// Descriptor of the group chunk itself.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// The group's tag.
    pub fn tag(&self) -> ChunkTag {
        self.chunk.tag
    }

    /// Latest property chunk stored under `tag`, if any.
    pub fn property(&self, tag: ChunkTag) -> Option<&StoredChunk> {
        self.props.get(&tag)
    }

    /// All collection chunks with the given tag, in scan order.
    pub fn collection(&self, tag: ChunkTag) -> impl Iterator<Item = &StoredChunk> {
        self.collection.iter().filter(move |s| s.chunk.tag == tag)
    }

    /// Every leaf chunk seen in this group's context, in scan order.
    pub fn chunks(&self) -> &[StoredChunk] {
        &self.collection
    }
}

/// Callbacks invoked by [`crate::ChunkReader::parse`] during a depth-first
/// walk.
///
/// Any callback may return [`trackmux_common::Error::Aborted`] to unwind
/// the traversal immediately; no further callbacks fire and the reader
/// treats the walk as cleanly terminated.
pub trait ChunkVisitor {
    /// Called when a composite chunk header has been parsed, before its body
    /// is traversed. The group's contexts are still empty at this point.
    fn enter_group(&mut self, group: &GroupChunk) -> Result<()> {
        let _ = group;
        Ok(())
    }

    /// Called for each leaf chunk after its body has been read into memory.
    fn visit_chunk(
        &mut self,
        parent: Option<&GroupChunk>,
        chunk: &Chunk,
        data: &[u8],
    ) -> Result<()>;

    /// Called after a composite chunk's body has been fully traversed, with
    /// its property and collection contexts populated.
    fn leave_group(&mut self, group: &GroupChunk) -> Result<()> {
        let _ = group;
        Ok(())
    }
}
