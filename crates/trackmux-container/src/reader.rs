//! Depth-first, visitor-driven chunk reader.

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};
use trackmux_common::{ChunkTag, Error, Result};

use crate::chunk::{Chunk, ChunkVisitor, GroupChunk, HEADER_LEN, SIZE_ESCAPE, WIDE_HEADER_LEN};

/// Maximum allowed leaf chunk body (64 MB) to prevent OOM on malformed
/// files.
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 64 * 1024 * 1024;

/// Streaming parser for nested chunk containers.
///
/// The reader walks the source depth-first within the declared bounds of
/// each composite chunk, reading each leaf body eagerly and handing it to a
/// [`ChunkVisitor`]. Composite chunks are recognized by tag; the default
/// set covers the common IFF/RIFF group tags and callers register
/// additional ones with [`ChunkReader::with_group_tag`].
pub struct ChunkReader<R> {
    source: R,
    len: u64,
    group_tags: HashSet<ChunkTag>,
    max_chunk_size: u64,
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Bind a reader to a source, scanning from its start to its end.
    pub fn new(mut source: R) -> Result<Self> {
        let len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        let group_tags = HashSet::from([
            ChunkTag::FORM,
            ChunkTag::LIST,
            ChunkTag::CAT,
            ChunkTag::PROP,
            ChunkTag::RIFF,
        ]);
        Ok(Self {
            source,
            len,
            group_tags,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        })
    }

    /// Treat `tag` as a composite chunk during traversal.
    pub fn with_group_tag(mut self, tag: ChunkTag) -> Self {
        self.group_tags.insert(tag);
        self
    }

    /// Override the leaf body size cap.
    pub fn with_max_chunk_size(mut self, max: u64) -> Self {
        self.max_chunk_size = max;
        self
    }

    /// Release the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Walk the container depth-first, invoking the visitor's callbacks.
    ///
    /// A visitor returning [`Error::Aborted`] unwinds the traversal
    /// immediately; the walk is treated as cleanly terminated and `parse`
    /// returns `Ok`.
    pub fn parse<V: ChunkVisitor>(&mut self, visitor: &mut V) -> Result<()> {
        let end = self.len;
        match self.walk(visitor, 0, end, None) {
            Err(Error::Aborted) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("traversal aborted by visitor");
                Ok(())
            }
            other => other,
        }
    }

    fn walk<V: ChunkVisitor>(
        &mut self,
        visitor: &mut V,
        start: u64,
        end: u64,
        mut parent: Option<&mut GroupChunk>,
    ) -> Result<()> {
        let mut pos = start;
        while pos < end {
            let enclosing = parent.as_deref().map(|g| g.tag());
            let remaining = end - pos;
            if remaining < HEADER_LEN {
                return Err(Error::structural(
                    enclosing.unwrap_or(ChunkTag(*b"????")),
                    pos,
                    format!("{} trailing bytes are too short for a chunk header", remaining),
                ));
            }

            self.source.seek(SeekFrom::Start(pos))?;
            let mut header = [0u8; 8];
            self.source.read_exact(&mut header)?;
            let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
            let tag = ChunkTag([header[4], header[5], header[6], header[7]]);

            let (size, header_len) = if size32 == SIZE_ESCAPE {
                if remaining < WIDE_HEADER_LEN {
                    return Err(Error::structural(
                        tag,
                        pos,
                        "truncated wide header",
                    ));
                }
                let mut ext = [0u8; 8];
                self.source.read_exact(&mut ext)?;
                (u64::from_be_bytes(ext), WIDE_HEADER_LEN)
            } else {
                (u64::from(size32), HEADER_LEN)
            };

            if size < header_len {
                return Err(Error::structural(
                    tag,
                    pos,
                    format!("declared size {} is smaller than its header", size),
                ));
            }
            if size > remaining {
                return Err(Error::structural(
                    tag,
                    pos,
                    format!(
                        "declared size {} exceeds enclosing bounds ({} bytes remain)",
                        size, remaining
                    ),
                ));
            }

            let chunk = Chunk {
                tag,
                group: enclosing,
                size,
                header_len: header_len as u8,
                scan: pos,
            };
            let body_start = pos + header_len;
            let body_len = size - header_len;

            if self.group_tags.contains(&tag) {
                let mut group = match parent.as_deref() {
                    Some(p) => GroupChunk::nested(chunk, p),
                    None => GroupChunk::new(chunk),
                };
                visitor.enter_group(&group)?;
                self.walk(visitor, body_start, body_start + body_len, Some(&mut group))?;
                visitor.leave_group(&group)?;
            } else {
                if body_len > self.max_chunk_size {
                    return Err(Error::structural(
                        tag,
                        pos,
                        format!(
                            "body size {} exceeds maximum {}",
                            body_len, self.max_chunk_size
                        ),
                    ));
                }
                let mut data = vec![0u8; body_len as usize];
                self.source.read_exact(&mut data)?;
                visitor.visit_chunk(parent.as_deref(), &chunk, &data)?;
                if let Some(p) = parent.as_deref_mut() {
                    p.record(chunk, data);
                }
            }

            // Parity pad after odd bodies, not counted in the declared size.
            let mut advance = size;
            if body_len % 2 == 1 && pos + size < end {
                advance += 1;
            }
            pos += advance;
        }
        Ok(())
    }
}
