//! Single-pass segment writer with deferred header patch-back.
//!
//! A segment's total size is unknown until all of its children have been
//! written, so `open` reserves header space at the current end-of-data and
//! `finish` seeks back to patch the final size, then restores the cursor.
//! Between calls the sink's cursor always sits at end-of-data; backward
//! seeks happen only inside `finish`.

use bytes::{BufMut, BytesMut};
use std::io::{Seek, SeekFrom, Write};
use trackmux_common::{ChunkTag, Error, Result};

use crate::chunk::{HEADER_LEN, SIZE_ESCAPE, WIDE_HEADER_LEN};

/// Handle to a segment opened on a [`SegmentWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentId(usize);

#[derive(Debug)]
struct SegmentState {
    tag: ChunkTag,
    header_offset: u64,
    header_len: u64,
    /// Raw bytes written to the body plus the encoded size of finished
    /// children, pad bytes included.
    body_len: u64,
    parent: Option<usize>,
    open_child: Option<usize>,
    finished: bool,
}

/// Streaming writer for nested, self-sizing segments.
///
/// The writer borrows the sink for its lifetime and never closes it. Only
/// the most recently opened segment at any depth may be written to; opening
/// the next sibling finishes a still-open previous sibling first, and
/// finishing a segment transitively finishes its open descendants. A sink
/// abandoned while [`SegmentWriter::open_segments`] is non-zero holds a
/// structurally invalid container.
pub struct SegmentWriter<W> {
    sink: W,
    segments: Vec<SegmentState>,
    /// Currently open top-level segment, if any.
    top_open: Option<usize>,
    /// Absolute end-of-data position.
    position: u64,
}

impl<W: Write + Seek> SegmentWriter<W> {
    /// Bind a writer to a sink. The sink's cursor must be at end-of-data.
    pub fn new(mut sink: W) -> Result<Self> {
        let position = sink.stream_position()?;
        Ok(Self {
            sink,
            segments: Vec::new(),
            top_open: None,
            position,
        })
    }

    /// Open a top-level segment, reserving its header at the current
    /// position. A still-open previous top-level segment is finished first.
    pub fn open(&mut self, tag: ChunkTag) -> Result<SegmentId> {
        self.open_at(None, tag, false)
    }

    /// Open a top-level segment with a wide (64-bit size) header, for
    /// segments expected to outgrow the 32-bit size field.
    pub fn open_wide(&mut self, tag: ChunkTag) -> Result<SegmentId> {
        self.open_at(None, tag, true)
    }

    /// Open a child segment under `parent`. The parent's previously opened
    /// child, if still open, is finished first.
    pub fn append_child(&mut self, parent: SegmentId, tag: ChunkTag) -> Result<SegmentId> {
        self.open_at(Some(parent.0), tag, false)
    }

    /// Open a wide child segment under `parent`.
    pub fn append_child_wide(&mut self, parent: SegmentId, tag: ChunkTag) -> Result<SegmentId> {
        self.open_at(Some(parent.0), tag, true)
    }

    fn open_at(&mut self, parent: Option<usize>, tag: ChunkTag, wide: bool) -> Result<SegmentId> {
        if let Some(p) = parent {
            let ps = &self.segments[p];
            if ps.finished {
                return Err(Error::structural(
                    ps.tag,
                    ps.header_offset,
                    "cannot open a child under a finished segment",
                ));
            }
        }

        // Siblings finish strictly in open order: a still-open previous
        // sibling is closed before the next one starts.
        let prev = match parent {
            Some(p) => self.segments[p].open_child,
            None => self.top_open,
        };
        if let Some(prev) = prev {
            if !self.segments[prev].finished {
                self.finish_index(prev)?;
            }
        }

        let header_len = if wide { WIDE_HEADER_LEN } else { HEADER_LEN };
        let header_offset = self.position;

        // Reserve header space; patched on finish.
        let reserved = [0u8; WIDE_HEADER_LEN as usize];
        self.sink.write_all(&reserved[..header_len as usize])?;
        self.position += header_len;

        let id = self.segments.len();
        self.segments.push(SegmentState {
            tag,
            header_offset,
            header_len,
            body_len: 0,
            parent,
            open_child: None,
            finished: false,
        });
        match parent {
            Some(p) => self.segments[p].open_child = Some(id),
            None => self.top_open = Some(id),
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(tag = %tag, offset = header_offset, wide, "segment opened");

        Ok(SegmentId(id))
    }

    /// Append bytes to the segment's body at the current end-of-data.
    pub fn write(&mut self, segment: SegmentId, bytes: &[u8]) -> Result<()> {
        let s = &self.segments[segment.0];
        if s.finished {
            return Err(Error::structural(
                s.tag,
                s.header_offset,
                "write to finished segment",
            ));
        }
        if let Some(child) = s.open_child {
            if !self.segments[child].finished {
                return Err(Error::structural(
                    s.tag,
                    s.header_offset,
                    "segment has an open child; only the most recently opened segment may be written",
                ));
            }
        }
        self.sink.write_all(bytes)?;
        self.segments[segment.0].body_len += bytes.len() as u64;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Finish a segment: close any open descendants, patch the header with
    /// the final size, and restore the cursor to end-of-data. Finishing an
    /// already-finished segment is a no-op.
    pub fn finish(&mut self, segment: SegmentId) -> Result<()> {
        self.finish_index(segment.0)
    }

    fn finish_index(&mut self, index: usize) -> Result<()> {
        if self.segments[index].finished {
            return Ok(());
        }
        if let Some(child) = self.segments[index].open_child {
            if !self.segments[child].finished {
                self.finish_index(child)?;
            }
        }

        let (tag, header_offset, header_len, body_len) = {
            let s = &self.segments[index];
            (s.tag, s.header_offset, s.header_len, s.body_len)
        };
        let size = header_len + body_len;

        // Reported before any bytes are patched: a half-patched header
        // would corrupt the file.
        if header_len == HEADER_LEN && size > u64::from(u32::MAX) {
            return Err(Error::capacity(tag, header_offset, size));
        }

        // Parity pad after odd bodies, excluded from the reported size.
        let pad = body_len & 1;
        if pad == 1 {
            self.sink.write_all(&[0u8])?;
            self.position += 1;
        }

        let mut header = BytesMut::with_capacity(header_len as usize);
        if header_len == WIDE_HEADER_LEN {
            header.put_u32(SIZE_ESCAPE);
            header.put_slice(tag.as_bytes());
            header.put_u64(size);
        } else {
            header.put_u32(size as u32);
            header.put_slice(tag.as_bytes());
        }
        self.sink.seek(SeekFrom::Start(header_offset))?;
        self.sink.write_all(&header)?;
        self.sink.seek(SeekFrom::Start(self.position))?;

        let parent = self.segments[index].parent;
        self.segments[index].finished = true;
        match parent {
            Some(p) => {
                self.segments[p].body_len += size + pad;
                self.segments[p].open_child = None;
            }
            None => self.top_open = None,
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(tag = %tag, offset = header_offset, size, "segment finished");

        Ok(())
    }

    /// Reported size of a segment so far: header plus body plus finished
    /// children.
    pub fn size(&self, segment: SegmentId) -> u64 {
        let s = &self.segments[segment.0];
        s.header_len + s.body_len
    }

    /// Whether the segment has been finished.
    pub fn is_finished(&self, segment: SegmentId) -> bool {
        self.segments[segment.0].finished
    }

    /// Number of segments still open. Must be zero before the sink is
    /// released, or the container is structurally invalid.
    pub fn open_segments(&self) -> usize {
        self.segments.iter().filter(|s| !s.finished).count()
    }

    /// Absolute end-of-data position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Release the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tag(t: &[u8; 4]) -> ChunkTag {
        ChunkTag(*t)
    }

    #[test]
    fn test_leaf_segment_layout() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let s = w.open(tag(b"abcd")).unwrap();
        w.write(s, b"test").unwrap();
        w.finish(s).unwrap();

        let bytes = w.into_inner().into_inner();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &12u32.to_be_bytes());
        assert_eq!(&bytes[4..8], b"abcd");
        assert_eq!(&bytes[8..12], b"test");
    }

    #[test]
    fn test_odd_body_gets_pad_byte_outside_reported_size() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let s = w.open(tag(b"abcd")).unwrap();
        w.write(s, b"xyz").unwrap();
        w.finish(s).unwrap();
        assert_eq!(w.size(s), 11);
        assert_eq!(w.position(), 12);

        let bytes = w.into_inner().into_inner();
        assert_eq!(&bytes[0..4], &11u32.to_be_bytes());
        assert_eq!(bytes[11], 0);
    }

    #[test]
    fn test_write_to_finished_segment_is_structural() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let s = w.open(tag(b"abcd")).unwrap();
        w.finish(s).unwrap();
        let err = w.write(s, b"late").unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
    }

    #[test]
    fn test_open_child_under_finished_parent_is_structural() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let p = w.open(tag(b"FORM")).unwrap();
        w.finish(p).unwrap();
        let err = w.append_child(p, tag(b"abcd")).unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
    }

    #[test]
    fn test_write_to_segment_with_open_child_is_structural() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let p = w.open(tag(b"FORM")).unwrap();
        let c = w.append_child(p, tag(b"abcd")).unwrap();
        let err = w.write(p, b"oops").unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
        w.write(c, b"ok").unwrap();
        w.finish(p).unwrap();
    }

    #[test]
    fn test_next_sibling_finishes_previous() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let p = w.open(tag(b"FORM")).unwrap();
        let a = w.append_child(p, tag(b"aaaa")).unwrap();
        w.write(a, b"12").unwrap();
        let _b = w.append_child(p, tag(b"bbbb")).unwrap();
        assert!(w.is_finished(a));
        assert_eq!(w.size(a), 10);
    }

    #[test]
    fn test_finish_root_transitively_finishes_descendants() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let root = w.open(tag(b"FORM")).unwrap();
        let list = w.append_child(root, tag(b"LIST")).unwrap();
        let leaf = w.append_child(list, tag(b"abcd")).unwrap();
        w.write(leaf, b"data").unwrap();
        w.finish(root).unwrap();
        assert!(w.is_finished(leaf));
        assert!(w.is_finished(list));
        assert_eq!(w.open_segments(), 0);
    }

    #[test]
    fn test_size_invariant_for_nested_tree() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let root = w.open(tag(b"ABCD")).unwrap();
        let a = w.append_child(root, tag(b"abcd")).unwrap();
        w.write(a, b"test").unwrap();
        w.finish(a).unwrap();
        let b = w.append_child(root, tag(b"efgh")).unwrap();
        w.finish(b).unwrap();
        w.finish(root).unwrap();

        // 8 + (8 + 4) + (8 + 0) per the header-inclusive size rule.
        assert_eq!(w.size(root), 28);
        assert_eq!(w.size(a), 12);
        assert_eq!(w.size(b), 8);
    }

    #[test]
    fn test_wide_header_layout() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let s = w.open_wide(tag(b"mdat")).unwrap();
        w.write(s, b"12345678").unwrap();
        w.finish(s).unwrap();

        let bytes = w.into_inner().into_inner();
        assert_eq!(&bytes[0..4], &SIZE_ESCAPE.to_be_bytes());
        assert_eq!(&bytes[4..8], b"mdat");
        assert_eq!(&bytes[8..16], &24u64.to_be_bytes());
        assert_eq!(&bytes[16..24], b"12345678");
    }

    #[test]
    fn test_capacity_error_before_patching() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let s = w.open(tag(b"mdat")).unwrap();
        // Simulate a body that outgrew the 32-bit field without writing 4 GiB.
        w.segments[s.0].body_len = u64::from(u32::MAX);
        let err = w.finish(s).unwrap_err();
        assert!(matches!(err, Error::Capacity { .. }));
        assert!(!w.is_finished(s));

        // The same body under a wide header finishes fine.
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let s = w.open_wide(tag(b"mdat")).unwrap();
        w.segments[s.0].body_len = u64::from(u32::MAX) + 1;
        w.finish(s).unwrap();
        assert_eq!(w.size(s), u64::from(u32::MAX) + 1 + WIDE_HEADER_LEN);
    }

    #[test]
    fn test_cursor_restored_after_finish() {
        let mut w = SegmentWriter::new(Cursor::new(Vec::new())).unwrap();
        let root = w.open(tag(b"FORM")).unwrap();
        let a = w.append_child(root, tag(b"aaaa")).unwrap();
        w.write(a, b"xx").unwrap();
        w.finish(a).unwrap();
        // Writes after a finish land at end-of-data, not inside the patch.
        let b = w.append_child(root, tag(b"bbbb")).unwrap();
        w.write(b, b"yy").unwrap();
        w.finish(root).unwrap();

        let bytes = w.into_inner().into_inner();
        assert_eq!(bytes.len() as u64, w_size_of(&bytes));
        assert_eq!(&bytes[16..18], b"xx");
        assert_eq!(&bytes[26..28], b"yy");
    }

    fn w_size_of(bytes: &[u8]) -> u64 {
        u64::from(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
