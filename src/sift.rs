//! Diagnostic visitors over the chunk reader.
//!
//! The "sift" listing prints one line per chunk, `tag size scan-offset`,
//! with one leading dot per nesting depth. The other visitors here back
//! the CLI's JSON listing and its extract/insert glue.

use std::io::Write;

use trackmux_common::{Error, Result};
use trackmux_container::{Chunk, ChunkVisitor, GroupChunk};

/// Prints `tag size scan-offset` per chunk, dotted by nesting depth.
pub struct SiftVisitor<W> {
    out: W,
    depth: usize,
    hex: bool,
}

impl<W: Write> SiftVisitor<W> {
    /// Create a sift printer over a writer (typically stdout).
    pub fn new(out: W) -> Self {
        Self {
            out,
            depth: 0,
            hex: false,
        }
    }

    /// Also hex-dump leaf chunk bodies under each line.
    pub fn with_hex(mut self, hex: bool) -> Self {
        self.hex = hex;
        self
    }

    fn line(&mut self, chunk: &Chunk) -> Result<()> {
        writeln!(
            self.out,
            "{}{} {} {}",
            ".".repeat(self.depth),
            chunk.tag,
            chunk.size,
            chunk.scan
        )?;
        Ok(())
    }

    fn dump(&mut self, data: &[u8]) -> Result<()> {
        for row in data.chunks(16) {
            let hex: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
            let ascii: String = row
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                .collect();
            writeln!(self.out, "{}  {:<47} {}", ".".repeat(self.depth), hex.join(" "), ascii)?;
        }
        Ok(())
    }
}

impl<W: Write> ChunkVisitor for SiftVisitor<W> {
    fn enter_group(&mut self, group: &GroupChunk) -> Result<()> {
        self.line(group.chunk())?;
        self.depth += 1;
        Ok(())
    }

    fn visit_chunk(
        &mut self,
        _parent: Option<&GroupChunk>,
        chunk: &Chunk,
        data: &[u8],
    ) -> Result<()> {
        self.line(chunk)?;
        if self.hex {
            self.dump(data)?;
        }
        Ok(())
    }

    fn leave_group(&mut self, _group: &GroupChunk) -> Result<()> {
        self.depth -= 1;
        Ok(())
    }
}

/// One chunk row in a JSON listing.
#[derive(Debug, serde::Serialize)]
pub struct ChunkRecord {
    /// Chunk tag.
    pub tag: String,
    /// Declared size including the header.
    pub size: u64,
    /// Absolute header offset.
    pub scan: u64,
    /// Nesting depth, zero at top level.
    pub depth: usize,
    /// Enclosing group's tag, if any.
    pub group: Option<String>,
}

impl ChunkRecord {
    fn from_chunk(chunk: &Chunk, depth: usize) -> Self {
        Self {
            tag: chunk.tag.to_string(),
            size: chunk.size,
            scan: chunk.scan,
            depth,
            group: chunk.group.map(|t| t.to_string()),
        }
    }
}

/// Collects every chunk into flat records for JSON output.
#[derive(Default)]
pub struct CollectVisitor {
    records: Vec<ChunkRecord>,
    depth: usize,
}

impl CollectVisitor {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the collector, returning the records in scan order.
    pub fn into_records(self) -> Vec<ChunkRecord> {
        self.records
    }
}

impl ChunkVisitor for CollectVisitor {
    fn enter_group(&mut self, group: &GroupChunk) -> Result<()> {
        self.records
            .push(ChunkRecord::from_chunk(group.chunk(), self.depth));
        self.depth += 1;
        Ok(())
    }

    fn visit_chunk(
        &mut self,
        _parent: Option<&GroupChunk>,
        chunk: &Chunk,
        _data: &[u8],
    ) -> Result<()> {
        self.records.push(ChunkRecord::from_chunk(chunk, self.depth));
        Ok(())
    }

    fn leave_group(&mut self, _group: &GroupChunk) -> Result<()> {
        self.depth -= 1;
        Ok(())
    }
}

/// Finds the chunk at a given scan-order index, aborting the walk once it
/// is found.
pub struct LocateVisitor {
    target: usize,
    seen: usize,
    found: Option<Chunk>,
}

impl LocateVisitor {
    /// Locate the `target`-th chunk (zero-based), counting groups and
    /// leaves alike in scan order.
    pub fn new(target: usize) -> Self {
        Self {
            target,
            seen: 0,
            found: None,
        }
    }

    /// The located chunk, if the index was in range.
    pub fn found(&self) -> Option<&Chunk> {
        self.found.as_ref()
    }

    fn check(&mut self, chunk: &Chunk) -> Result<()> {
        if self.seen == self.target {
            self.found = Some(*chunk);
            return Err(Error::Aborted);
        }
        self.seen += 1;
        Ok(())
    }
}

impl ChunkVisitor for LocateVisitor {
    fn enter_group(&mut self, group: &GroupChunk) -> Result<()> {
        self.check(group.chunk())
    }

    fn visit_chunk(
        &mut self,
        _parent: Option<&GroupChunk>,
        chunk: &Chunk,
        _data: &[u8],
    ) -> Result<()> {
        self.check(chunk)
    }
}

/// Records the top-level chunk sequence, skipping nested content.
#[derive(Default)]
pub struct TopLevelVisitor {
    chunks: Vec<Chunk>,
    depth: usize,
}

impl TopLevelVisitor {
    /// Create an empty top-level listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the visitor, returning top-level chunks in scan order.
    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }
}

impl ChunkVisitor for TopLevelVisitor {
    fn enter_group(&mut self, group: &GroupChunk) -> Result<()> {
        if self.depth == 0 {
            self.chunks.push(*group.chunk());
        }
        self.depth += 1;
        Ok(())
    }

    fn visit_chunk(
        &mut self,
        _parent: Option<&GroupChunk>,
        chunk: &Chunk,
        _data: &[u8],
    ) -> Result<()> {
        if self.depth == 0 {
            self.chunks.push(*chunk);
        }
        Ok(())
    }

    fn leave_group(&mut self, _group: &GroupChunk) -> Result<()> {
        self.depth -= 1;
        Ok(())
    }
}
