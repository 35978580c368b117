//! Common error types used throughout trackmux.
//!
//! Three failure classes matter to the engine: structural errors (the
//! container is provably invalid), capacity errors (a segment outgrew its
//! 32-bit size field with no wide header reserved), and visitor aborts
//! (clean early termination of a traversal, not a failure).

use crate::tag::ChunkTag;
use std::io;

/// Common error type for trackmux.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation on the sink or source failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The container is structurally invalid: a declared size contradicts
    /// the enclosing bounds, or a finished segment was written to. Fatal to
    /// the current parse or write, never silently recovered.
    #[error("Structural error in segment '{tag}' at offset {offset}: {reason}")]
    Structural {
        tag: ChunkTag,
        offset: u64,
        reason: String,
    },

    /// A segment's final size exceeds its 32-bit size field and no wide
    /// header was reserved. Raised before any header bytes are patched.
    #[error("Segment '{tag}' at offset {offset} is {size} bytes, exceeding the 32-bit size field")]
    Capacity {
        tag: ChunkTag,
        offset: u64,
        size: u64,
    },

    /// A visitor requested cancellation. Clean early termination, not a
    /// failure; the traversal unwinds without further callbacks.
    #[error("Traversal aborted by visitor")]
    Aborted,

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new Structural error.
    pub fn structural<S: Into<String>>(tag: ChunkTag, offset: u64, reason: S) -> Self {
        Self::Structural {
            tag,
            offset,
            reason: reason.into(),
        }
    }

    /// Create a new Capacity error.
    pub fn capacity(tag: ChunkTag, offset: u64, size: u64) -> Self {
        Self::Capacity { tag, offset, size }
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this is the visitor-abort signal rather than a real failure.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
