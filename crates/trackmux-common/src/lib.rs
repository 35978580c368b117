//! Trackmux-Common: Shared leaf types for the trackmux workspace.
//!
//! This crate provides the small types every other trackmux crate builds on:
//!
//! - **Rational**: exact fraction arithmetic for timestamps and durations
//! - **ChunkTag**: four-character type codes for container segments
//! - **Error Handling**: the unified error type and result alias
//!
//! # Examples
//!
//! ```
//! use trackmux_common::{ChunkTag, Error, Rational, Result};
//!
//! // Exact time bookkeeping: 1001/30000 s is one NTSC frame
//! let frame = Rational::new(1001, 30000);
//! assert_eq!(frame + frame, Rational::new(1001, 15000));
//!
//! // Four-character codes
//! let tag = ChunkTag(*b"FORM");
//! assert_eq!(tag.as_str(), "FORM");
//!
//! // Unified error type
//! fn example() -> Result<()> {
//!     Err(Error::invalid_input("bad tag"))
//! }
//! ```

pub mod error;
pub mod rational;
pub mod tag;

pub use error::{Error, Result};
pub use rational::Rational;
pub use tag::ChunkTag;
