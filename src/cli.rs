use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trackmux")]
#[command(author, version, about = "Chunked media-container diagnostics")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the chunk tree of a container file
    Sift {
        /// Container file to list
        #[arg(required = true)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Hex-dump leaf chunk bodies
        #[arg(long)]
        hex: bool,

        /// Extra tag to treat as a composite chunk (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// Extract a chunk by scan-order index into a file
    Extract {
        /// Container file to read
        #[arg(required = true)]
        input: PathBuf,

        /// Zero-based chunk index in scan order
        #[arg(short, long)]
        index: usize,

        /// Destination file for the raw chunk bytes
        #[arg(short, long)]
        output: PathBuf,

        /// Extra tag to treat as a composite chunk (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// Insert a file as a new top-level chunk
    Insert {
        /// Container file to read
        #[arg(required = true)]
        input: PathBuf,

        /// Zero-based top-level position for the new chunk
        #[arg(short, long)]
        index: usize,

        /// Four-character tag for the new chunk
        #[arg(long)]
        tag: String,

        /// File whose bytes become the chunk body
        #[arg(long)]
        body: PathBuf,

        /// Destination container file
        #[arg(short, long)]
        output: PathBuf,
    },
}
