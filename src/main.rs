mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use trackmux::sift::{CollectVisitor, LocateVisitor, SiftVisitor, TopLevelVisitor};
use trackmux::{ChunkReader, ChunkTag, SegmentWriter};

fn parse_tag(s: &str) -> Result<ChunkTag> {
    s.parse::<ChunkTag>().map_err(anyhow::Error::msg)
}

fn open_reader(path: &Path, groups: &[String]) -> Result<ChunkReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = ChunkReader::new(file)?;
    for group in groups {
        reader = reader.with_group_tag(parse_tag(group)?);
    }
    Ok(reader)
}

fn sift_file(path: &Path, json: bool, hex: bool, groups: &[String]) -> Result<()> {
    let mut reader = open_reader(path, groups)?;
    if json {
        let mut collect = CollectVisitor::new();
        reader.parse(&mut collect)?;
        println!("{}", serde_json::to_string_pretty(&collect.into_records())?);
    } else {
        let stdout = io::stdout();
        let mut visitor = SiftVisitor::new(stdout.lock()).with_hex(hex);
        reader.parse(&mut visitor)?;
    }
    Ok(())
}

fn extract_chunk(path: &Path, index: usize, output: &Path, groups: &[String]) -> Result<()> {
    let mut reader = open_reader(path, groups)?;
    let mut locate = LocateVisitor::new(index);
    reader.parse(&mut locate)?;

    let chunk = match locate.found() {
        Some(chunk) => *chunk,
        None => bail!("no chunk at index {index} in {}", path.display()),
    };

    let mut source = reader.into_inner();
    source.seek(SeekFrom::Start(chunk.scan))?;
    let mut out = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let copied = io::copy(&mut (&mut source).take(chunk.size), &mut out)?;
    if copied != chunk.size {
        bail!("truncated source: copied {copied} of {} bytes", chunk.size);
    }

    tracing::info!(tag = %chunk.tag, size = chunk.size, "chunk extracted");
    println!(
        "Extracted '{}' ({} bytes) to {}",
        chunk.tag,
        chunk.size,
        output.display()
    );
    Ok(())
}

fn insert_chunk(
    path: &Path,
    index: usize,
    tag: &str,
    body_path: &Path,
    output: &Path,
) -> Result<()> {
    let tag = parse_tag(tag)?;
    let body =
        std::fs::read(body_path).with_context(|| format!("reading {}", body_path.display()))?;

    let mut source = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let chunks = {
        let mut reader = ChunkReader::new(&mut source)?;
        let mut top = TopLevelVisitor::new();
        reader.parse(&mut top)?;
        top.into_chunks()
    };
    if index > chunks.len() {
        bail!(
            "index {index} out of range: {} has {} top-level chunks",
            path.display(),
            chunks.len()
        );
    }

    let mut out =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;
    for (i, chunk) in chunks.iter().enumerate() {
        if i == index {
            write_leaf(&mut out, tag, &body)?;
        }
        // Copy the chunk's encoded bytes verbatim, parity pad included.
        let encoded = chunk.size + chunk.body_len() % 2;
        source.seek(SeekFrom::Start(chunk.scan))?;
        io::copy(&mut (&mut source).take(encoded), &mut out)?;
    }
    if index == chunks.len() {
        write_leaf(&mut out, tag, &body)?;
    }

    println!(
        "Inserted '{}' ({} bytes) at index {} into {}",
        tag,
        body.len(),
        index,
        output.display()
    );
    Ok(())
}

fn write_leaf(out: &mut File, tag: ChunkTag, body: &[u8]) -> Result<()> {
    let mut writer = SegmentWriter::new(&mut *out)?;
    let segment = writer.open(tag)?;
    writer.write(segment, body)?;
    writer.finish(segment)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive a default from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "trackmux=trace,trackmux_container=trace,trackmux_common=debug".to_string()
        } else {
            "trackmux=info,trackmux_container=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Sift {
            input,
            json,
            hex,
            groups,
        } => sift_file(&input, json, hex, &groups),
        Commands::Extract {
            input,
            index,
            output,
            groups,
        } => extract_chunk(&input, index, &output, &groups),
        Commands::Insert {
            input,
            index,
            tag,
            body,
            output,
        } => insert_chunk(&input, index, &tag, &body, &output),
    }
}
