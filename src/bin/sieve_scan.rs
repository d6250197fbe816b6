//! sieve-scan: stream a JSON file, reporting read progress while extracting
//! elements at a dotted path
//!
//! Usage:
//!   # Progress only, matched records discarded
//!   sieve-scan export.json 'hexes.*'
//!
//!   # Write matched records as JSON Lines
//!   sieve-scan export.json 'hexes.*' --records hexes.jsonl
//!
//!   # Records to stdout, no progress lines
//!   sieve-scan export.json 'hexes.*' --records - --quiet

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use sieve::{FileScanner, PathPattern, ScanConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "sieve-scan")]
#[command(about = "Scan a JSON file with progress, extracting path-matched elements", long_about = None)]
struct Args {
    /// Input JSON file
    #[arg(value_name = "FILE")]
    file: String,

    /// Dotted path pattern selecting elements to extract, e.g. 'hexes.*'
    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Bytes read per chunk; one progress line is printed per chunk
    #[arg(long, default_value_t = 64 * 1024)]
    chunk_size: usize,

    /// Write matched records as JSON Lines to this file ("-" for stdout)
    /// If omitted, records are discarded after counting
    #[arg(long, short = 'r')]
    records: Option<String>,

    /// Suppress the file size header and progress lines
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.chunk_size == 0 {
        bail!("--chunk-size must be positive");
    }

    let pattern = PathPattern::parse(&args.pattern)?;
    let config = ScanConfig {
        chunk_size: args.chunk_size,
    };

    let mut record_writer: Option<Box<dyn Write>> = match args.records.as_deref() {
        None => None,
        Some("-") => Some(Box::new(io::stdout().lock())),
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create records file: {path}"))?;
            Some(Box::new(BufWriter::new(file)))
        }
    };

    let path = Path::new(&args.file);
    let quiet = args.quiet;

    if !quiet {
        // A missing file is reported by the scan itself
        if let Ok(metadata) = std::fs::metadata(path) {
            println!("File size: {}", metadata.len());
        }
    }

    let scanner = FileScanner::new(config);

    let report = scanner.scan(
        path,
        &pattern,
        |ratio| {
            if quiet {
                return Ok(());
            }
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{ratio}%")
        },
        |record: Value| {
            if let Some(writer) = record_writer.as_mut() {
                let line = serde_json::to_string(&record).map_err(io::Error::other)?;
                writeln!(writer, "{line}")?;
            }
            Ok(())
        },
    );

    let report = report.with_context(|| format!("failed to scan {}", args.file))?;

    if let Some(writer) = record_writer.as_mut() {
        writer.flush().context("failed to flush records output")?;
    }

    if !quiet {
        eprintln!(
            "Scanned {} bytes, {} records matched `{}`",
            report.bytes_read, report.records, pattern
        );
    }

    Ok(())
}
