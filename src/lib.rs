//! # Sieve - Progressive JSON Path Extraction
//!
//! A library for scanning large JSON files in byte chunks, reporting coarse
//! read progress while extracting every value that matches a dotted path
//! pattern such as `hexes.*`.
//!
//! ## Modules
//!
//! - **path**: dotted path patterns (`hexes.*`, `data.items.2`, `*`)
//! - **scan**: chunked file scanning, progress tracking, incremental extraction
//!
//! ## Quick Start
//!
//! Feed chunks straight to the extractor:
//!
//! ```rust
//! use sieve::{PathPattern, StreamExtractor};
//!
//! # fn main() -> Result<(), sieve::ScanError> {
//! let pattern = PathPattern::parse("hexes.*")?;
//! let mut seen = Vec::new();
//! let mut extractor = StreamExtractor::new(&pattern, |record| {
//!     seen.push(record);
//!     Ok(())
//! });
//!
//! extractor.feed(br#"{"hexes":[1,"#)?;
//! extractor.feed(br#"2,3]}"#)?;
//! assert_eq!(extractor.finish()?, 3);
//! # Ok(())
//! # }
//! ```
//!
//! Or scan a file with progress reports:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sieve::{scan_file, PathPattern, ScanConfig};
//!
//! # fn main() -> Result<(), sieve::ScanError> {
//! let pattern = PathPattern::parse("hexes.*")?;
//! let report = scan_file(
//!     Path::new("export.json"),
//!     &pattern,
//!     ScanConfig::default(),
//!     |ratio| {
//!         println!("{ratio}%");
//!         Ok(())
//!     },
//!     |_record| Ok(()), // discard
//! )?;
//! println!("{} records in {} bytes", report.records, report.file_size);
//! # Ok(())
//! # }
//! ```

use std::io;
use std::path::Path;

use serde_json::Value;

pub mod error;
pub mod path;
pub mod scan;

// Re-export commonly used types for convenience
pub use error::ScanError;
pub use path::{PathPattern, PathStep, Segment};
pub use scan::{FileScanner, ProgressTracker, ScanConfig, ScanReport, StreamExtractor};

/// Main entry point: scan a JSON file, reporting progress per chunk and
/// delivering path-matched records to the sink
pub fn scan_file<P, R>(
    path: &Path,
    pattern: &PathPattern,
    config: ScanConfig,
    on_progress: P,
    on_record: R,
) -> Result<ScanReport, ScanError>
where
    P: FnMut(f64) -> io::Result<()>,
    R: FnMut(Value) -> io::Result<()>,
{
    FileScanner::new(config).scan(path, pattern, on_progress, on_record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_scan_file_end_to_end() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"hexes":[{"id":1},{"id":2}]}"#).unwrap();
        file.flush().unwrap();

        let pattern = PathPattern::parse("hexes.*").unwrap();
        let mut records = Vec::new();
        let report = scan_file(
            file.path(),
            &pattern,
            ScanConfig::default(),
            |_| Ok(()),
            |record| {
                records.push(record);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    }
}
