//! Chunked file scanning with per-chunk progress reports

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use serde_json::Value;

use crate::error::ScanError;
use crate::path::PathPattern;
use crate::scan::extractor::StreamExtractor;
use crate::scan::progress::ProgressTracker;
use crate::scan::types::{ScanConfig, ScanReport};

/// Scans a JSON file in chunks, reporting read progress as it goes
///
/// The file size is taken from metadata before the first read, so progress
/// reflects raw bytes handed to the extractor, not bytes the extractor has
/// structurally consumed. The file handle is dropped on every exit path,
/// success or failure.
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new(config: ScanConfig) -> Self {
        FileScanner { config }
    }

    /// Scan `path`, delivering progress fractions and matched records to the
    /// two sinks
    ///
    /// Progress is emitted once per chunk, after the chunk has been read but
    /// before it is parsed. The first error from the reader, the extractor,
    /// or either sink aborts the scan.
    pub fn scan<P, R>(
        &self,
        path: &Path,
        pattern: &PathPattern,
        mut on_progress: P,
        on_record: R,
    ) -> Result<ScanReport, ScanError>
    where
        P: FnMut(f64) -> io::Result<()>,
        R: FnMut(Value) -> io::Result<()>,
    {
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ScanError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ScanError::Io(e)
            }
        })?;
        let file_size = file.metadata()?.len();

        let mut tracker = ProgressTracker::new(file_size);
        let mut extractor = StreamExtractor::new(pattern, on_record);
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];

        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            let ratio = tracker.advance(n as u64);
            on_progress(ratio)?;
            extractor.feed(&buf[..n])?;
        }

        let records = extractor.finish()?;
        Ok(ScanReport {
            file_size,
            bytes_read: tracker.consumed(),
            records,
        })
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        FileScanner::new(ScanConfig::default())
    }
}
