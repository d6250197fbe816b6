//! Progressive JSON scanning - stream a file in chunks, extract path matches
//!
//! This module wires the chunked file reader, the progress tracker, and the
//! incremental path extractor together. Records are pushed to an injected
//! sink as they complete, so callers decide whether to discard, print, or
//! persist them.

pub mod extractor;
pub mod progress;
pub mod scanner;
pub mod types;

pub use extractor::StreamExtractor;
pub use progress::ProgressTracker;
pub use scanner::FileScanner;
pub use types::{ScanConfig, ScanReport};
