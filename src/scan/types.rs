/// Configuration for a progressive scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Bytes read per chunk; each chunk produces one progress report
    pub chunk_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            chunk_size: 64 * 1024,
        }
    }
}

/// Summary of one completed scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Total file size taken from metadata before reading began
    pub file_size: u64,

    /// Bytes actually consumed; equals `file_size` on success
    pub bytes_read: u64,

    /// Records delivered to the sink
    pub records: u64,
}
