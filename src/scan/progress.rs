//! Coarse read-progress tracking for a stream of known total size

/// Tracks cumulative bytes consumed against a total known up front
///
/// The reported ratio is truncated to two decimal places, so a 1 GiB file
/// produces at most 101 distinct values no matter how many chunks it is
/// read in. The cursor only moves forward; it resets only when a new
/// tracker is built.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: u64,
    consumed: u64,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        ProgressTracker { total, consumed: 0 }
    }

    /// Record `bytes` more consumed and return the updated ratio
    pub fn advance(&mut self, bytes: u64) -> f64 {
        debug_assert!(
            self.consumed + bytes <= self.total,
            "read cursor advanced past total size"
        );
        self.consumed = (self.consumed + bytes).min(self.total);
        self.ratio()
    }

    /// Current progress in [0, 1], truncated to two decimal places
    ///
    /// A zero-byte total reports 1.0: there is nothing left to read.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        ((self.consumed as f64 / self.total as f64) * 100.0).floor() / 100.0
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_truncation() {
        let mut tracker = ProgressTracker::new(100);
        assert_eq!(tracker.advance(47), 0.47);

        // 479/1000 truncates down, never rounds up to 0.48
        let mut tracker = ProgressTracker::new(1000);
        assert_eq!(tracker.advance(479), 0.47);
    }

    #[test]
    fn test_full_consumption_is_exactly_one() {
        let mut tracker = ProgressTracker::new(7919);
        tracker.advance(7918);
        assert!(tracker.ratio() < 1.0);
        assert_eq!(tracker.advance(1), 1.0);
    }

    #[test]
    fn test_non_decreasing_across_partitions() {
        for chunk in [1usize, 3, 64, 1000] {
            let total = 1000u64;
            let mut tracker = ProgressTracker::new(total);
            let mut last = 0.0;
            let mut left = total;
            while left > 0 {
                let n = (chunk as u64).min(left);
                let ratio = tracker.advance(n);
                assert!(ratio >= last, "progress went backwards at chunk {chunk}");
                assert!((0.0..=1.0).contains(&ratio));
                last = ratio;
                left -= n;
            }
            assert_eq!(last, 1.0);
        }
    }

    #[test]
    fn test_matches_floor_formula_at_every_prefix() {
        let total = 337u64;
        let mut tracker = ProgressTracker::new(total);
        for b in 1..=total {
            let expected = ((b as f64 / total as f64) * 100.0).floor() / 100.0;
            assert_eq!(tracker.advance(1), expected, "at byte {b}");
        }
    }

    #[test]
    fn test_empty_total_reports_complete() {
        let tracker = ProgressTracker::new(0);
        assert_eq!(tracker.ratio(), 1.0);
    }
}
