//! Partitioning of a workload into consecutive offset ranges.

use std::ops::Range;

/// Iterator over `[0, count)` in consecutive ranges of at most `size`.
#[derive(Debug, Clone)]
pub struct Batches {
    next: u64,
    count: u64,
    size: u64,
}

impl Batches {
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(count: u64, size: usize) -> Self {
        assert!(size > 0, "batch size must be non-zero");
        Self {
            next: 0,
            count,
            size: size as u64,
        }
    }

    /// Number of batches `count` splits into.
    pub fn total(count: u64, size: usize) -> u64 {
        assert!(size > 0, "batch size must be non-zero");
        count.div_ceil(size as u64)
    }
}

impl Iterator for Batches {
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.size).min(self.count);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next).div_ceil(self.size) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches {}
