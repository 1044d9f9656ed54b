//! Byte-range bookkeeping for extracted chunks.
//!
//! Every extraction marks the half-open byte ranges it consumed; the orphan
//! collector later asks for the complementary gaps so that each byte of the
//! input is accounted for exactly once.

/// Half-open byte interval `[start, end)` into the source buffer
pub type ByteRange = (usize, usize);

/// Tracks byte ranges consumed by emitted chunks
#[derive(Debug, Default, Clone)]
pub struct RangeTracker {
    used: Vec<ByteRange>,
}

impl RangeTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a range as used. No overlap validation happens at insertion time.
    pub fn mark(&mut self, start: usize, end: usize) {
        self.used.push((start, end));
    }

    /// Add multiple ranges at once
    pub fn extend(&mut self, ranges: impl IntoIterator<Item = ByteRange>) {
        self.used.extend(ranges);
    }

    /// All ranges marked so far, in insertion order
    #[must_use]
    pub fn used_ranges(&self) -> &[ByteRange] {
        &self.used
    }

    /// Sort and coalesce overlapping or adjacent ranges into a minimal
    /// non-overlapping list.
    #[must_use]
    pub fn merge(&self) -> Vec<ByteRange> {
        let mut sorted = self.used.clone();
        sorted.sort_unstable();

        let mut merged: Vec<ByteRange> = Vec::with_capacity(sorted.len());
        for (start, end) in sorted {
            match merged.last_mut() {
                Some((_, last_end)) if start <= *last_end => {
                    *last_end = (*last_end).max(end);
                }
                _ => merged.push((start, end)),
            }
        }

        merged
    }

    /// Compute the complement of the merged ranges within `[0, total_length)`.
    /// Zero-length gaps are omitted.
    #[must_use]
    pub fn gaps(&self, total_length: usize) -> Vec<ByteRange> {
        let mut gaps = Vec::new();
        let mut last_end = 0;

        for (start, end) in self.merge() {
            if last_end < start {
                gaps.push((last_end, start));
            }
            last_end = last_end.max(end);
        }

        if last_end < total_length {
            gaps.push((last_end, total_length));
        }

        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker(ranges: &[ByteRange]) -> RangeTracker {
        let mut t = RangeTracker::new();
        t.extend(ranges.iter().copied());
        t
    }

    #[test]
    fn merge_coalesces_overlapping_and_adjacent() {
        let t = tracker(&[(10, 20), (0, 5), (5, 8), (15, 30)]);
        assert_eq!(t.merge(), vec![(0, 8), (10, 30)]);
    }

    #[test]
    fn merge_is_idempotent() {
        let t = tracker(&[(3, 9), (1, 4), (20, 25), (24, 30), (9, 10)]);
        let once = t.merge();
        let again = tracker(&once).merge();
        assert_eq!(once, again);
    }

    #[test]
    fn gaps_complement_used_ranges() {
        let t = tracker(&[(5, 10), (20, 30)]);
        assert_eq!(t.gaps(40), vec![(0, 5), (10, 20), (30, 40)]);
    }

    #[test]
    fn gaps_and_merged_partition_the_whole_input() {
        let t = tracker(&[(2, 7), (7, 9), (15, 18), (30, 42), (40, 50)]);
        let total = 60;

        let mut all = tracker(&t.gaps(total));
        all.extend(t.used_ranges().iter().copied());
        assert_eq!(all.merge(), vec![(0, total)]);
    }

    #[test]
    fn empty_tracker_yields_single_gap() {
        let t = RangeTracker::new();
        assert_eq!(t.gaps(12), vec![(0, 12)]);
        assert!(t.merge().is_empty());
    }

    #[test]
    fn zero_length_gaps_are_omitted() {
        let t = tracker(&[(0, 5), (5, 12)]);
        assert!(t.gaps(12).is_empty());
    }
}
