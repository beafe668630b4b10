/// A byte range `[start, end)` into a hex buffer.
///
/// Cells, snapshots and change notifications all carry spans rather than
/// copied bytes, so any of them can be re-read from the buffer on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BufferSpan {
    /// Inclusive start byte offset.
    pub start: u64,
    /// Exclusive end byte offset.
    pub end: u64,
}

impl BufferSpan {
    /// The whole addressable extent of a buffer, used for refresh requests.
    pub const FULL: BufferSpan = BufferSpan {
        start: 0,
        end: u64::MAX,
    };

    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "span start {start} past end {end}");
        Self { start, end }
    }

    pub fn from_start_and_len(start: u64, len: u64) -> Self {
        Self::new(start, start.saturating_add(len))
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(self, offset: u64) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True when both spans share at least one byte. Empty spans overlap nothing.
    #[must_use]
    pub fn overlaps_with(self, other: BufferSpan) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// Intersection of two spans, `None` if they do not overlap.
    #[must_use]
    pub fn intersection(self, other: BufferSpan) -> Option<BufferSpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(BufferSpan { start, end })
    }
}

impl From<std::ops::Range<u64>> for BufferSpan {
    fn from(range: std::ops::Range<u64>) -> Self {
        Self::new(range.start, range.end)
    }
}
