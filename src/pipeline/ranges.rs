//! Range computation: marker pages + page total → contiguous output ranges.
//!
//! Pure and I/O-free. Marker pages are consumed: they never appear in any
//! output range. Everything else lands in exactly one range.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive, 1-based span of pages destined for one output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start >= 1 && start <= end, "invalid range {start}-{end}");
        Self { start, end }
    }

    pub fn contains(&self, page: usize) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

/// Renders as a page-range expression, e.g. `4-6`.
impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Partition `1..=total_pages` around the marker pages.
///
/// `markers` must be ascending. A marker beyond `total_pages` closes the
/// last range at `total_pages`; a marker at or before the cursor never moves
/// it backwards.
pub fn build_ranges(markers: &[usize], total_pages: usize) -> Vec<PageRange> {
    let mut ranges = Vec::with_capacity(markers.len() + 1);
    let mut start = 1;

    for &page in markers {
        if start > total_pages {
            break;
        }
        if page > start {
            ranges.push(PageRange::new(start, (page - 1).min(total_pages)));
        }
        start = start.max(page + 1);
    }

    if start <= total_pages {
        ranges.push(PageRange::new(start, total_pages));
    }

    ranges
}
