//! Microhomology measurement around a localized breakpoint.
//!
//! Short repeated sequence at the junction lets the indel shift by a few
//! bases without changing the alignment score, so the exact cut point is
//! ambiguous within that range. The scanner counts how many single-base
//! shifts in each direction are score-neutral.

use crate::refine::align::{Alignment, CONSENSUS_ROW, GAP, REFERENCE_ROW};

/// Number of score-neutral single-base shifts of the indel in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomologySpan {
    pub left: usize,
    pub right: usize,
}

impl HomologySpan {
    /// The reported microhomology length: the larger of the two sides.
    pub fn len(&self) -> usize {
        self.left.max(self.right)
    }
}

/// Scan outward from the gap run `[gap_start, gap_end)`.
///
/// Shifting the indel by one position keeps the score exactly when the base
/// immediately outside the run equals the base the shift would pull inside
/// it, i.e. the base-row characters at the two run edges agree. Each side is
/// bounded by the grid edge and by `max_shift`.
pub fn scan_homology(
    alignment: &Alignment,
    gap_start: usize,
    gap_end: usize,
    max_shift: usize,
) -> HomologySpan {
    // The row that keeps bases inside the gap run
    let base_row = if alignment.get(CONSENSUS_ROW, gap_start) == GAP {
        REFERENCE_ROW
    } else {
        CONSENSUS_ROW
    };

    let mut left = 0;
    while left < max_shift && gap_start > left && gap_end > left {
        let outside = alignment.get(base_row, gap_start - 1 - left);
        let inside = alignment.get(base_row, gap_end - 1 - left);
        if outside == GAP || inside == GAP || outside != inside {
            break;
        }
        left += 1;
    }

    let cols = alignment.cols();
    let mut right = 0;
    while right < max_shift && gap_end + right < cols {
        let inside = alignment.get(base_row, gap_start + right);
        let outside = alignment.get(base_row, gap_end + right);
        if inside == GAP || outside == GAP || inside != outside {
            break;
        }
        right += 1;
    }

    HomologySpan { left, right }
}
