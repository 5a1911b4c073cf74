//! Breakpoint localization inside a consensus-to-reference alignment.
//!
//! A usable split-read alignment has exactly one contiguous gap run of the
//! polarity the SV type demands, flanked on both sides by aligned bases.
//! Anything else (no indel, several indels, a gap of the wrong polarity, or
//! an indel touching the grid edge) means the breakpoint cannot be trusted
//! and the caller falls back to symbolic alleles.

use crate::config::GapPolarity;
use crate::refine::align::{Alignment, CONSENSUS_ROW, GAP, REFERENCE_ROW};

/// A localized breakpoint.
///
/// Intervals are 0-based half-open over the input sequences: `[c_start,
/// c_end)` are the consensus bases inside the indel (empty for a deletion)
/// and `[r_start, r_end)` the reference-window bases inside it (empty for an
/// insertion). `[gap_start, gap_end)` are the grid columns of the gap run.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPoint {
    pub c_start: usize,
    pub c_end: usize,
    pub r_start: usize,
    pub r_end: usize,
    pub gap_start: usize,
    pub gap_end: usize,
    /// Fraction of matching bases over the aligned (non-gap) columns.
    pub quality: f64,
}

/// Locate the single indel of the expected polarity, or `None` when the path
/// is ambiguous.
pub fn find_split(alignment: &Alignment, polarity: GapPolarity) -> Option<SplitPoint> {
    let gap_row = match polarity {
        GapPolarity::Consensus => CONSENSUS_ROW,
        GapPolarity::Reference => REFERENCE_ROW,
    };
    let other_row = 1 - gap_row;

    let cols = alignment.cols();
    let mut c = 0usize; // consensus bases consumed
    let mut r = alignment.ref_start(); // window bases consumed, incl. trimmed overhang

    let mut run: Option<(usize, usize, usize)> = None; // (gap col, consensus pos, window pos)
    let mut split: Option<SplitPoint> = None;
    let mut matches = 0usize;
    let mut aligned = 0usize;

    for col in 0..cols {
        let cons = alignment.get(CONSENSUS_ROW, col);
        let refc = alignment.get(REFERENCE_ROW, col);

        if cons != GAP && refc != GAP {
            if let Some((g_s, c_s, r_s)) = run.take() {
                if split.is_some() {
                    // Second indel of the expected polarity
                    return None;
                }
                split = Some(SplitPoint {
                    c_start: c_s,
                    c_end: c,
                    r_start: r_s,
                    r_end: r,
                    gap_start: g_s,
                    gap_end: col,
                    quality: 0.0,
                });
            }
            aligned += 1;
            if cons == refc {
                matches += 1;
            }
            c += 1;
            r += 1;
        } else if alignment.get(gap_row, col) == GAP {
            if run.is_none() {
                if col == 0 {
                    // No flanking context on the left
                    return None;
                }
                run = Some((col, c, r));
            }
            if alignment.get(other_row, col) != GAP {
                match polarity {
                    GapPolarity::Consensus => r += 1,
                    GapPolarity::Reference => c += 1,
                }
            }
        } else {
            // Gap of the opposite polarity: path inconsistent with the SV type
            return None;
        }
    }

    // An open run here means the indel touches the right grid edge
    if run.is_some() {
        return None;
    }

    let mut split = split?;
    if aligned == 0 {
        return None;
    }
    split.quality = matches as f64 / aligned as f64;
    Some(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::align::{align_consensus, AlignScoring};

    fn split_of(cons: &[u8], win: &[u8], polarity: GapPolarity) -> Option<SplitPoint> {
        let a = align_consensus(cons, win, &AlignScoring::default())?;
        find_split(&a, polarity)
    }

    #[test]
    fn test_clean_deletion() {
        // Window = consensus with "CCCG" retained at offset 6
        let cons = b"AAACCCGGGTTT";
        let win = b"AAACCCCCCGGGGTTT";
        let sp = split_of(cons, win, GapPolarity::Consensus).unwrap();
        assert_eq!(sp.c_start, sp.c_end);
        assert_eq!(sp.r_end - sp.r_start, 4);
        assert_eq!(&win[sp.r_start..sp.r_end], b"CCCG");
        assert!((sp.quality - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clean_insertion() {
        let cons = b"AAAACGCGTTTT";
        let win = b"AAAATTTT";
        let sp = split_of(cons, win, GapPolarity::Reference).unwrap();
        assert_eq!(sp.r_start, sp.r_end);
        assert_eq!(sp.c_end - sp.c_start, 4);
        assert_eq!(&cons[sp.c_start..sp.c_end], b"CGCG");
        assert!((sp.quality - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_identical_sequences_have_no_transition() {
        assert!(split_of(b"ACGTACGTAC", b"ACGTACGTAC", GapPolarity::Consensus).is_none());
        assert!(split_of(b"ACGTACGTAC", b"ACGTACGTAC", GapPolarity::Reference).is_none());
    }

    #[test]
    fn test_wrong_polarity_fails() {
        // A deletion-shaped alignment queried as an insertion
        assert!(split_of(b"AAAATTTT", b"AAAACGCGTTTT", GapPolarity::Reference).is_none());
    }

    #[test]
    fn test_interval_invariants() {
        let cons = b"AAACCCGGGTTT";
        let win = b"AAACCCCCCGGGGTTT";
        let sp = split_of(cons, win, GapPolarity::Consensus).unwrap();
        assert!(sp.c_start <= sp.c_end && sp.c_end <= cons.len());
        assert!(sp.r_start <= sp.r_end && sp.r_end <= win.len());
        assert!(sp.r_start >= 1);
        assert!(sp.gap_start >= 1 && sp.gap_end < split_cols(cons, win));
        assert!((0.0..=1.0).contains(&sp.quality));
    }

    fn split_cols(cons: &[u8], win: &[u8]) -> usize {
        align_consensus(cons, win, &AlignScoring::default())
            .unwrap()
            .cols()
    }

    #[test]
    fn test_mismatched_flank_lowers_quality() {
        // One mismatch in the left flank of a 4-base deletion
        let cons = b"ATACCCGGGTTT";
        let win = b"AAACCCCCCGGGGTTT";
        let sp = split_of(cons, win, GapPolarity::Consensus).unwrap();
        assert!(sp.quality < 1.0);
        assert!(sp.quality > 0.8);
    }
}
