//! Affine-gap alignment of a consensus sequence against a reference window.
//!
//! The window always extends one consensus length past both call boundaries,
//! so the consensus is aligned as a fitting alignment: it must be consumed
//! end to end, while window overhangs on either side are free and trimmed
//! from the result. The affine penalty (one gap-open charge, cheap extension)
//! biases the optimal path toward a single contiguous indel rather than
//! several small ones, which is exactly the shape a split-read breakpoint
//! should have.
//!
//! The result is a two-row character grid (consensus over reference, `-` for
//! gaps) that the split locator and homology scanner walk.

/// Alignment scoring parameters.
pub struct AlignScoring {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for AlignScoring {
    fn default() -> Self {
        Self {
            match_score: 2,
            mismatch_score: -2,
            gap_open: -3,
            gap_extend: -1,
        }
    }
}

/// Row index of the consensus sequence in the alignment grid.
pub const CONSENSUS_ROW: usize = 0;
/// Row index of the reference window in the alignment grid.
pub const REFERENCE_ROW: usize = 1;

/// Gap character in the alignment grid.
pub const GAP: u8 = b'-';

/// A pairwise alignment as a 2 x cols character grid.
///
/// Stored as a flat arena indexed `row * cols + col`; the grid lives only for
/// the duration of one record's refinement. Window overhangs outside the
/// aligned core are not part of the grid; `ref_start` records how many window
/// bases precede the first column.
pub struct Alignment {
    cols: usize,
    data: Vec<u8>,
    score: i32,
    ref_start: usize,
}

impl Alignment {
    /// Number of alignment columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Raw affine alignment score.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Window bases skipped before the first grid column.
    pub fn ref_start(&self) -> usize {
        self.ref_start
    }

    /// Character at (row, col). Panics on out-of-bounds access.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        assert!(row < 2 && col < self.cols, "alignment index out of bounds");
        self.data[row * self.cols + col]
    }
}

const NEG_INF: i32 = i32::MIN / 2;

/// Traceback direction for the DP.
#[derive(Clone, Copy)]
enum Trace {
    M,
    Ix,
    Iy,
}

/// A single alignment operation produced by the traceback.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    /// Consumes 1 consensus + 1 reference base.
    Align,
    /// Consumes 1 reference base (gap in the consensus row).
    GapCons,
    /// Consumes 1 consensus base (gap in the reference row).
    GapRef,
}

/// Align a consensus against a reference window.
///
/// Returns `None` when either sequence is empty or the best score fails the
/// acceptability threshold (non-positive score, i.e. a degenerate alignment
/// where gaps and mismatches outweigh the matched flanks).
pub fn align_consensus(
    consensus: &[u8],
    window: &[u8],
    scoring: &AlignScoring,
) -> Option<Alignment> {
    if consensus.is_empty() || window.is_empty() {
        return None;
    }

    let n = consensus.len();
    let m = window.len();
    let cols = m + 1;

    // Flat matrices: index = i * cols + j, i over consensus, j over window
    let size = (n + 1) * cols;
    let mut sm = vec![NEG_INF; size]; // match/mismatch state
    let mut sx = vec![NEG_INF; size]; // gap in window (consuming consensus)
    let mut sy = vec![NEG_INF; size]; // gap in consensus (consuming window)

    // Traceback: which state produced the best score at each cell
    let mut tm = vec![Trace::M; size];
    let mut tx = vec![Trace::M; size];
    let mut ty = vec![Trace::M; size];

    // Free leading window overhang: the consensus may start anywhere
    for j in 0..=m {
        sm[j] = 0;
    }
    for i in 1..=n {
        sx[i * cols] = scoring.gap_open + (i as i32) * scoring.gap_extend;
    }

    for i in 1..=n {
        for j in 1..=m {
            let idx = i * cols + j;
            let diag = (i - 1) * cols + (j - 1);
            let up = (i - 1) * cols + j;
            let left = i * cols + (j - 1);

            let s = if consensus[i - 1].eq_ignore_ascii_case(&window[j - 1]) {
                scoring.match_score
            } else {
                scoring.mismatch_score
            };

            let m_from_m = sm[diag];
            let m_from_x = sx[diag];
            let m_from_y = sy[diag];
            let best_m = m_from_m.max(m_from_x).max(m_from_y);
            sm[idx] = best_m + s;
            tm[idx] = if best_m == m_from_m {
                Trace::M
            } else if best_m == m_from_x {
                Trace::Ix
            } else {
                Trace::Iy
            };

            // Gap in window — consumes consensus[i]
            let x_open = sm[up] + scoring.gap_open + scoring.gap_extend;
            let x_ext = sx[up] + scoring.gap_extend;
            if x_open >= x_ext {
                sx[idx] = x_open;
                tx[idx] = Trace::M;
            } else {
                sx[idx] = x_ext;
                tx[idx] = Trace::Ix;
            }

            // Gap in consensus — consumes window[j]
            let y_open = sm[left] + scoring.gap_open + scoring.gap_extend;
            let y_ext = sy[left] + scoring.gap_extend;
            if y_open >= y_ext {
                sy[idx] = y_open;
                ty[idx] = Trace::M;
            } else {
                sy[idx] = y_ext;
                ty[idx] = Trace::Iy;
            }
        }
    }

    // Free trailing window overhang: best cell anywhere in the last row
    let mut score = NEG_INF;
    let mut j_end = m;
    let mut state = Trace::M;
    for j in 0..=m {
        let idx = n * cols + j;
        for (s, st) in [
            (sm[idx], Trace::M),
            (sx[idx], Trace::Ix),
            (sy[idx], Trace::Iy),
        ] {
            if s > score {
                score = s;
                j_end = j;
                state = st;
            }
        }
    }

    // Degenerate or low-complexity alignment: no usable matrix
    if score <= 0 {
        return None;
    }

    let mut ops: Vec<Op> = Vec::with_capacity(n + m);
    let mut i = n;
    let mut j = j_end;

    while i > 0 {
        match state {
            Trace::M => {
                if j == 0 {
                    ops.push(Op::GapRef);
                    i -= 1;
                } else {
                    let prev = tm[i * cols + j];
                    ops.push(Op::Align);
                    i -= 1;
                    j -= 1;
                    state = prev;
                }
            }
            Trace::Ix => {
                let prev = tx[i * cols + j];
                ops.push(Op::GapRef);
                i -= 1;
                state = prev;
            }
            Trace::Iy => {
                let prev = ty[i * cols + j];
                ops.push(Op::GapCons);
                j -= 1;
                state = prev;
            }
        }
    }
    let ref_start = j;

    ops.reverse();

    // Render the path as the two-row grid
    let total = ops.len();
    let mut data = vec![GAP; 2 * total];
    let mut ci = 0;
    let mut wj = ref_start;
    for (col, op) in ops.iter().enumerate() {
        match op {
            Op::Align => {
                data[CONSENSUS_ROW * total + col] = consensus[ci].to_ascii_uppercase();
                data[REFERENCE_ROW * total + col] = window[wj].to_ascii_uppercase();
                ci += 1;
                wj += 1;
            }
            Op::GapRef => {
                data[CONSENSUS_ROW * total + col] = consensus[ci].to_ascii_uppercase();
                ci += 1;
            }
            Op::GapCons => {
                data[REFERENCE_ROW * total + col] = window[wj].to_ascii_uppercase();
                wj += 1;
            }
        }
    }

    Some(Alignment {
        cols: total,
        data,
        score,
        ref_start,
    })
}
