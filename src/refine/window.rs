//! Reference window extraction around a candidate SV.

/// A slice of the reference genome around one candidate record.
///
/// Derived and read-only; recomputed for every record and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceWindow {
    /// 0-based offset of the window within the chromosome.
    pub offset: usize,
    /// Upper-cased bases.
    pub bases: Vec<u8>,
}

impl ReferenceWindow {
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// Carve the window `[pos - cons_len, end + cons_len)`, clamped to the
/// chromosome bounds. Pure over its inputs.
pub fn extract_window(
    sequence: &[u8],
    pos: usize,
    end: usize,
    cons_len: usize,
) -> ReferenceWindow {
    let start = pos.saturating_sub(cons_len);
    let stop = (end + cons_len).min(sequence.len());
    let bases = if start < stop {
        sequence[start..stop].to_ascii_uppercase()
    } else {
        Vec::new()
    };
    ReferenceWindow {
        offset: start,
        bases,
    }
}
