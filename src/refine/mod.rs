//! Breakpoint refinement engine.
//!
//! Pure over byte slices and plain structs: the VCF and FASTA layers hand in
//! an [`SvRecord`] plus the chromosome sequence and get back either refined
//! breakpoint fields or the symbolic fallback. Every record resolves to one
//! of the two; refinement failures are absorbed here, never propagated.

pub mod align;
pub mod entropy;
pub mod homology;
pub mod split;
pub mod window;

use crate::config::SvType;
use align::AlignScoring;
use homology::HomologySpan;

/// A candidate SV call as consumed from the variant file.
#[derive(Debug, Clone)]
pub struct SvRecord {
    pub chrom: String,
    /// 0-based start position.
    pub pos: usize,
    /// 0-based end position (from INFO END); equals `pos + 1` when absent.
    pub end: usize,
    pub sv_type: SvType,
    pub precise: bool,
    pub consensus: Option<String>,
}

impl SvRecord {
    /// Declared span prior to refinement.
    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.pos).max(1)
    }
}

/// Refined breakpoint fields to write back onto the record.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedFields {
    /// New 0-based start position (the anchor base).
    pub pos: usize,
    /// New 1-based inclusive end position.
    pub end: usize,
    pub ref_allele: String,
    pub alt_allele: String,
    pub insertion_len: usize,
    pub alignment_quality: f64,
    pub consensus_entropy: f64,
    pub microhomology: HomologySpan,
}

/// Symbolic fallback: one reference base plus an angle-bracket type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicFields {
    pub ref_allele: String,
    pub alt_allele: String,
}

/// Outcome of processing one record. Terminal either way; no record is
/// revisited.
#[derive(Debug, Clone, PartialEq)]
pub enum Refinement {
    Refined(RefinedFields),
    Symbolic(SymbolicFields),
}

/// Refine one record against its chromosome sequence.
///
/// Eligibility: precise, span within `max_span`, a non-empty consensus, and
/// an SV type wired to refinement. Everything else, and every stage failure,
/// yields the symbolic allele pair.
pub fn refine_record(
    record: &SvRecord,
    sequence: &[u8],
    max_span: usize,
    scoring: &AlignScoring,
) -> Refinement {
    match try_refine(record, sequence, max_span, scoring) {
        Some(fields) => Refinement::Refined(fields),
        None => Refinement::Symbolic(symbolic_fields(record, sequence)),
    }
}

fn try_refine(
    record: &SvRecord,
    sequence: &[u8],
    max_span: usize,
    scoring: &AlignScoring,
) -> Option<RefinedFields> {
    if !record.precise || record.span() > max_span {
        return None;
    }
    let polarity = record.sv_type.gap_polarity()?;
    let consensus = record.consensus.as_ref()?;
    if consensus.is_empty() {
        return None;
    }
    let consensus = consensus.to_ascii_uppercase();
    let consensus = consensus.as_bytes();

    let win = window::extract_window(sequence, record.pos, record.end, consensus.len());
    let alignment = align::align_consensus(consensus, &win.bases, scoring)?;
    let sp = split::find_split(&alignment, polarity)?;

    // The anchor base sits immediately left of the reference-side junction
    if sp.r_start == 0 {
        return None;
    }
    let anchor = win.bases[sp.r_start - 1] as char;

    let mut ref_allele = String::with_capacity(1 + sp.r_end - sp.r_start);
    ref_allele.push(anchor);
    ref_allele.push_str(std::str::from_utf8(&win.bases[sp.r_start..sp.r_end]).ok()?);

    let mut alt_allele = String::with_capacity(1 + sp.c_end - sp.c_start);
    alt_allele.push(anchor);
    alt_allele.push_str(std::str::from_utf8(&consensus[sp.c_start..sp.c_end]).ok()?);

    let microhomology = homology::scan_homology(&alignment, sp.gap_start, sp.gap_end, win.len() / 2);

    Some(RefinedFields {
        pos: win.offset + sp.r_start - 1,
        end: win.offset + sp.r_end,
        ref_allele,
        alt_allele,
        insertion_len: sp.c_end - sp.c_start,
        alignment_quality: sp.quality,
        consensus_entropy: entropy::shannon_entropy(consensus),
        microhomology,
    })
}

fn symbolic_fields(record: &SvRecord, sequence: &[u8]) -> SymbolicFields {
    let base = sequence
        .get(record.pos)
        .map(|b| b.to_ascii_uppercase() as char)
        .unwrap_or('N');
    SymbolicFields {
        ref_allele: base.to_string(),
        alt_allele: format!("<{}>", record.sv_type.tag()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn del_record(pos: usize, end: usize, consensus: Option<&str>, precise: bool) -> SvRecord {
        SvRecord {
            chrom: "chr1".to_string(),
            pos,
            end,
            sv_type: SvType::Deletion,
            precise,
            consensus: consensus.map(String::from),
        }
    }

    fn refine(record: &SvRecord, sequence: &[u8]) -> Refinement {
        refine_record(record, sequence, 500, &AlignScoring::default())
    }

    // Chromosome with a 4-base deletion of CCCG relative to the consensus:
    // flanks GGGG...AAACCC / GGGTTT...GGGG around the retained bases.
    const CHROM: &[u8] = b"GGGGGGGGGGAAACCCCCCGGGGTTTGGGGGGGGGG";
    const CONSENSUS: &str = "AAACCCGGGTTT";

    #[test]
    fn test_refined_deletion_fields() {
        // Call roughly covering the event
        let record = del_record(13, 23, Some(CONSENSUS), true);
        let result = refine(&record, CHROM);
        let fields = match result {
            Refinement::Refined(f) => f,
            Refinement::Symbolic(_) => panic!("expected refinement"),
        };
        // Deleted bases are CHROM[16..20] == "CCCG"; anchor at 15
        assert_eq!(fields.pos, 15);
        assert_eq!(fields.end, 20);
        assert_eq!(fields.ref_allele, "CCCCG");
        assert_eq!(fields.alt_allele, "C");
        assert_eq!(fields.insertion_len, 0);
        assert!((fields.alignment_quality - 1.0).abs() < f64::EPSILON);
        assert!(fields.consensus_entropy > 0.0);
        // Rewritten position never passes the rewritten end
        assert!(fields.pos + 1 <= fields.end);
    }

    #[test]
    fn test_refined_insertion_fields() {
        let chrom = b"GGGGGGGGGGAAAATTTTGGGGGGGGGG";
        let record = SvRecord {
            chrom: "chr1".to_string(),
            pos: 13,
            end: 14,
            sv_type: SvType::Insertion,
            precise: true,
            consensus: Some("AAAACGCGTTTT".to_string()),
        };
        let fields = match refine(&record, chrom) {
            Refinement::Refined(f) => f,
            Refinement::Symbolic(_) => panic!("expected refinement"),
        };
        assert_eq!(fields.insertion_len, 4);
        assert_eq!(fields.ref_allele.len(), 1);
        assert_eq!(fields.alt_allele.len(), 5);
        assert!(fields.alt_allele.ends_with("CGCG"));
        assert_eq!(fields.pos + 1, fields.end);
    }

    #[test]
    fn test_imprecise_record_is_symbolic() {
        let record = del_record(13, 23, Some(CONSENSUS), false);
        match refine(&record, CHROM) {
            Refinement::Symbolic(s) => {
                assert_eq!(s.ref_allele, "C");
                assert_eq!(s.alt_allele, "<DEL>");
            }
            Refinement::Refined(_) => panic!("imprecise record must not refine"),
        }
    }

    #[test]
    fn test_span_over_limit_is_symbolic() {
        let record = del_record(13, 23, Some(CONSENSUS), true);
        let result = refine_record(&record, CHROM, 5, &AlignScoring::default());
        assert!(matches!(result, Refinement::Symbolic(_)));
    }

    #[test]
    fn test_missing_or_empty_consensus_is_symbolic() {
        for consensus in [None, Some("")] {
            let record = del_record(13, 23, consensus, true);
            let result = refine(&record, CHROM);
            assert!(matches!(result, Refinement::Symbolic(_)));
        }
    }

    #[test]
    fn test_symbolic_is_idempotent() {
        let record = del_record(13, 23, None, true);
        let first = refine(&record, CHROM);
        let second = refine(&record, CHROM);
        assert_eq!(first, second);
    }

    #[test]
    fn test_consensus_identical_to_window_is_symbolic() {
        // No indel anywhere near the call: split localization must fail
        let chrom = b"ACGTACGTACGTACGTACGTACGT";
        let record = del_record(8, 16, Some("ACGTACGT"), true);
        assert!(matches!(refine(&record, chrom), Refinement::Symbolic(_)));
    }

    #[test]
    fn test_unwired_type_is_symbolic() {
        let record = SvRecord {
            sv_type: SvType::Duplication,
            ..del_record(13, 23, Some(CONSENSUS), true)
        };
        match refine(&record, CHROM) {
            Refinement::Symbolic(s) => assert_eq!(s.alt_allele, "<DUP>"),
            Refinement::Refined(_) => panic!("DUP is not wired to refinement"),
        }
    }

    #[test]
    fn test_lower_case_inputs_are_normalized() {
        let chrom: Vec<u8> = CHROM.to_ascii_lowercase();
        let record = del_record(13, 23, Some(&CONSENSUS.to_ascii_lowercase()), true);
        let fields = match refine(&record, &chrom) {
            Refinement::Refined(f) => f,
            Refinement::Symbolic(_) => panic!("expected refinement"),
        };
        assert_eq!(fields.ref_allele, "CCCCG");
    }
}
