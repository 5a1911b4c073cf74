//! Sequential refinement scan.
//!
//! The reference stream drives the run: for each chromosome, all overlapping
//! candidate records are refined and written before advancing, so the output
//! preserves the input order. Record-local failures never stop the scan;
//! they only move counters in [`RefineStats`].

use anyhow::{Context, Result};
use log::{debug, info};

use noodles::core::Position;
use noodles::vcf::variant::record_buf::info::field::Value;
use noodles::vcf::variant::record_buf::AlternateBases;
use noodles::vcf::variant::RecordBuf;

use crate::config::{RefineConfig, SvType};
use crate::input::{open_reference, VariantInput};
use crate::output::{augment_header, build_index, RefineStats, VcfOutput};
use crate::refine::align::AlignScoring;
use crate::refine::{refine_record, RefinedFields, Refinement, SvRecord, SymbolicFields};

/// One full refinement run over a VCF / reference pair.
pub struct RefineRunner {
    vcf_path: String,
    genome_path: String,
    out_path: String,
    config: RefineConfig,
}

impl RefineRunner {
    pub fn new(vcf_path: &str, genome_path: &str, out_path: &str, config: RefineConfig) -> Self {
        Self {
            vcf_path: vcf_path.to_string(),
            genome_path: genome_path.to_string(),
            out_path: out_path.to_string(),
            config,
        }
    }

    /// Refine every record, write the output, and build its index.
    pub fn run(&self) -> Result<RefineStats> {
        let mut input = VariantInput::open(&self.vcf_path)?;
        let out_header = augment_header(input.header());
        let mut output = VcfOutput::create(&self.out_path, &out_header)?;
        let mut reference = open_reference(&self.genome_path)?;

        let scoring = AlignScoring::default();
        let mut stats = RefineStats::default();

        for result in reference.records() {
            let seq = result.context("Error reading reference sequence")?;
            let name = String::from_utf8_lossy(seq.name().as_ref()).to_string();
            if !input.has_contig(&name) {
                debug!("Reference sequence {} not in VCF header, skipping", name);
                continue;
            }
            stats.chromosomes += 1;

            let sequence: &[u8] = seq.sequence().as_ref();
            for mut record in input.query_chromosome(&name)? {
                // Records of other SV types are not carried into the output
                if !matches_sv_type(&record, self.config.sv_type) {
                    stats.skipped += 1;
                    continue;
                }
                stats.records += 1;

                let sv = to_sv_record(&record, &name, self.config.sv_type);
                match refine_record(&sv, sequence, self.config.max_span, &scoring) {
                    Refinement::Refined(fields) => {
                        apply_refined(&mut record, &fields)?;
                        stats.refined += 1;
                    }
                    Refinement::Symbolic(fields) => {
                        apply_symbolic(&mut record, &fields);
                        stats.symbolic += 1;
                    }
                }
                output.write_record(&record)?;
            }
            info!(
                "{}: {} records processed ({} refined)",
                name, stats.records, stats.refined
            );
        }

        output.finish()?;
        build_index(&self.out_path)?;
        Ok(stats)
    }
}

fn info_string(record: &RecordBuf, key: &str) -> Option<String> {
    match record.info().get(key) {
        Some(Some(Value::String(s))) => Some(s.clone()),
        _ => None,
    }
}

fn info_integer(record: &RecordBuf, key: &str) -> Option<i32> {
    match record.info().get(key) {
        Some(Some(Value::Integer(i))) => Some(*i),
        _ => None,
    }
}

/// A record belongs to the run when its SVTYPE parses to the selected type.
/// A record with no SVTYPE at all is taken at face value; an unparseable tag
/// never matches.
fn matches_sv_type(record: &RecordBuf, sv_type: SvType) -> bool {
    match info_string(record, "SVTYPE") {
        Some(tag) => SvType::from_tag(&tag) == Some(sv_type),
        None => true,
    }
}

/// Project the VCF record onto the engine's view of a candidate SV.
fn to_sv_record(record: &RecordBuf, chrom: &str, sv_type: SvType) -> SvRecord {
    let pos = record
        .variant_start()
        .map(|p| usize::from(p) - 1)
        .unwrap_or(0);
    // INFO END is 1-based inclusive, which equals the 0-based exclusive end;
    // a record without one spans a single base.
    let end = info_integer(record, "END")
        .and_then(|e| usize::try_from(e).ok())
        .unwrap_or(pos + 1)
        .max(pos + 1);
    let precise = record.info().get("PRECISE").is_some();
    let consensus = info_string(record, "CONSENSUS");

    SvRecord {
        chrom: chrom.to_string(),
        pos,
        end,
        sv_type,
        precise,
        consensus,
    }
}

fn apply_refined(record: &mut RecordBuf, fields: &RefinedFields) -> Result<()> {
    *record.variant_start_mut() = Some(
        Position::try_from(fields.pos + 1).context("refined position out of range")?,
    );
    *record.reference_bases_mut() = fields.ref_allele.clone();
    *record.alternate_bases_mut() = AlternateBases::from(vec![fields.alt_allele.clone()]);

    let info = record.info_mut();
    info.insert("END".into(), Some(Value::Integer(fields.end as i32)));
    info.insert(
        "INSLEN".into(),
        Some(Value::Integer(fields.insertion_len as i32)),
    );
    info.insert(
        "SRQ".into(),
        Some(Value::Float(fields.alignment_quality as f32)),
    );
    info.insert(
        "CE".into(),
        Some(Value::Float(fields.consensus_entropy as f32)),
    );
    info.insert(
        "MICROHOMLEN".into(),
        Some(Value::Integer(fields.microhomology.len() as i32)),
    );
    Ok(())
}

fn apply_symbolic(record: &mut RecordBuf, fields: &SymbolicFields) {
    *record.reference_bases_mut() = fields.ref_allele.clone();
    *record.alternate_bases_mut() = AlternateBases::from(vec![fields.alt_allele.clone()]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::homology::HomologySpan;

    fn test_record() -> RecordBuf {
        RecordBuf::builder()
            .set_reference_sequence_name("chr1")
            .set_variant_start(Position::try_from(14).unwrap())
            .set_reference_bases("N")
            .build()
    }

    #[test]
    fn test_to_sv_record_defaults() {
        let record = test_record();
        let sv = to_sv_record(&record, "chr1", SvType::Deletion);
        assert_eq!(sv.pos, 13);
        assert_eq!(sv.end, 14); // no END: single-base span
        assert!(!sv.precise);
        assert!(sv.consensus.is_none());
        assert_eq!(sv.span(), 1);
    }

    #[test]
    fn test_to_sv_record_reads_info_fields() {
        let mut record = test_record();
        let info = record.info_mut();
        info.insert("END".into(), Some(Value::Integer(120)));
        info.insert("PRECISE".into(), Some(Value::Flag));
        info.insert(
            "CONSENSUS".into(),
            Some(Value::String("ACGTACGT".into())),
        );
        let sv = to_sv_record(&record, "chr1", SvType::Insertion);
        assert_eq!(sv.end, 120);
        assert!(sv.precise);
        assert_eq!(sv.consensus.as_deref(), Some("ACGTACGT"));
    }

    #[test]
    fn test_matches_sv_type() {
        let mut record = test_record();
        assert!(matches_sv_type(&record, SvType::Deletion)); // no SVTYPE
        record
            .info_mut()
            .insert("SVTYPE".into(), Some(Value::String("DEL".into())));
        assert!(matches_sv_type(&record, SvType::Deletion));
        assert!(!matches_sv_type(&record, SvType::Insertion));
        record
            .info_mut()
            .insert("SVTYPE".into(), Some(Value::String("BND".into())));
        assert!(!matches_sv_type(&record, SvType::Deletion));
    }

    #[test]
    fn test_apply_symbolic_touches_only_alleles() {
        let mut record = test_record();
        apply_symbolic(
            &mut record,
            &SymbolicFields {
                ref_allele: "A".to_string(),
                alt_allele: "<DEL>".to_string(),
            },
        );
        assert_eq!(record.reference_bases(), "A");
        assert_eq!(record.alternate_bases().as_ref(), ["<DEL>".to_string()]);
        assert_eq!(
            record.variant_start(),
            Some(Position::try_from(14).unwrap())
        );
    }

    #[test]
    fn test_apply_refined_rewrites_position_and_info() {
        let mut record = test_record();
        let fields = RefinedFields {
            pos: 15,
            end: 20,
            ref_allele: "CCCCG".to_string(),
            alt_allele: "C".to_string(),
            insertion_len: 0,
            alignment_quality: 1.0,
            consensus_entropy: 1.5,
            microhomology: HomologySpan { left: 0, right: 2 },
        };
        apply_refined(&mut record, &fields).unwrap();
        assert_eq!(
            record.variant_start(),
            Some(Position::try_from(16).unwrap())
        );
        assert_eq!(record.reference_bases(), "CCCCG");
        assert_eq!(
            record.info().get("END"),
            Some(Some(&Value::Integer(20)))
        );
        assert_eq!(
            record.info().get("MICROHOMLEN"),
            Some(Some(&Value::Integer(2)))
        );
    }
}
