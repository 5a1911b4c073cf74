//! Refined VCF output: header augmentation, BGZF writing, the post-pass
//! tabix index, and a JSON run summary.

use std::fs::File;

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::Serialize;

use noodles::bgzf;
use noodles::core::Position;
use noodles::csi;
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::tabix;
use noodles::vcf;
use noodles::vcf::header::record::value::map::info::{Number, Type};
use noodles::vcf::header::record::value::{map::Info, Map};
use noodles::vcf::variant::io::Write as _;
use noodles::vcf::variant::Record as _;
use noodles::vcf::variant::RecordBuf;

/// Re-declare the INFO fields this tool rewrites, replacing any existing
/// definitions so descriptions and types are consistent in the output.
pub fn augment_header(input: &vcf::Header) -> vcf::Header {
    let mut header = input.clone();
    let infos = header.infos_mut();
    infos.insert(
        "END".into(),
        Map::<Info>::new(
            Number::Count(1),
            Type::Integer,
            "End position of the structural variant",
        ),
    );
    infos.insert(
        "INSLEN".into(),
        Map::<Info>::new(
            Number::Count(1),
            Type::Integer,
            "Predicted length of the insertion",
        ),
    );
    infos.insert(
        "SRQ".into(),
        Map::<Info>::new(
            Number::Count(1),
            Type::Float,
            "Split-read consensus alignment quality",
        ),
    );
    infos.insert(
        "CE".into(),
        Map::<Info>::new(Number::Count(1), Type::Float, "Consensus sequence entropy"),
    );
    infos.insert(
        "MICROHOMLEN".into(),
        Map::<Info>::new(
            Number::Count(1),
            Type::Integer,
            "Breakpoint micro-homology length",
        ),
    );
    header
}

/// Single-writer BGZF VCF output.
pub struct VcfOutput {
    writer: vcf::io::Writer<bgzf::io::Writer<File>>,
    header: vcf::Header,
}

impl VcfOutput {
    /// Create the output file and write the (augmented) header.
    pub fn create(path: &str, header: &vcf::Header) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("Failed to create output {}", path))?;
        let mut writer = vcf::io::Writer::new(bgzf::io::Writer::new(file));
        writer
            .write_header(header)
            .context("Failed to write output header")?;
        Ok(Self {
            writer,
            header: header.clone(),
        })
    }

    pub fn write_record(&mut self, record: &RecordBuf) -> Result<()> {
        self.writer
            .write_variant_record(&self.header, record)
            .context("Failed to write record")
    }

    /// Flush and close the BGZF stream.
    pub fn finish(self) -> Result<()> {
        self.writer
            .into_inner()
            .finish()
            .context("Failed to finish output")?;
        Ok(())
    }
}

/// Build a tabix index over the finished output by re-reading it and
/// recording one chunk per record.
pub fn build_index(path: &str) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to re-open output {}", path))?;
    let mut reader = vcf::io::Reader::new(bgzf::io::Reader::new(file));
    let header = reader.read_header()?;

    let mut indexer = tabix::index::Indexer::default();
    indexer.set_header(csi::binning_index::index::header::Builder::vcf().build());

    let mut record = vcf::Record::default();
    let mut start_position = reader.get_ref().virtual_position();
    let mut prev: Option<(String, Position)> = None;
    while reader.read_record(&mut record)? != 0 {
        let end_position = reader.get_ref().virtual_position();
        let chunk = Chunk::new(start_position, end_position);

        let reference_sequence_name = record.reference_sequence_name().to_string();
        let start = record
            .variant_start()
            .transpose()?
            .ok_or_else(|| anyhow!("output record missing a position"))?;
        let end = record.variant_end(&header)?;

        // Refinement can pull a position leftward past its neighbor; an
        // unsorted file cannot be tabix-indexed, so leave it unindexed.
        if !position_order_ok(prev.as_ref(), &reference_sequence_name, start) {
            warn!(
                "{} is not position-sorted after refinement; skipping index",
                path
            );
            return Ok(());
        }

        indexer.add_record(&reference_sequence_name, start, end, chunk)?;
        prev = Some((reference_sequence_name, start));
        start_position = end_position;
    }

    let index = indexer.build();
    tabix::fs::write(format!("{}.tbi", path), &index)
        .with_context(|| format!("Failed to write index for {}", path))?;
    Ok(())
}

/// True when `start` does not move backward relative to the previous record
/// on the same reference sequence.
fn position_order_ok(prev: Option<&(String, Position)>, name: &str, start: Position) -> bool {
    match prev {
        Some((prev_name, prev_start)) if prev_name == name => start >= *prev_start,
        _ => true,
    }
}

/// Per-run counters, filled by the pipeline and reported in the summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefineStats {
    /// Reference sequences with a matching VCF contig.
    pub chromosomes: usize,
    /// Records of the selected SV type that were processed.
    pub records: usize,
    /// Records rewritten with base-exact breakpoints.
    pub refined: usize,
    /// Records that fell back to a symbolic allele.
    pub symbolic: usize,
    /// Records of other SV types, skipped entirely.
    pub skipped: usize,
}

/// JSON run summary written next to the output VCF.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub timestamp: String,
    pub sv_type: String,
    pub stats: RefineStats,
}

impl RunSummary {
    pub fn new(sv_type: &str, stats: RefineStats) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: crate::utils::time::utc_now_iso8601(),
            sv_type: sv_type.to_string(),
            stats,
        }
    }

    /// Write `<out_path>.summary.json`.
    pub fn write_next_to(&self, out_path: &str) -> Result<()> {
        let path = format!("{}.summary.json", out_path);
        let file =
            File::create(&path).with_context(|| format!("Failed to create summary {}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to serialize summary")?;
        Ok(())
    }
}
