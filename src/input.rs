//! Variant and reference-sequence input via noodles.
//!
//! The variant side is an indexed, bgzip-compressed VCF queried one
//! chromosome at a time; the reference side is a FASTA stream (plain or
//! BGZF, detected by magic bytes) consumed in file order.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use anyhow::{anyhow, bail, Context, Result};
use log::debug;

use noodles::bgzf;
use noodles::core::Region;
use noodles::fasta;
use noodles::vcf;
use noodles::vcf::variant::RecordBuf;

/// Indexed VCF input queried per chromosome.
pub struct VariantInput {
    reader: vcf::io::IndexedReader<bgzf::io::Reader<File>>,
    header: vcf::Header,
}

impl VariantInput {
    /// Open a bgzip-compressed, tabix/CSI-indexed VCF.
    pub fn open(path: &str) -> Result<Self> {
        let mut reader = vcf::io::indexed_reader::Builder::default()
            .build_from_path(path)
            .map_err(|e| {
                anyhow!(
                    "Failed to open VCF {}: {}. The input must be bgzip-compressed \
                     and indexed (bgzip file.vcf && tabix -p vcf file.vcf.gz).",
                    path,
                    e
                )
            })?;
        let header = reader
            .read_header()
            .with_context(|| format!("Failed to read VCF header from {}", path))?;
        Ok(Self { reader, header })
    }

    /// The input VCF header.
    pub fn header(&self) -> &vcf::Header {
        &self.header
    }

    /// True if the header declares the contig.
    pub fn has_contig(&self, name: &str) -> bool {
        self.header.contigs().contains_key(name)
    }

    /// All records on a chromosome, in position order.
    ///
    /// A contig that is declared in the header but absent from the index
    /// simply has no records; that is a skip, not an error.
    pub fn query_chromosome(&mut self, name: &str) -> Result<Vec<RecordBuf>> {
        let region = Region::new(name, ..);
        let query = match self.reader.query(&self.header, &region) {
            Ok(query) => query,
            Err(e) => {
                debug!("No indexed records for {}: {}", name, e);
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::new();
        for result in query {
            let record = result.with_context(|| format!("Error reading record on {}", name))?;
            let buf = RecordBuf::try_from_variant_record(&self.header, &record)
                .with_context(|| format!("Error decoding record on {}", name))?;
            records.push(buf);
        }
        Ok(records)
    }
}

/// Check that the reference genome exists and is non-empty before any output
/// is produced.
pub fn require_reference(path: &str) -> Result<()> {
    let meta = std::fs::metadata(path)
        .map_err(|_| anyhow!("Reference file is missing: {}", path))?;
    if !meta.is_file() || meta.len() == 0 {
        bail!("Reference file is missing or empty: {}", path);
    }
    Ok(())
}

/// Open a FASTA reference, transparently handling BGZF compression
/// (detected by the gzip magic bytes, falling back to plain text).
pub fn open_reference(path: &str) -> Result<fasta::io::Reader<Box<dyn BufRead>>> {
    let mut probe = File::open(path).with_context(|| format!("Failed to open FASTA {}", path))?;
    let mut magic = [0u8; 2];
    let is_gzip = probe.read_exact(&mut magic).is_ok() && magic == [0x1f, 0x8b];

    let file = File::open(path).with_context(|| format!("Failed to open FASTA {}", path))?;
    let inner: Box<dyn BufRead> = if is_gzip {
        Box::new(bgzf::io::Reader::new(file))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(fasta::io::Reader::new(inner))
}
