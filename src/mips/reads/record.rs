//! Module for representing alignment records consumed by the annotation encoder.

use super::cigar::{parse_cigar, query_len, CigarOp, CigarOpExt};
use super::md::{parse_md, MdOp};
use crate::utils::Result;
use rust_htslib::bam::{self, record::Aux};

/// Offset between Phred scores and their SAM text encoding.
pub const PHRED_OFFSET: u8 = 33;

/// A single aligned read together with its mismatch annotation and barcode.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Contig the read is aligned to.
    pub contig: String,
    /// 1-based position of the first aligned reference base.
    pub pos: i64,
    /// Alignment operators.
    pub cigar: Vec<CigarOp>,
    /// Parsed `MD` tag.
    pub md: Vec<MdOp>,
    /// Read bases.
    pub bases: Vec<u8>,
    /// Phred+33 quality characters, one per base.
    pub quals: Vec<u8>,
    /// Molecular barcode of the capture event.
    pub barcode: String,
}

impl AlignmentRecord {
    /// Builds a record from SAM text fields.
    pub fn new(
        contig: &str,
        pos: i64,
        cigar: &str,
        md: &str,
        bases: &str,
        quals: &str,
        barcode: &str,
    ) -> Result<Self> {
        let record = AlignmentRecord {
            contig: contig.to_string(),
            pos,
            cigar: parse_cigar(cigar)?,
            md: parse_md(md)?,
            bases: bases.as_bytes().to_vec(),
            quals: quals.as_bytes().to_vec(),
            barcode: barcode.to_string(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Creates an `AlignmentRecord` from an HTSlib record.
    ///
    /// # Arguments
    /// * `rec` - A mapped BAM record carrying an `MD` tag.
    /// * `contig` - Name of the contig the record is aligned to.
    /// * `barcode_tag` - Aux tag holding the molecular barcode.
    /// * `barcode_len` - Number of barcode characters to keep.
    pub fn from_hts_rec(
        rec: &bam::Record,
        contig: &str,
        barcode_tag: &[u8],
        barcode_len: usize,
    ) -> Result<Self> {
        let md = match rec.aux(b"MD") {
            Ok(Aux::String(value)) => parse_md(value)?,
            Ok(_) => return Err("MD tag is not a string".into()),
            Err(_) => return Err("Missing MD tag".into()),
        };
        let barcode = match rec.aux(barcode_tag) {
            Ok(Aux::String(value)) => parse_barcode(value, barcode_len)?,
            _ => {
                return Err(format!(
                    "Missing {} barcode tag",
                    String::from_utf8_lossy(barcode_tag)
                ))
            }
        };

        let quals = rec.qual();
        if quals.first() == Some(&255) {
            return Err("Read has no base qualities".into());
        }

        let record = AlignmentRecord {
            contig: contig.to_string(),
            pos: rec.pos() + 1,
            cigar: rec.cigar().take().to_vec(),
            md,
            bases: rec.seq().as_bytes(),
            quals: quals.iter().map(|q| q.saturating_add(PHRED_OFFSET)).collect(),
            barcode,
        };
        record.validate()?;
        Ok(record)
    }

    /// Number of reference bases spanned by the alignment.
    pub fn ref_span(&self) -> i64 {
        self.cigar.iter().map(|op| op.get_ref_len()).sum()
    }

    fn validate(&self) -> Result<()> {
        if self.bases.len() != self.quals.len() {
            return Err(format!(
                "Read has {} bases but {} qualities",
                self.bases.len(),
                self.quals.len()
            ));
        }
        let cigar_len = query_len(&self.cigar);
        if cigar_len != self.bases.len() {
            return Err(format!(
                "CIGAR consumes {} bases but the read has {}",
                cigar_len,
                self.bases.len()
            ));
        }
        Ok(())
    }
}

/// Barcode tags may carry a leading `$` before the barcode itself.
fn parse_barcode(value: &str, barcode_len: usize) -> Result<String> {
    let barcode = value.strip_prefix('$').unwrap_or(value);
    match barcode.get(..barcode_len) {
        Some(barcode) => Ok(barcode.to_string()),
        None => Err(format!(
            "Barcode '{}' is shorter than {} bases",
            barcode, barcode_len
        )),
    }
}
