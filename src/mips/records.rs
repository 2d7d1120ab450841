//! Tab-separated tables passed between pipeline stages.
//!
//! Every table starts with a header line; parsing skips header lines and
//! blank lines so that several tables can be concatenated.

use crate::mips::edits::EditStatus;
use crate::utils::Result;
use std::{fmt, io::BufRead, str::FromStr};

pub trait TableRow: Sized + fmt::Display {
    const HEADER: &'static str;
    fn from_line(line: &str) -> Result<Self>;
}

/// Streams rows of a table, tagging errors with the source and line number.
pub fn read_rows<T: TableRow, R: BufRead>(
    reader: R,
    source: &str,
) -> impl Iterator<Item = Result<T>> {
    let source = source.to_string();
    reader
        .lines()
        .enumerate()
        .filter_map(move |(line_number, result_line)| {
            let line = match result_line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(format!(
                        "Error at {} line {}: {}",
                        source,
                        line_number + 1,
                        e
                    )))
                }
            };
            let line = line.trim_end();
            if line.is_empty() || line == T::HEADER {
                return None;
            }
            Some(
                T::from_line(line)
                    .map_err(|e| format!("Error at {} line {}: {}", source, line_number + 1, e)),
            )
        })
}

fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != expected {
        return Err(format!(
            "Expected {} tab-separated fields, found {}: {}",
            expected,
            fields.len(),
            line
        ));
    }
    Ok(fields)
}

fn parse_field<T: FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| format!("Invalid {} value: '{}'", name, value))
}

fn parse_type(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(kind), None) => Ok(kind),
        _ => Err(format!("Type must be a single character: '{}'", value)),
    }
}

fn check_annotation(seq: &str, qual: &str) -> Result<()> {
    if seq.is_empty() {
        return Err("Empty sequence".into());
    }
    if seq.len() != qual.len() {
        return Err(format!(
            "Sequence has {} characters but quality has {}",
            seq.len(),
            qual.len()
        ));
    }
    Ok(())
}

/// One read encoded against the window of the target it was assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRead {
    pub sample: String,
    pub target: String,
    pub target_type: char,
    pub edits: String,
    pub contig: String,
    pub start: i64,
    pub seq: String,
    pub qual: String,
    pub barcode: String,
}

impl TableRow for AnnotatedRead {
    const HEADER: &'static str =
        "Sample\tMIP\tType\tCRISPR\tContig\tCoordinate\tSequence\tQuality\tTag";

    fn from_line(line: &str) -> Result<Self> {
        let fields = split_fields(line, 9)?;
        check_annotation(fields[6], fields[7])?;
        Ok(AnnotatedRead {
            sample: fields[0].to_string(),
            target: fields[1].to_string(),
            target_type: parse_type(fields[2])?,
            edits: fields[3].to_string(),
            contig: fields[4].to_string(),
            start: parse_field(fields[5], "Coordinate")?,
            seq: fields[6].to_string(),
            qual: fields[7].to_string(),
            barcode: fields[8].to_string(),
        })
    }
}

impl fmt::Display for AnnotatedRead {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.sample,
            self.target,
            self.target_type,
            self.edits,
            self.contig,
            self.start,
            self.seq,
            self.qual,
            self.barcode
        )
    }
}

/// A distinct sequence observed at a target with its support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCount {
    pub sample: String,
    pub target: String,
    pub target_type: char,
    pub edits: String,
    /// `/`-joined contigs the supporting reads were aligned to.
    pub contigs: String,
    /// `/`-joined start coordinates of the supporting annotations.
    pub coords: String,
    pub seq: String,
    pub qual: String,
    pub read_count: u64,
    pub tag_count: u64,
}

impl SequenceCount {
    /// Coordinate the annotation is decoded from; the first one listed.
    pub fn start(&self) -> Result<i64> {
        let first = self.coords.split('/').next().unwrap_or_default();
        parse_field(first, "Coordinate")
    }
}

impl TableRow for SequenceCount {
    const HEADER: &'static str =
        "Sample\tMIP\tType\tCRISPR\tContig\tCoordinate\tSequence\tQuality\tReadCount\tTagCount";

    fn from_line(line: &str) -> Result<Self> {
        let fields = split_fields(line, 10)?;
        check_annotation(fields[6], fields[7])?;
        Ok(SequenceCount {
            sample: fields[0].to_string(),
            target: fields[1].to_string(),
            target_type: parse_type(fields[2])?,
            edits: fields[3].to_string(),
            contigs: fields[4].to_string(),
            coords: fields[5].to_string(),
            seq: fields[6].to_string(),
            qual: fields[7].to_string(),
            read_count: parse_field(fields[8], "ReadCount")?,
            tag_count: parse_field(fields[9], "TagCount")?,
        })
    }
}

impl fmt::Display for SequenceCount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.sample,
            self.target,
            self.target_type,
            self.edits,
            self.contigs,
            self.coords,
            self.seq,
            self.qual,
            self.read_count,
            self.tag_count
        )
    }
}

/// A sequence that passed the depth and allele fraction cutoffs.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalSequence {
    pub count: SequenceCount,
    pub allele_fraction: f64,
}

impl TableRow for FinalSequence {
    const HEADER: &'static str = "Sample\tMIP\tType\tCRISPR\tContig\tCoordinate\tSequence\tQuality\tReadCount\tTagCount\tAlleleFraction";

    fn from_line(line: &str) -> Result<Self> {
        let (count, allele_fraction) = line
            .rsplit_once('\t')
            .ok_or_else(|| format!("Expected 11 tab-separated fields: {}", line))?;
        let allele_fraction: f64 = parse_field(allele_fraction, "AlleleFraction")?;
        if !(0.0..=1.0).contains(&allele_fraction) {
            return Err(format!(
                "AlleleFraction must be between 0 and 1: {}",
                allele_fraction
            ));
        }
        Ok(FinalSequence {
            count: SequenceCount::from_line(count)?,
            allele_fraction,
        })
    }
}

impl fmt::Display for FinalSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{:.6}", self.count, self.allele_fraction)
    }
}

/// Final call for one catalog edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCall {
    pub sample: String,
    pub edit: String,
    pub status: EditStatus,
    pub indel_count: u64,
}

impl TableRow for EditCall {
    const HEADER: &'static str = "Sample\tEdit\tStatus\tIndelCount";

    fn from_line(line: &str) -> Result<Self> {
        let fields = split_fields(line, 4)?;
        Ok(EditCall {
            sample: fields[0].to_string(),
            edit: fields[1].to_string(),
            status: fields[2].parse()?,
            indel_count: parse_field(fields[3], "IndelCount")?,
        })
    }
}

impl fmt::Display for EditCall {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.sample, self.edit, self.status, self.indel_count
        )
    }
}
