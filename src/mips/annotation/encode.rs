use super::{Annotation, DELETION, INSERTION, MARKER_QUAL, MATCH, SUBSTITUTION};
use crate::mips::reads::{AlignedBase, AlignmentRecord, CigarOp, MdCursor};
use crate::utils::{GenomicRegion, Result};

/// Encodes the part of an alignment that falls inside a target window.
///
/// Returns `None` when the record does not intersect the window or when its
/// CIGAR, `MD` tag, and bases disagree with one another.
pub fn encode(record: &AlignmentRecord, window: &GenomicRegion) -> Option<Annotation> {
    if record.contig != window.contig
        || record.pos >= window.end
        || record.pos + record.ref_span() <= window.start
    {
        log::trace!(
            "Read at {}:{} does not overlap {}",
            record.contig,
            record.pos,
            window
        );
        return None;
    }

    match Encoder::new(record, window).run() {
        Ok(annotation) => annotation,
        Err(err) => {
            log::debug!(
                "Skipping read at {}:{} ({}): {}",
                record.contig,
                record.pos,
                record.barcode,
                err
            );
            None
        }
    }
}

struct Encoder<'a> {
    record: &'a AlignmentRecord,
    window: &'a GenomicRegion,
    window_len: i64,
    ref_offset: i64,
    read_pos: usize,
    md: MdCursor,
    start: Option<i64>,
    seq: Vec<u8>,
    qual: Vec<u8>,
    in_match_run: bool,
}

impl<'a> Encoder<'a> {
    fn new(record: &'a AlignmentRecord, window: &'a GenomicRegion) -> Self {
        Self {
            record,
            window,
            window_len: window.len(),
            ref_offset: record.pos - window.start,
            read_pos: 0,
            md: MdCursor::new(&record.md),
            start: None,
            seq: Vec::new(),
            qual: Vec::new(),
            in_match_run: false,
        }
    }

    fn run(mut self) -> Result<Option<Annotation>> {
        let record = self.record;
        for op in &record.cigar {
            match *op {
                CigarOp::Match(len) | CigarOp::Equal(len) | CigarOp::Diff(len) => {
                    self.aligned(len as usize)?
                }
                CigarOp::Ins(len) => self.insertion(len as usize)?,
                CigarOp::Del(len) => self.deletion(len as usize)?,
                CigarOp::SoftClip(len) => self.read_pos += len as usize,
                CigarOp::RefSkip(len) => self.ref_skip(len as i64)?,
                CigarOp::HardClip(_) | CigarOp::Pad(_) => {}
            }
        }

        if self.read_pos != record.bases.len() {
            return Err(format!(
                "CIGAR consumed {} of {} read bases",
                self.read_pos,
                record.bases.len()
            ));
        }

        let start = match self.start {
            Some(start) => start,
            None => return Ok(None),
        };
        let seq = String::from_utf8(self.seq).map_err(|_| "Read has non-ASCII bases")?;
        let qual = String::from_utf8(self.qual).map_err(|_| "Read has non-ASCII qualities")?;
        Ok(Some(Annotation { start, seq, qual }))
    }

    fn in_window(&self, offset: i64) -> bool {
        self.window.contains(self.window.start + offset)
    }

    fn open_token(&mut self, marker: u8, offset: i64) {
        if self.start.is_none() {
            self.start = Some(self.window.start + offset);
        }
        self.seq.push(marker);
        self.qual.push(MARKER_QUAL);
    }

    fn read_base(&self) -> Result<(u8, u8)> {
        match (
            self.record.bases.get(self.read_pos),
            self.record.quals.get(self.read_pos),
        ) {
            (Some(&base), Some(&qual)) => Ok((base, qual)),
            _ => Err(format!("Read cursor {} ran past the bases", self.read_pos)),
        }
    }

    fn aligned(&mut self, len: usize) -> Result<()> {
        self.in_match_run = false;
        for _ in 0..len {
            let (base, qual) = self.read_base()?;
            let aligned = self.md.next_aligned()?;
            if self.in_window(self.ref_offset) {
                match aligned {
                    AlignedBase::Match => {
                        if !self.in_match_run {
                            self.open_token(MATCH, self.ref_offset);
                            self.in_match_run = true;
                        }
                        self.seq.push(base.to_ascii_lowercase());
                        self.qual.push(qual);
                    }
                    AlignedBase::Mismatch(ref_base) => {
                        self.open_token(SUBSTITUTION, self.ref_offset);
                        self.seq.push(ref_base.to_ascii_uppercase());
                        self.seq.push(base.to_ascii_lowercase());
                        self.qual.extend([qual, qual]);
                        self.in_match_run = false;
                    }
                }
            }
            self.ref_offset += 1;
            self.read_pos += 1;
        }
        Ok(())
    }

    /// Skipped reference bases leave no trace in an annotation, so a skip may
    /// only fall outside the window.
    fn ref_skip(&mut self, len: i64) -> Result<()> {
        let end = self.ref_offset + len;
        if self.ref_offset < self.window_len && end > 0 {
            return Err(format!(
                "Reference skip of {} bases overlaps the window at {}",
                len,
                self.window.start + self.ref_offset.max(0)
            ));
        }
        self.ref_offset = end;
        self.in_match_run = false;
        Ok(())
    }

    fn insertion(&mut self, len: usize) -> Result<()> {
        let record = self.record;
        let end = self.read_pos + len;
        let (bases, quals) = match (
            record.bases.get(self.read_pos..end),
            record.quals.get(self.read_pos..end),
        ) {
            (Some(bases), Some(quals)) => (bases, quals),
            _ => return Err(format!("Insertion runs past the read end at {}", end)),
        };

        if self.in_window(self.ref_offset) {
            self.open_token(INSERTION, self.ref_offset);
            self.seq.extend(bases.iter().map(u8::to_ascii_lowercase));
            self.qual.extend_from_slice(quals);
            self.in_match_run = false;
        }
        self.read_pos = end;
        Ok(())
    }

    fn deletion(&mut self, len: usize) -> Result<()> {
        let deleted = self.md.take_deletion(len)?;
        let qual = self.flanking_qual()?;

        let first = (-self.ref_offset).clamp(0, len as i64) as usize;
        let last = (self.window_len - self.ref_offset).clamp(0, len as i64) as usize;
        if first < last {
            self.open_token(DELETION, self.ref_offset + first as i64);
            self.seq.extend_from_slice(&deleted[first..last]);
            self.qual.extend(std::iter::repeat(qual).take(last - first));
            self.in_match_run = false;
        }
        self.ref_offset += len as i64;
        Ok(())
    }

    /// Mean quality of the read bases on either side of a deletion.
    fn flanking_qual(&self) -> Result<u8> {
        let quals = &self.record.quals;
        let before = self.read_pos.checked_sub(1).and_then(|i| quals.get(i));
        let after = quals.get(self.read_pos);
        match (before, after) {
            (Some(&a), Some(&b)) => Ok(((a as u16 + b as u16) / 2) as u8),
            (Some(&q), None) | (None, Some(&q)) => Ok(q),
            (None, None) => Err("Deletion in a read without bases".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::annotation::decode;

    fn window(start: i64, end: i64) -> GenomicRegion {
        GenomicRegion::new("chr1", start, end).unwrap()
    }

    fn record(pos: i64, cigar: &str, md: &str, bases: &str, quals: &str) -> AlignmentRecord {
        AlignmentRecord::new("chr1", pos, cigar, md, bases, quals, "ACGTACGT").unwrap()
    }

    #[test]
    fn substitution_inside_window() {
        let rec = record(100, "20M", "8A11", "CCCCCCCCTCCCCCCCCCCC", &"I".repeat(20));
        let annotation = encode(&rec, &window(100, 120)).unwrap();
        assert_eq!(annotation.start, 100);
        assert_eq!(annotation.seq, "=cccccccc*At=ccccccccccc");
        assert_eq!(annotation.qual, "\"IIIIIIII\"II\"IIIIIIIIIII");
    }

    #[test]
    fn bases_outside_window_are_dropped() {
        let rec = record(95, "20M", "20", "ACGTACGTACGTACGTACGT", &"I".repeat(20));
        let annotation = encode(&rec, &window(100, 110)).unwrap();
        assert_eq!(annotation.start, 100);
        assert_eq!(annotation.seq, "=cgtacgtacg");
        assert_eq!(annotation.qual.len(), annotation.seq.len());
    }

    #[test]
    fn indels_and_soft_clips() {
        let rec = record(100, "2S3M2I2M1D3M", "5^G3", "GGACGTTCATCA", "!!ABCDEFGHIJ");
        let annotation = encode(&rec, &window(100, 120)).unwrap();
        assert_eq!(annotation.seq, "=acg+tt=ca-G=tca");
        assert_eq!(annotation.qual, "\"ABC\"DE\"FG\"G\"HIJ");
    }

    #[test]
    fn deletion_straddling_window_end_is_clipped() {
        let rec = record(100, "3M3D2M", "3^CAT2", "ACGTT", "IIIII");
        let annotation = encode(&rec, &window(100, 104)).unwrap();
        assert_eq!(annotation.seq, "=acg-C");
        assert_eq!(annotation.qual, "\"III\"I");
    }

    #[test]
    fn deletion_straddling_window_start_sets_start() {
        let rec = record(96, "2M3D4M", "2^CAT4", "ACGTAC", "IIIIII");
        let annotation = encode(&rec, &window(100, 110)).unwrap();
        assert_eq!(annotation.start, 100);
        assert_eq!(annotation.seq, "-T=gtac");
    }

    #[test]
    fn deletion_quality_uses_flanks_outside_window() {
        let rec = record(96, "2M3D4M", "2^CAT4", "ACGTAC", "!5IIII");
        let annotation = encode(&rec, &window(100, 110)).unwrap();
        assert_eq!(annotation.seq, "-T=gtac");
        // (53 + 73) / 2
        assert_eq!(annotation.qual, "\"?\"IIII");
    }

    #[test]
    fn reference_skip_in_window_yields_nothing() {
        let rec = record(100, "2M3N2M", "4", "ACGT", "IIII");
        assert_eq!(encode(&rec, &window(100, 120)), None);
        let rec = record(96, "2M6N2M", "4", "ACGT", "IIII");
        assert_eq!(encode(&rec, &window(100, 120)), None);
    }

    #[test]
    fn reference_skip_before_window_keeps_coordinates() {
        let rec = record(90, "2M5N4M", "6", "ACGTAC", "IIIIII");
        let annotation = encode(&rec, &window(100, 110)).unwrap();
        assert_eq!(annotation.start, 100);
        assert_eq!(annotation.seq, "=c");
    }

    #[test]
    fn read_outside_window_yields_nothing() {
        let rec = record(200, "4M", "4", "ACGT", "IIII");
        assert_eq!(encode(&rec, &window(100, 120)), None);
        let rec = record(100, "4M", "4", "ACGT", "IIII");
        let other = GenomicRegion::new("chr2", 100, 120).unwrap();
        assert_eq!(encode(&rec, &other), None);
    }

    #[test]
    fn inconsistent_md_yields_nothing() {
        let rec = record(100, "20M", "10", "ACGTACGTACGTACGTACGT", &"I".repeat(20));
        assert_eq!(encode(&rec, &window(100, 120)), None);
        let rec = record(100, "2M1D2M", "4", "ACGT", "IIII");
        assert_eq!(encode(&rec, &window(100, 120)), None);
    }

    #[test]
    fn decoding_recovers_reference_and_read() {
        let reference = b"ACGCAGTCA";
        let read = b"ACGTTCATCA";
        let rec = record(100, "2S3M2I2M1D3M", "5^G3", "GGACGTTCATCA", "!!ABCDEFGHIJ");
        let annotation = encode(&rec, &window(100, 120)).unwrap();
        let aligned = decode(&annotation.seq, annotation.start).unwrap();

        let mut read_pos = 0;
        for i in 0..aligned.len() {
            if let Some(coord) = aligned.coords[i] {
                assert_eq!(aligned.ref_seq[i], reference[(coord - 100) as usize]);
            }
            if aligned.obs_seq[i] != b'-' {
                assert_eq!(aligned.obs_seq[i], read[read_pos]);
                read_pos += 1;
            }
        }
        assert_eq!(read_pos, read.len());
    }
}
