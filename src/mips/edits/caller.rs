use super::catalog::{edit_names, ContigOffsets, EditCatalog, EditKind};
use super::status::{EditTally, Evidence};
use crate::mips::annotation::{decode, AlignedAnnotation, GAP};
use crate::mips::records::{EditCall, FinalSequence};

/// Accumulates per-edit calls for one sample over its final sequences.
pub struct EditCaller {
    catalog: EditCatalog,
    offsets: ContigOffsets,
    flank_len: usize,
    tallies: Vec<EditTally>,
}

impl EditCaller {
    pub fn new(catalog: EditCatalog, offsets: ContigOffsets, flank_len: usize) -> Self {
        let tallies = vec![EditTally::default(); catalog.len()];
        EditCaller {
            catalog,
            offsets,
            flank_len,
            tallies,
        }
    }

    /// Updates the calls of every catalog edit the sequence's target reports on.
    ///
    /// Returns `false` if the sequence names no catalog edit or cannot be decoded.
    pub fn process(&mut self, row: &FinalSequence) -> bool {
        let count = &row.count;
        let edits: Vec<&str> = edit_names(&count.edits)
            .filter(|name| self.catalog.get(name).is_some())
            .collect();
        if edits.is_empty() {
            return false;
        }

        let start = match count.start() {
            Ok(start) => start,
            Err(e) => {
                log::warn!("Skipping sequence of {}: {}", count.target, e);
                return false;
            }
        };
        let aligned = match decode(&count.seq, start) {
            Ok(aligned) => aligned,
            Err(e) => {
                log::warn!("Skipping sequence of {}: {}", count.target, e);
                return false;
            }
        };
        let contig = count.contigs.split('/').next().unwrap_or_default();

        for name in edits {
            let (index, entry) = match self.catalog.get(name) {
                Some(found) => found,
                None => continue,
            };
            let evidence = match &entry.kind {
                EditKind::Indel => {
                    if aligned.has_indel() {
                        Evidence::Indel
                    } else {
                        Evidence::NoIndel
                    }
                }
                EditKind::Prime(edit) => {
                    if self.offsets.chrom(contig) != Some(edit.chrom.as_str()) {
                        log::debug!(
                            "Contig {} is not placed on {}; skipping {} at {}",
                            contig,
                            edit.chrom,
                            name,
                            count.target
                        );
                        continue;
                    }
                    let chrom_start = match self.offsets.to_chrom_coord(contig, start) {
                        Some(chrom_start) => chrom_start,
                        None => continue,
                    };
                    let position = edit.position - (chrom_start - start);
                    if matches_prime_edit(
                        &aligned,
                        position,
                        &edit.ref_allele,
                        &edit.alt_allele,
                        self.flank_len,
                    ) {
                        Evidence::PrimeEdit
                    } else {
                        Evidence::NoPrimeEdit
                    }
                }
            };
            log::trace!("{} at {}: {:?}", name, count.target, evidence);
            self.tallies[index].record(evidence);
        }
        true
    }

    pub fn calls(&self, sample: &str) -> Vec<EditCall> {
        self.catalog
            .iter()
            .zip(self.tallies.iter())
            .map(|(entry, tally)| EditCall {
                sample: sample.to_string(),
                edit: entry.name.clone(),
                status: tally.status,
                indel_count: tally.indel_count,
            })
            .collect()
    }
}

/// Checks for an exact substitution at `position` with identical flanks.
///
/// The flank shrinks when the variant column sits closer than `flank_len`
/// to the start of the alignment. A right flank that is not covered by the
/// alignment is treated as identical.
pub fn matches_prime_edit(
    aligned: &AlignedAnnotation,
    position: i64,
    ref_allele: &[u8],
    alt_allele: &[u8],
    flank_len: usize,
) -> bool {
    let column = match aligned.column_of(position) {
        Some(column) => column,
        None => return false,
    };

    let ref_segment = take_bases(aligned.ref_seq[column..].iter(), ref_allele.len());
    let alt_segment = take_bases(aligned.obs_seq[column..].iter(), alt_allele.len());
    if ref_segment != ref_allele || alt_segment != alt_allele {
        return false;
    }

    let flank_len = flank_len.min(column);
    let left_ref = take_bases(aligned.ref_seq[..column].iter().rev(), flank_len);
    let left_obs = take_bases(aligned.obs_seq[..column].iter().rev(), flank_len);
    if left_ref != left_obs {
        return false;
    }

    match aligned.column_of(position + ref_allele.len() as i64) {
        Some(right) => {
            take_bases(aligned.ref_seq[right..].iter(), flank_len)
                == take_bases(aligned.obs_seq[right..].iter(), flank_len)
        }
        None => true,
    }
}

/// First `count` non-gap bases.
fn take_bases<'a>(bases: impl Iterator<Item = &'a u8>, count: usize) -> Vec<u8> {
    bases.copied().filter(|&b| b != GAP).take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::edits::EditStatus;
    use crate::mips::records::SequenceCount;
    use std::io::Cursor;

    fn aligned(annotation: &str, start: i64) -> AlignedAnnotation {
        decode(annotation, start).unwrap()
    }

    fn final_row(edits: &str, start: i64, seq: &str) -> FinalSequence {
        FinalSequence {
            count: SequenceCount {
                sample: "S1".to_string(),
                target: "MIP_1".to_string(),
                target_type: 'C',
                edits: edits.to_string(),
                contigs: "chrCHD8".to_string(),
                coords: start.to_string(),
                seq: seq.to_string(),
                qual: "\"".repeat(seq.len()),
                read_count: 4,
                tag_count: 2,
            },
            allele_fraction: 0.5,
        }
    }

    fn caller() -> EditCaller {
        let sites = "chr14\t1100\tg1\nchr14\t2100\tpe1\nchr14\t3100\tg2\n";
        let prime = "chrom\tcoord\tref\talt\tname\nchr14\t2100\tA\tG\tpe1\n";
        let offsets = "chrCHD8\tchr14\t2001\n";
        let mut catalog = EditCatalog::from_reader(Cursor::new(sites), "sites").unwrap();
        catalog.add_prime_edits(Cursor::new(prime), "prime").unwrap();
        let offsets = ContigOffsets::from_reader(Cursor::new(offsets), "offsets").unwrap();
        EditCaller::new(catalog, offsets, 5)
    }

    fn status_of(caller: &EditCaller, edit: &str) -> (EditStatus, u64) {
        let calls = caller.calls("S1");
        let call = calls.iter().find(|c| c.edit == edit).unwrap();
        (call.status, call.indel_count)
    }

    #[test]
    fn substitution_with_matching_flanks() {
        let read = aligned("=ccccc*Ag=ccccc", 95);
        assert!(matches_prime_edit(&read, 100, b"A", b"G", 5));
        assert!(!matches_prime_edit(&read, 100, b"A", b"T", 5));
        assert!(!matches_prime_edit(&read, 101, b"A", b"G", 5));
        assert!(!matches_prime_edit(&read, 150, b"A", b"G", 5));
    }

    #[test]
    fn flank_differences_block_the_call() {
        let left = aligned("=cc*Ct=cc*Ag=ccccc", 95);
        assert!(!matches_prime_edit(&left, 100, b"A", b"G", 5));
        let right = aligned("=ccccc*Ag=cc*Ca=cc", 95);
        assert!(!matches_prime_edit(&right, 100, b"A", b"G", 5));
        let right_insertion = aligned("=ccccc*Ag=c+a=cccc", 95);
        assert!(!matches_prime_edit(&right_insertion, 100, b"A", b"G", 5));
        let right_deletion = aligned("=ccccc*Ag=cc-C=cc", 95);
        assert!(!matches_prime_edit(&right_deletion, 100, b"A", b"G", 5));
        let far = aligned("*Ct=cccccc*Ag=ccccc", 93);
        assert!(matches_prime_edit(&far, 100, b"A", b"G", 5));
    }

    #[test]
    fn flank_shrinks_near_alignment_start() {
        let read = aligned("=cc*Ag=ccccc", 98);
        assert!(matches_prime_edit(&read, 100, b"A", b"G", 5));
        let read = aligned("*Ag=ccccc", 100);
        assert!(matches_prime_edit(&read, 100, b"A", b"G", 5));
    }

    #[test]
    fn right_flank_outside_alignment_counts_as_identical() {
        let read = aligned("=ccccc*Ag", 95);
        assert!(matches_prime_edit(&read, 100, b"A", b"G", 5));
    }

    #[test]
    fn insertion_and_deletion_prime_edits() {
        let insertion = aligned("=cccccc+tt=ggggg", 95);
        assert!(matches_prime_edit(&insertion, 100, b"C", b"CTT", 5));
        assert!(!matches_prime_edit(&insertion, 100, b"C", b"CTA", 5));
        let deletion = aligned("=cccccc-AG=ggggg", 95);
        assert!(matches_prime_edit(&deletion, 100, b"CAG", b"C", 5));
        assert!(!matches_prime_edit(&deletion, 100, b"CAT", b"C", 5));
    }

    #[test]
    fn indel_edits_count_every_indel_sequence() {
        let mut caller = caller();
        assert!(caller.process(&final_row("g1", 1, "=acg+tt=ca")));
        assert!(caller.process(&final_row("g1", 1, "=acgca")));
        assert!(caller.process(&final_row("g1/none", 1, "=ac-G=ca")));
        assert_eq!(status_of(&caller, "g1"), (EditStatus::HasIndel, 2));
        assert_eq!(status_of(&caller, "g2"), (EditStatus::Uncallable, 0));
    }

    #[test]
    fn first_negative_call_is_kept() {
        let mut caller = caller();
        caller.process(&final_row("g2", 1, "=acgca"));
        caller.process(&final_row("g2", 1, "*At=cgca"));
        assert_eq!(status_of(&caller, "g2"), (EditStatus::NoIndel, 0));
    }

    #[test]
    fn unknown_and_placeholder_edits_are_ignored() {
        let mut caller = caller();
        assert!(!caller.process(&final_row("none", 1, "=acg+tt=ca")));
        assert!(!caller.process(&final_row("PB-1/plasmid/g9", 1, "=acg+tt=ca")));
        assert!(!caller.process(&final_row("g1", 1, "acg")));
        assert!(caller
            .calls("S1")
            .iter()
            .all(|call| call.status == EditStatus::Uncallable));
    }

    #[test]
    fn prime_edit_uses_chromosome_coordinates() {
        let mut caller = caller();
        // local 100 is chr14:2100
        caller.process(&final_row("pe1", 95, "=cc*Ct=cc*Ag=ccccc"));
        assert_eq!(status_of(&caller, "pe1").0, EditStatus::NoPrimeEdit);
        caller.process(&final_row("pe1", 95, "=ccccc*Ag=ccccc"));
        assert_eq!(status_of(&caller, "pe1").0, EditStatus::HasPrimeEdit);
        caller.process(&final_row("pe1", 95, "=cccccaccccc"));
        assert_eq!(status_of(&caller, "pe1").0, EditStatus::HasPrimeEdit);
    }

    #[test]
    fn prime_edit_on_unknown_contig_is_skipped() {
        let mut caller = caller();
        let mut row = final_row("pe1", 95, "=ccccc*Ag=ccccc");
        row.count.contigs = "chrOther".to_string();
        caller.process(&row);
        assert_eq!(status_of(&caller, "pe1").0, EditStatus::Uncallable);
    }

    #[test]
    fn prime_edit_on_contig_of_another_chromosome_is_skipped() {
        let sites = "chr14\t2100\tpe1\n";
        let prime = "chrom\tcoord\tref\talt\tname\nchr14\t2100\tA\tG\tpe1\n";
        let offsets = "chrCHD8\tchr14\t2001\nchrSHANK3\tchr22\t2001\n";
        let mut catalog = EditCatalog::from_reader(Cursor::new(sites), "sites").unwrap();
        catalog.add_prime_edits(Cursor::new(prime), "prime").unwrap();
        let offsets = ContigOffsets::from_reader(Cursor::new(offsets), "offsets").unwrap();
        let mut caller = EditCaller::new(catalog, offsets, 5);

        let mut row = final_row("pe1", 95, "=ccccc*Ag=ccccc");
        row.count.contigs = "chrSHANK3".to_string();
        assert!(caller.process(&row));
        assert_eq!(status_of(&caller, "pe1").0, EditStatus::Uncallable);

        row.count.contigs = "chrCHD8".to_string();
        caller.process(&row);
        assert_eq!(status_of(&caller, "pe1").0, EditStatus::HasPrimeEdit);
    }

    #[test]
    fn encoded_read_round_trips_into_a_call() {
        use crate::mips::annotation::encode;
        use crate::mips::reads::AlignmentRecord;
        use crate::utils::GenomicRegion;

        let record = AlignmentRecord::new(
            "chrCHD8",
            91,
            "20M",
            "9A10",
            "CCCCCCCCCGCCCCCCCCCC",
            &"I".repeat(20),
            "ACGTACGT",
        )
        .unwrap();
        let window = GenomicRegion::new("chrCHD8", 95, 110).unwrap();
        let annotation = encode(&record, &window).unwrap();
        assert_eq!(annotation.seq, "=ccccc*Ag=ccccccccc");

        let mut caller = caller();
        caller.process(&final_row("pe1", annotation.start, &annotation.seq));
        assert_eq!(status_of(&caller, "pe1").0, EditStatus::HasPrimeEdit);
    }
}
