use crate::mips::records::{FinalSequence, SequenceCount};

/// Applies the tag depth and allele fraction cutoffs to the sequences of one target.
///
/// Sequences are ordered by tag count, highest first. Allele fractions are
/// computed over the tag counts that pass `min_tags`.
pub fn filter_group(
    mut group: Vec<SequenceCount>,
    min_tags: u64,
    min_allele_fraction: f64,
) -> Vec<FinalSequence> {
    group.sort_by(|a, b| b.tag_count.cmp(&a.tag_count));
    for count in group.iter_mut() {
        if count.tag_count < min_tags {
            count.tag_count = 0;
        }
    }

    let total: u64 = group.iter().map(|count| count.tag_count).sum();
    if total == 0 {
        return Vec::new();
    }

    group
        .into_iter()
        .filter(|count| count.tag_count > 0)
        .map(|count| {
            let allele_fraction = count.tag_count as f64 / total as f64;
            FinalSequence {
                count,
                allele_fraction,
            }
        })
        .filter(|row| row.allele_fraction >= min_allele_fraction)
        .collect()
}
