//! Capture counts for guide constructs integrated into a sample's genome.
//!
//! Every contig of a guide target table is one construct; the targets on it
//! are the construct's probes, numbered in table order.

use crate::mips::records::FinalSequence;
use crate::mips::target::TargetCatalog;
use std::{collections::HashMap, fmt};

/// Tag counts of one construct's probes.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideCount {
    pub guide: String,
    /// One slot per probe column; `None` past this construct's last probe.
    pub counts: Vec<Option<u64>>,
}

impl fmt::Display for GuideCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.guide)?;
        for count in &self.counts {
            match count {
                Some(count) => write!(f, "\t{}", count)?,
                None => write!(f, "\tNA")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct GuideCounter {
    guides: Vec<String>,
    counts: Vec<Vec<u64>>,
    probes: HashMap<String, (usize, usize)>,
}

impl GuideCounter {
    pub fn new(targets: &TargetCatalog) -> Self {
        let mut counter = GuideCounter::default();
        let mut by_contig: HashMap<&str, usize> = HashMap::new();
        for target in targets.iter() {
            let contig = target.window.contig.as_str();
            let guide = match by_contig.get(contig) {
                Some(&guide) => guide,
                None => {
                    counter.guides.push(contig.to_string());
                    counter.counts.push(Vec::new());
                    by_contig.insert(contig, counter.guides.len() - 1);
                    counter.guides.len() - 1
                }
            };
            let slot = counter.counts[guide].len();
            counter.counts[guide].push(0);
            if counter.probes.contains_key(&target.name) {
                log::warn!("Target {} is listed more than once; keeping the first", target.name);
                continue;
            }
            counter.probes.insert(target.name.clone(), (guide, slot));
        }
        counter
    }

    /// Adds the sequence's tags to its probe.
    ///
    /// Returns `false` if the sequence's target is not a probe of any construct.
    pub fn add(&mut self, row: &FinalSequence) -> bool {
        match self.probes.get(&row.count.target) {
            Some(&(guide, slot)) => {
                self.counts[guide][slot] += row.count.tag_count;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }

    /// Largest number of probes on any construct.
    pub fn max_probes(&self) -> usize {
        self.counts.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn header(&self) -> String {
        let mut header = "Guide".to_string();
        for probe in 1..=self.max_probes() {
            header.push_str(&format!("\tMIP{}_Count", probe));
        }
        header
    }

    pub fn rows(&self) -> Vec<GuideCount> {
        let width = self.max_probes();
        self.guides
            .iter()
            .zip(&self.counts)
            .map(|(guide, counts)| GuideCount {
                guide: guide.clone(),
                counts: (0..width).map(|slot| counts.get(slot).copied()).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::records::SequenceCount;
    use std::io::Cursor;

    const TARGETS: &str = "\
Name\tSequence\tContig\tStart\tEnd\tType\tCRISPR\tStrand\tArm1Length\tTargetLength
sgCHD8_MIP_0001\tACGT\tsgCHD8\t10\t200\tG\tnone\t+\t20\t100
sgCHD8_MIP_0002\tACGT\tsgCHD8\t150\t350\tG\tnone\t+\t20\t100
sgCHD8_MIP_0003\tACGT\tsgCHD8\t300\t500\tG\tnone\t-\t20\t100
sgPTEN_MIP_0001\tACGT\tsgPTEN\t10\t200\tG\tnone\t+\t20\t100
";

    fn final_row(target: &str, tag_count: u64) -> FinalSequence {
        FinalSequence {
            count: SequenceCount {
                sample: "S1".to_string(),
                target: target.to_string(),
                target_type: 'G',
                edits: "none".to_string(),
                contigs: "sgCHD8".to_string(),
                coords: "30".to_string(),
                seq: "=acgt".to_string(),
                qual: "\"IIII".to_string(),
                read_count: tag_count * 2,
                tag_count,
            },
            allele_fraction: 1.0,
        }
    }

    fn counter() -> GuideCounter {
        let targets = TargetCatalog::from_reader(Cursor::new(TARGETS), "guides.txt").unwrap();
        GuideCounter::new(&targets)
    }

    #[test]
    fn probes_are_grouped_by_construct() {
        let counter = counter();
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.max_probes(), 3);
        assert_eq!(counter.header(), "Guide\tMIP1_Count\tMIP2_Count\tMIP3_Count");
    }

    #[test]
    fn tags_accumulate_per_probe() {
        let mut counter = counter();
        assert!(counter.add(&final_row("sgCHD8_MIP_0002", 7)));
        assert!(counter.add(&final_row("sgCHD8_MIP_0002", 3)));
        assert!(counter.add(&final_row("sgPTEN_MIP_0001", 4)));
        assert!(!counter.add(&final_row("CHD8_MIP_0001", 9)));

        let rows = counter.rows();
        assert_eq!(rows[0].counts, vec![Some(0), Some(10), Some(0)]);
        assert_eq!(rows[1].counts, vec![Some(4), None, None]);
        assert_eq!(rows[0].to_string(), "sgCHD8\t0\t10\t0");
        assert_eq!(rows[1].to_string(), "sgPTEN\t4\tNA\tNA");
    }
}
