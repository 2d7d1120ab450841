use crate::mips::records::{AnnotatedRead, SequenceCount};
use crate::utils::Result;
use std::collections::{HashMap, HashSet};
use std::iter::Peekable;

/// Support accumulated for one distinct annotation at a target.
#[derive(Debug, Clone)]
pub struct DistinctSequence {
    pub seq: String,
    qual_sums: Vec<u64>,
    pub read_count: u64,
    pub tag_count: u64,
    barcodes: HashSet<String>,
    contigs: Vec<String>,
    coords: Vec<i64>,
}

impl DistinctSequence {
    fn new(read: &AnnotatedRead) -> Self {
        DistinctSequence {
            seq: read.seq.clone(),
            qual_sums: read.qual.bytes().map(u64::from).collect(),
            read_count: 1,
            tag_count: 1,
            barcodes: HashSet::from([read.barcode.clone()]),
            contigs: vec![read.contig.clone()],
            coords: vec![read.start],
        }
    }

    fn add(&mut self, read: &AnnotatedRead) {
        self.read_count += 1;
        if self.barcodes.insert(read.barcode.clone()) {
            self.tag_count += 1;
        }
        for (sum, qual) in self.qual_sums.iter_mut().zip(read.qual.bytes()) {
            *sum += u64::from(qual);
        }
        if !self.contigs.contains(&read.contig) {
            self.contigs.push(read.contig.clone());
        }
        if !self.coords.contains(&read.start) {
            self.coords.push(read.start);
        }
    }

    /// Per-character quality averaged over all supporting reads.
    pub fn mean_qual(&self) -> String {
        self.qual_sums
            .iter()
            .map(|sum| (sum / self.read_count) as u8 as char)
            .collect()
    }

    pub fn contig_label(&self) -> String {
        self.contigs.join("/")
    }

    pub fn coord_label(&self) -> String {
        self.coords
            .iter()
            .map(|coord| coord.to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Distinct annotations of one target in first-seen order.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    sequences: Vec<DistinctSequence>,
    index: HashMap<String, usize>,
}

impl SequenceCounter {
    pub fn add(&mut self, read: &AnnotatedRead) {
        match self.index.get(&read.seq) {
            Some(&i) => self.sequences[i].add(read),
            None => {
                self.index.insert(read.seq.clone(), self.sequences.len());
                self.sequences.push(DistinctSequence::new(read));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DistinctSequence> {
        self.sequences.iter()
    }
}

/// Counts for one target together with the target's descriptive fields.
#[derive(Debug)]
pub struct TargetCounts {
    pub target: String,
    pub target_type: char,
    pub edits: String,
    pub counter: SequenceCounter,
}

impl TargetCounts {
    fn new(read: &AnnotatedRead) -> Self {
        TargetCounts {
            target: read.target.clone(),
            target_type: read.target_type,
            edits: read.edits.clone(),
            counter: SequenceCounter::default(),
        }
    }

    pub fn to_rows(&self, sample: &str) -> Vec<SequenceCount> {
        self.counter
            .iter()
            .map(|sequence| SequenceCount {
                sample: sample.to_string(),
                target: self.target.clone(),
                target_type: self.target_type,
                edits: self.edits.clone(),
                contigs: sequence.contig_label(),
                coords: sequence.coord_label(),
                seq: sequence.seq.clone(),
                qual: sequence.mean_qual(),
                read_count: sequence.read_count,
                tag_count: sequence.tag_count,
            })
            .collect()
    }
}

/// Sample-wide counts; reads of a target need not be contiguous.
#[derive(Debug, Default)]
pub struct SampleCounts {
    targets: Vec<TargetCounts>,
    index: HashMap<String, usize>,
}

impl SampleCounts {
    pub fn add(&mut self, read: &AnnotatedRead) {
        let i = match self.index.get(&read.target) {
            Some(&i) => i,
            None => {
                self.index.insert(read.target.clone(), self.targets.len());
                self.targets.push(TargetCounts::new(read));
                self.targets.len() - 1
            }
        };
        self.targets[i].counter.add(read);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetCounts> {
        self.targets.iter()
    }
}

/// Streams per-target counts from reads already grouped by target.
///
/// A target that reappears after its group has ended is an error.
pub struct GroupedCounts<I: Iterator<Item = Result<AnnotatedRead>>> {
    reads: Peekable<I>,
    finished: HashSet<String>,
}

impl<I: Iterator<Item = Result<AnnotatedRead>>> GroupedCounts<I> {
    pub fn new(reads: I) -> Self {
        GroupedCounts {
            reads: reads.peekable(),
            finished: HashSet::new(),
        }
    }
}

impl<I: Iterator<Item = Result<AnnotatedRead>>> Iterator for GroupedCounts<I> {
    type Item = Result<TargetCounts>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.reads.next()? {
            Ok(read) => read,
            Err(e) => return Some(Err(e)),
        };
        if self.finished.contains(&first.target) {
            return Some(Err(format!(
                "Reads of target {} are not grouped together",
                first.target
            )));
        }

        let mut group = TargetCounts::new(&first);
        group.counter.add(&first);
        while let Some(Ok(read)) = self.reads.peek() {
            if read.target != group.target {
                break;
            }
            group.counter.add(read);
            self.reads.next();
        }
        if let Some(Err(_)) = self.reads.peek() {
            if let Some(Err(e)) = self.reads.next() {
                return Some(Err(e));
            }
        }

        self.finished.insert(group.target.clone());
        Some(Ok(group))
    }
}
