use crate::utils::{GenomicRegion, Result};
use std::{collections::HashMap, io::BufRead};

/// A probe target and the window of reference scored for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    /// 1-based position where the probe's first arm begins.
    pub probe_start: i64,
    pub window: GenomicRegion,
    pub kind: char,
    /// `/`-delimited names of the edits this target reports on.
    pub edits: String,
}

impl Target {
    /// Parses a line in the format
    /// `Name Sequence Contig Start End Type CRISPR Strand Arm1Length TargetLength`.
    pub fn new(line: &str) -> Result<Self> {
        const EXPECTED_FIELD_COUNT: usize = 10;
        let split_line: Vec<&str> = line.split_whitespace().collect();
        let (name, contig, start, kind, edits, arm_len, window_len) = match &split_line[..] {
            [name, _seq, contig, start, _end, kind, edits, _strand, arm_len, window_len] => {
                (*name, *contig, *start, *kind, *edits, *arm_len, *window_len)
            }
            _ => {
                return Err(format!(
                    "Expected {} fields, found {}: {}",
                    EXPECTED_FIELD_COUNT,
                    split_line.len(),
                    line
                ))
            }
        };

        let probe_start: i64 = start
            .parse()
            .map_err(|_| format!("Invalid start '{}' for target {}", start, name))?;
        let arm_len: i64 = arm_len
            .parse()
            .map_err(|_| format!("Invalid arm length '{}' for target {}", arm_len, name))?;
        let window_len: i64 = window_len
            .parse()
            .map_err(|_| format!("Invalid target length '{}' for target {}", window_len, name))?;
        if arm_len < 0 {
            return Err(format!("Negative arm length for target {}", name));
        }

        let mut kind_chars = kind.chars();
        let kind = match (kind_chars.next(), kind_chars.next()) {
            (Some(kind), None) => kind,
            _ => return Err(format!("Type of target {} is not a single character", name)),
        };

        let window_start = probe_start + arm_len;
        let window = GenomicRegion::new(contig, window_start, window_start + window_len)
            .map_err(|e| format!("Target {}: {}", name, e))?;

        Ok(Target {
            name: name.to_string(),
            probe_start,
            window,
            kind,
            edits: edits.to_string(),
        })
    }
}

/// Targets in file order, indexed by contig.
#[derive(Debug, Default)]
pub struct TargetCatalog {
    targets: Vec<Target>,
    by_contig: HashMap<String, Vec<usize>>,
}

impl TargetCatalog {
    /// Loads a target table; its first line is a header.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut catalog = TargetCatalog::default();
        for (line_number, result_line) in reader.lines().enumerate().skip(1) {
            let line = result_line
                .map_err(|e| format!("Error at {} line {}: {}", source, line_number + 1, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let target = Target::new(&line)
                .map_err(|e| format!("Error at {} line {}: {}", source, line_number + 1, e))?;
            catalog.push(target);
        }
        log::debug!("Loaded {} targets from {}", catalog.len(), source);
        Ok(catalog)
    }

    fn push(&mut self, target: Target) {
        self.by_contig
            .entry(target.window.contig.clone())
            .or_default()
            .push(self.targets.len());
        self.targets.push(target);
    }

    /// First target on `contig` whose probe starts within `wiggle` of `pos`.
    pub fn find(&self, contig: &str, pos: i64, wiggle: f64) -> Option<&Target> {
        let pos = pos as f64;
        self.by_contig
            .get(contig)?
            .iter()
            .map(|&index| &self.targets[index])
            .find(|target| {
                let probe_start = target.probe_start as f64;
                pos - wiggle <= probe_start && probe_start <= pos + wiggle
            })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }
}
