use crate::utils::Result;
use std::{collections::HashMap, io::BufRead};

/// An exact substitution expected at a chromosome coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeEdit {
    pub chrom: String,
    pub position: i64,
    pub ref_allele: Vec<u8>,
    pub alt_allele: Vec<u8>,
    pub name: String,
}

impl PrimeEdit {
    /// Parses a line in the format `chrom coordinate ref alt name`.
    pub fn new(line: &str) -> Result<Self> {
        let split_line: Vec<&str> = line.split_whitespace().collect();
        let (chrom, position, ref_allele, alt_allele, name) = match &split_line[..] {
            [chrom, position, ref_allele, alt_allele, name] => {
                (*chrom, *position, *ref_allele, *alt_allele, *name)
            }
            _ => {
                return Err(format!(
                    "Expected 5 fields in the format 'chrom coordinate ref alt name', found {}: {}",
                    split_line.len(),
                    line
                ))
            }
        };
        let position = position
            .parse()
            .map_err(|_| format!("Invalid coordinate '{}' for prime edit {}", position, name))?;
        let check_allele = |allele: &str| -> Result<Vec<u8>> {
            if allele.bytes().all(|b| b.is_ascii_alphabetic()) {
                Ok(allele.to_ascii_uppercase().into_bytes())
            } else {
                Err(format!("Invalid allele '{}' for prime edit {}", allele, name))
            }
        };

        Ok(PrimeEdit {
            chrom: chrom.to_string(),
            position,
            ref_allele: check_allele(ref_allele)?,
            alt_allele: check_allele(alt_allele)?,
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    /// Called from the presence of any insertion or deletion
    Indel,
    Prime(PrimeEdit),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: EditKind,
}

/// Edits to call, in edit-site table order.
#[derive(Debug, Default)]
pub struct EditCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl EditCatalog {
    /// Loads an edit-site table of `chrom coordinate name` lines without a header.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut catalog = EditCatalog::default();
        for (line_number, result_line) in reader.lines().enumerate() {
            let line = result_line
                .map_err(|e| format!("Error at {} line {}: {}", source, line_number + 1, e))?;
            let split_line: Vec<&str> = line.split_whitespace().collect();
            let name = match &split_line[..] {
                [] => continue,
                [_chrom, _coord, name] => *name,
                _ => {
                    return Err(format!(
                        "Error at {} line {}: Expected 3 fields in the format 'chrom coordinate name', found {}",
                        source,
                        line_number + 1,
                        split_line.len()
                    ))
                }
            };
            if catalog.index.contains_key(name) {
                log::warn!("Edit {} is listed more than once in {}", name, source);
                continue;
            }
            catalog.index.insert(name.to_string(), catalog.entries.len());
            catalog.entries.push(CatalogEntry {
                name: name.to_string(),
                kind: EditKind::Indel,
            });
        }
        log::debug!("Loaded {} edits from {}", catalog.len(), source);
        Ok(catalog)
    }

    /// Turns entries listed in a prime edit table into prime edits.
    pub fn add_prime_edits<R: BufRead>(&mut self, reader: R, source: &str) -> Result<()> {
        let mut added = 0;
        for (line_number, result_line) in reader.lines().enumerate().skip(1) {
            let line = result_line
                .map_err(|e| format!("Error at {} line {}: {}", source, line_number + 1, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let edit = PrimeEdit::new(&line)
                .map_err(|e| format!("Error at {} line {}: {}", source, line_number + 1, e))?;
            let slot = self.index.get(&edit.name).copied();
            match slot {
                Some(i) if self.entries[i].kind == EditKind::Indel => {
                    self.entries[i].kind = EditKind::Prime(edit);
                    added += 1;
                }
                Some(_) => log::warn!("Prime edit {} is listed more than once", edit.name),
                None => log::warn!("Prime edit {} is not in the edit-site table", edit.name),
            }
        }
        log::debug!("Loaded {} prime edits from {}", added, source);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<(usize, &CatalogEntry)> {
        self.index.get(name).map(|&i| (i, &self.entries[i]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

/// Splits a `/`-delimited edit list, dropping names that never denote an edit.
pub fn edit_names(field: &str) -> impl Iterator<Item = &str> {
    field.split('/').filter(|name| {
        !(name.is_empty() || *name == "none" || *name == "plasmid" || name.starts_with("PB-"))
    })
}

/// Chromosome placement of each contig's first base.
#[derive(Debug, Default)]
pub struct ContigOffsets {
    offsets: HashMap<String, (String, i64)>,
}

impl ContigOffsets {
    /// Loads `contig chrom chrom_coordinate` lines without a header.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut offsets = HashMap::new();
        for (line_number, result_line) in reader.lines().enumerate() {
            let line = result_line
                .map_err(|e| format!("Error at {} line {}: {}", source, line_number + 1, e))?;
            let split_line: Vec<&str> = line.split_whitespace().collect();
            let (contig, chrom, coord) = match &split_line[..] {
                [] => continue,
                [contig, chrom, coord] => (*contig, *chrom, *coord),
                _ => {
                    return Err(format!(
                        "Error at {} line {}: Expected 3 fields in the format 'contig chrom coordinate', found {}",
                        source,
                        line_number + 1,
                        split_line.len()
                    ))
                }
            };
            let coord: i64 = coord.parse().map_err(|_| {
                format!(
                    "Error at {} line {}: Invalid coordinate '{}'",
                    source,
                    line_number + 1,
                    coord
                )
            })?;
            offsets.insert(contig.to_string(), (chrom.to_string(), coord));
        }
        Ok(ContigOffsets { offsets })
    }

    /// Chromosome coordinate of a 1-based contig position.
    pub fn to_chrom_coord(&self, contig: &str, pos: i64) -> Option<i64> {
        self.offsets
            .get(contig)
            .map(|(_, first_base)| pos + first_base - 1)
    }

    pub fn chrom(&self, contig: &str) -> Option<&str> {
        self.offsets.get(contig).map(|(chrom, _)| chrom.as_str())
    }
}
