use super::{DELETION, GAP, INSERTION, MATCH, SUBSTITUTION};
use crate::utils::Result;

/// Reference and observed views of an annotation, padded to equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedAnnotation {
    pub ref_seq: Vec<u8>,
    pub obs_seq: Vec<u8>,
    /// Genomic coordinate of each column; `None` for inserted bases.
    pub coords: Vec<Option<i64>>,
}

impl AlignedAnnotation {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn has_indel(&self) -> bool {
        self.ref_seq.contains(&GAP) || self.obs_seq.contains(&GAP)
    }

    /// Index of the column aligned to the given genomic coordinate.
    pub fn column_of(&self, coord: i64) -> Option<usize> {
        self.coords.iter().position(|c| *c == Some(coord))
    }

    fn push(&mut self, ref_base: u8, obs_base: u8, coord: Option<i64>) {
        self.ref_seq.push(ref_base.to_ascii_uppercase());
        self.obs_seq.push(obs_base.to_ascii_uppercase());
        self.coords.push(coord);
        debug_assert_eq!(self.ref_seq.len(), self.obs_seq.len());
    }
}

/// Expands an annotation whose first reference column sits at `start`.
pub fn decode(annotation: &str, start: i64) -> Result<AlignedAnnotation> {
    let bytes = annotation.as_bytes();
    let mut aligned = AlignedAnnotation::default();
    let mut coord = start;
    let mut pos = 0;

    while pos < bytes.len() {
        let marker = bytes[pos];
        let token_start = pos + 1;
        pos = token_start;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let bases = &bytes[token_start..pos];

        let is_marker = matches!(marker, MATCH | SUBSTITUTION | INSERTION | DELETION);
        if !is_marker {
            return Err(format!(
                "Unexpected character '{}' at position {} of annotation {}",
                marker as char,
                token_start - 1,
                annotation
            ));
        }
        if bases.is_empty() {
            return Err(format!(
                "Empty '{}' token at position {} of annotation {}",
                marker as char,
                token_start - 1,
                annotation
            ));
        }

        match marker {
            MATCH => {
                for &base in bases {
                    aligned.push(base, base, Some(coord));
                    coord += 1;
                }
            }
            SUBSTITUTION => {
                if bases.len() != 2 {
                    return Err(format!(
                        "Substitution at position {} of annotation {} has {} bases",
                        token_start - 1,
                        annotation,
                        bases.len()
                    ));
                }
                aligned.push(bases[0], bases[1], Some(coord));
                coord += 1;
            }
            INSERTION => {
                for &base in bases {
                    aligned.push(GAP, base, None);
                }
            }
            _ => {
                for &base in bases {
                    aligned.push(base, GAP, Some(coord));
                    coord += 1;
                }
            }
        }
    }

    Ok(aligned)
}
