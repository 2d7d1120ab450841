//! Parsing and sequential consumption of SAM `MD` tags.
//!
//! The `MD` tag spells out the reference wherever the read disagrees with it:
//! run lengths of matching bases, single mismatched reference bases, and
//! `^`-prefixed runs of deleted reference bases.

use crate::utils::Result;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdOp {
    /// Run of reference bases matched by the read
    Match(u32),
    /// Reference base at a mismatched position
    Mismatch(u8),
    /// Reference bases missing from the read
    Deletion(Vec<u8>),
}

/// What the `MD` tag says about one aligned (non-indel) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignedBase {
    Match,
    Mismatch(u8),
}

/// Parses an `MD` tag value; a leading `MD:Z:` is accepted and dropped.
pub fn parse_md(encoding: &str) -> Result<Vec<MdOp>> {
    let value = encoding.strip_prefix("MD:Z:").unwrap_or(encoding);
    let bytes = value.as_bytes();
    let mut ops = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_digit() {
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let len: u32 = value[start..pos]
                .parse()
                .map_err(|_| format!("Invalid run length in MD tag: {}", value))?;
            ops.push(MdOp::Match(len));
        } else if c == b'^' {
            let start = pos + 1;
            pos = start;
            while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
                pos += 1;
            }
            if pos == start {
                return Err(format!("Empty deletion in MD tag: {}", value));
            }
            ops.push(MdOp::Deletion(bytes[start..pos].to_ascii_uppercase()));
        } else if c.is_ascii_alphabetic() {
            ops.push(MdOp::Mismatch(c.to_ascii_uppercase()));
            pos += 1;
        } else {
            return Err(format!(
                "Invalid character '{}' in MD tag: {}",
                c as char, value
            ));
        }
    }
    Ok(ops)
}

/// Walks an `MD` tag in lockstep with the CIGAR.
#[derive(Debug, Clone)]
pub struct MdCursor {
    ops: VecDeque<MdOp>,
}

impl MdCursor {
    pub fn new(ops: &[MdOp]) -> Self {
        Self {
            ops: ops.iter().cloned().collect(),
        }
    }

    pub fn next_aligned(&mut self) -> Result<AlignedBase> {
        loop {
            match self.ops.pop_front() {
                Some(MdOp::Match(0)) => continue,
                Some(MdOp::Match(len)) => {
                    self.ops.push_front(MdOp::Match(len - 1));
                    return Ok(AlignedBase::Match);
                }
                Some(MdOp::Mismatch(base)) => return Ok(AlignedBase::Mismatch(base)),
                Some(MdOp::Deletion(_)) => {
                    return Err("MD tag has a deletion where the CIGAR has an aligned base".into())
                }
                None => return Err("MD tag is shorter than the CIGAR alignment".into()),
            }
        }
    }

    pub fn take_deletion(&mut self, len: usize) -> Result<Vec<u8>> {
        loop {
            match self.ops.pop_front() {
                Some(MdOp::Match(0)) => continue,
                Some(MdOp::Deletion(mut bases)) => {
                    if bases.len() < len {
                        return Err(format!(
                            "MD tag deletion of {} bases is shorter than CIGAR deletion of {}",
                            bases.len(),
                            len
                        ));
                    }
                    if bases.len() > len {
                        let rest = bases.split_off(len);
                        self.ops.push_front(MdOp::Deletion(rest));
                    }
                    return Ok(bases);
                }
                Some(op) => {
                    return Err(format!(
                        "MD tag has {:?} where the CIGAR has a deletion",
                        op
                    ))
                }
                None => return Err("MD tag is shorter than the CIGAR alignment".into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mismatches_and_deletions() {
        assert_eq!(
            parse_md("8A11").unwrap(),
            vec![MdOp::Match(8), MdOp::Mismatch(b'A'), MdOp::Match(11)]
        );
        assert_eq!(
            parse_md("MD:Z:10^acg0T4").unwrap(),
            vec![
                MdOp::Match(10),
                MdOp::Deletion(b"ACG".to_vec()),
                MdOp::Match(0),
                MdOp::Mismatch(b'T'),
                MdOp::Match(4),
            ]
        );
    }

    #[test]
    fn parse_rejects_bad_characters() {
        assert!(parse_md("10^5").is_err());
        assert!(parse_md("10*A").is_err());
    }

    #[test]
    fn cursor_walks_aligned_bases() {
        let ops = parse_md("1C0G1").unwrap();
        let mut cursor = MdCursor::new(&ops);
        assert_eq!(cursor.next_aligned(), Ok(AlignedBase::Match));
        assert_eq!(cursor.next_aligned(), Ok(AlignedBase::Mismatch(b'C')));
        assert_eq!(cursor.next_aligned(), Ok(AlignedBase::Mismatch(b'G')));
        assert_eq!(cursor.next_aligned(), Ok(AlignedBase::Match));
        assert!(cursor.next_aligned().is_err());
    }

    #[test]
    fn cursor_takes_deletions() {
        let ops = parse_md("2^TTA3").unwrap();
        let mut cursor = MdCursor::new(&ops);
        cursor.next_aligned().unwrap();
        assert!(cursor.take_deletion(3).is_err());

        let mut cursor = MdCursor::new(&ops);
        cursor.next_aligned().unwrap();
        cursor.next_aligned().unwrap();
        assert_eq!(cursor.take_deletion(2).unwrap(), b"TT".to_vec());
        assert_eq!(cursor.take_deletion(1).unwrap(), b"A".to_vec());
        assert_eq!(cursor.next_aligned(), Ok(AlignedBase::Match));
    }

    #[test]
    fn cursor_rejects_short_deletion() {
        let ops = parse_md("^T3").unwrap();
        let mut cursor = MdCursor::new(&ops);
        assert!(cursor.take_deletion(2).is_err());
    }
}
