use crate::utils::Result;

pub type CigarOp = rust_htslib::bam::record::Cigar;

pub trait CigarOpExt {
    fn get_ref_len(&self) -> i64;
    fn get_query_len(&self) -> i64;
}

impl CigarOpExt for CigarOp {
    fn get_ref_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::RefSkip(len)
            | CigarOp::Del(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len) => *len as i64,
            CigarOp::Ins(_) | CigarOp::SoftClip(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }

    fn get_query_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len)
            | CigarOp::Ins(len)
            | CigarOp::SoftClip(len) => *len as i64,
            CigarOp::RefSkip(_) | CigarOp::Del(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }
}

pub fn query_len(ops: &[CigarOp]) -> usize {
    ops.iter().map(|op| op.get_query_len() as usize).sum()
}

/// Parses a SAM CIGAR string such as `5S20M2I3D10M`.
pub fn parse_cigar(encoding: &str) -> Result<Vec<CigarOp>> {
    let mut ops = Vec::new();
    let mut num_str = String::new();
    for c in encoding.chars() {
        if c.is_ascii_digit() {
            num_str.push(c);
            continue;
        }
        let num: u32 = num_str
            .parse()
            .map_err(|_| format!("Missing length before '{}' in CIGAR {}", c, encoding))?;
        num_str.clear();
        let op = match c {
            'M' => CigarOp::Match(num),
            'I' => CigarOp::Ins(num),
            'D' => CigarOp::Del(num),
            'N' => CigarOp::RefSkip(num),
            'S' => CigarOp::SoftClip(num),
            'H' => CigarOp::HardClip(num),
            'P' => CigarOp::Pad(num),
            '=' => CigarOp::Equal(num),
            'X' => CigarOp::Diff(num),
            _ => return Err(format!("Invalid CIGAR operation '{}' in {}", c, encoding)),
        };
        ops.push(op);
    }
    if !num_str.is_empty() {
        return Err(format!("CIGAR ends without an operation: {}", encoding));
    }
    Ok(ops)
}
