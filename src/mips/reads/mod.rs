mod cigar;
mod md;
mod record;

pub use cigar::{parse_cigar, CigarOp, CigarOpExt};
pub use md::{parse_md, AlignedBase, MdCursor, MdOp};
pub use record::{AlignmentRecord, PHRED_OFFSET};
