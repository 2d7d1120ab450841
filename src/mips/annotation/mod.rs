//! Compact per-base annotation of an alignment relative to its reference.
//!
//! An annotation string is a sequence of tokens, each introduced by a marker:
//! `=` a run of matching bases, `*` a reference/observed substitution pair,
//! `+` a run of inserted bases, and `-` a run of deleted reference bases.
//! Matches, inserted bases, and observed substitution bases are lower case;
//! reference-side substitution and deletion bases are upper case. The
//! quality string has one character per annotation character.

mod decode;
mod encode;

pub use decode::{decode, AlignedAnnotation};
pub use encode::encode;

pub const MATCH: u8 = b'=';
pub const SUBSTITUTION: u8 = b'*';
pub const INSERTION: u8 = b'+';
pub const DELETION: u8 = b'-';

/// Padding in a decoded sequence where the other sequence has a base
pub const GAP: u8 = b'-';

/// Quality character carried by token markers
pub const MARKER_QUAL: u8 = b'"';

/// Annotation of one read over a target window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// 1-based coordinate of the first reference base covered.
    pub start: i64,
    pub seq: String,
    pub qual: String,
}
