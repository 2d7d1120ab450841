pub mod annotate;
pub mod call;
pub mod count;
pub mod finalize;
pub mod guidecounts;
