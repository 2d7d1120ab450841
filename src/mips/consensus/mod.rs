mod counter;
mod filter;

pub use counter::{DistinctSequence, GroupedCounts, SampleCounts, SequenceCounter, TargetCounts};
pub use filter::filter_group;
