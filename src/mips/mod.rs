pub mod annotation;
pub mod consensus;
pub mod edits;
pub mod guides;
pub mod reads;
pub mod records;
pub mod target;
pub mod writers;
