mod tsv;

pub use tsv::TsvWriter;
