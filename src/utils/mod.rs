mod bam_utils;
mod readers;
mod region;
mod util;

pub use bam_utils::{get_bam_header, get_contig_names, get_sample_name};
pub use readers::{open_alignment_reader, open_text_reader};
pub use region::GenomicRegion;
pub use util::{create_writer, handle_error_and_exit, sample_from_path, Result};
