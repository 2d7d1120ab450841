use crate::utils::{sample_from_path, Result};
use rust_htslib::bam::{self, Read};
use std::{collections::HashSet, path::Path};

pub fn get_bam_header(reader: &bam::Reader) -> bam::Header {
    bam::Header::from_template(reader.header())
}

/// Contig names indexed by target id.
pub fn get_contig_names(reader: &bam::Reader) -> Vec<String> {
    reader
        .header()
        .target_names()
        .iter()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

pub fn get_sample_name(reads_path: &Path, bam_header: &bam::Header) -> Result<String> {
    let header_hashmap = bam_header.to_hashmap();
    let mut sample_names = HashSet::new();

    if let Some(rg_fields) = header_hashmap.get("RG") {
        for rg_field in rg_fields {
            if let Some(sample_name) = rg_field.get("SM") {
                sample_names.insert(sample_name.to_owned());
            }
        }
    }

    match sample_names.len() {
        1 => {
            if let Some(sample_name) = sample_names.into_iter().next() {
                return Ok(sample_name);
            }
        }
        0 => log::debug!("No sample names found in read groups"),
        _ => log::warn!("Multiple sample names found in read groups"),
    };

    sample_from_path(reads_path)
}
