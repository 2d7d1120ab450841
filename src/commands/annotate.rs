use crate::cli::AnnotateArgs;
use crate::mips::{
    annotation::encode,
    reads::AlignmentRecord,
    records::{AnnotatedRead, TableRow},
    target::TargetCatalog,
    writers::TsvWriter,
};
use crate::utils::{
    create_writer, get_bam_header, get_contig_names, get_sample_name, open_alignment_reader,
    open_text_reader, Result,
};
use rust_htslib::bam::{self, Read};

#[derive(Debug, Default)]
struct AnnotateStats {
    total: usize,
    unmapped: usize,
    no_target: usize,
    malformed: usize,
    outside_window: usize,
    annotated: usize,
}

pub fn annotate(args: AnnotateArgs) -> Result<()> {
    let targets_source = args.targets_path.display().to_string();
    let targets = TargetCatalog::from_reader(open_text_reader(&args.targets_path)?, &targets_source)?;
    if targets.is_empty() {
        return Err(format!("No targets found in {}", targets_source));
    }
    log::info!("Loaded {} targets", targets.len());

    let mut reader = open_alignment_reader(&args.reads_path)?;
    let bam_header = get_bam_header(&reader);
    let sample_name = match args.sample_name {
        Some(name) => name,
        None => get_sample_name(&args.reads_path, &bam_header)?,
    };
    let contigs = get_contig_names(&reader);

    let mut writer = create_writer(&args.output_prefix, "mipseqs.tsv.gz", |path| {
        TsvWriter::new(path, AnnotatedRead::HEADER)
    })?;

    let barcode_tag = args.barcode_tag.as_bytes();
    let mut stats = AnnotateStats::default();
    let mut record = bam::Record::new();
    while let Some(result) = reader.read(&mut record) {
        result.map_err(|e| format!("Error reading {}: {}", args.reads_path.display(), e))?;
        stats.total += 1;

        if record.is_unmapped() || record.is_secondary() || record.is_supplementary() {
            stats.unmapped += 1;
            continue;
        }
        let contig = match usize::try_from(record.tid())
            .ok()
            .and_then(|tid| contigs.get(tid))
        {
            Some(contig) => contig,
            None => {
                stats.unmapped += 1;
                continue;
            }
        };

        let target = match targets.find(contig, record.pos() + 1, args.wiggle) {
            Some(target) => target,
            None => {
                stats.no_target += 1;
                continue;
            }
        };

        let alignment =
            match AlignmentRecord::from_hts_rec(&record, contig, barcode_tag, args.barcode_len) {
                Ok(alignment) => alignment,
                Err(e) => {
                    log::debug!(
                        "Skipping read {}: {}",
                        String::from_utf8_lossy(record.qname()),
                        e
                    );
                    stats.malformed += 1;
                    continue;
                }
            };

        let annotation = match encode(&alignment, &target.window) {
            Some(annotation) => annotation,
            None => {
                stats.outside_window += 1;
                continue;
            }
        };

        writer.write(&AnnotatedRead {
            sample: sample_name.clone(),
            target: target.name.clone(),
            target_type: target.kind,
            edits: target.edits.clone(),
            contig: alignment.contig,
            start: annotation.start,
            seq: annotation.seq,
            qual: annotation.qual,
            barcode: alignment.barcode,
        })?;
        stats.annotated += 1;
    }
    writer.finish()?;

    log::info!(
        "Annotated {} of {} reads for {}",
        stats.annotated,
        stats.total,
        sample_name
    );
    log::info!(
        "Skipped reads: {} unmapped or non-primary, {} without a target, {} malformed, {} not annotated",
        stats.unmapped,
        stats.no_target,
        stats.malformed,
        stats.outside_window
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::records::read_rows;
    use std::path::Path;
    use tempfile::tempdir;

    const SAM: &str = "\
@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:chr1\tLN:1000
@RG\tID:rg1\tSM:NA12878
read1\t0\tchr1\t100\t60\t20M\t*\t0\t0\tCCCCCCCCTCCCCCCCCCCC\tIIIIIIIIIIIIIIIIIIII\tMD:Z:8A11\tMI:Z:$AAAAAAAAGG\tRG:Z:rg1
read2\t0\tchr1\t100\t60\t20M\t*\t0\t0\tCCCCCCCCTCCCCCCCCCCC\tIIIIIIIIIIIIIIIIIIII\tMI:Z:$CCCCCCCCGG\tRG:Z:rg1
read3\t4\t*\t0\t0\t*\t*\t0\t0\tCCCC\tIIII\tRG:Z:rg1
read4\t0\tchr1\t500\t60\t4M\t*\t0\t0\tCCCC\tIIII\tMD:Z:4\tMI:Z:$CCCCCCCCGG\tRG:Z:rg1
";

    const TARGETS: &str = "\
Name\tSequence\tContig\tStart\tEnd\tType\tCRISPR\tStrand\tArm1Length\tTargetLength
MIP_1\tACGT\tchr1\t98\t130\tC\tg1\t+\t2\t20
";

    #[test]
    fn annotates_reads_assigned_to_targets() {
        let dir = tempdir().unwrap();
        let reads_path = dir.path().join("S01.sam");
        let targets_path = dir.path().join("targets.txt");
        std::fs::write(&reads_path, SAM).unwrap();
        std::fs::write(&targets_path, TARGETS).unwrap();
        let prefix = dir.path().join("S01").to_str().unwrap().to_string();

        annotate(AnnotateArgs {
            reads_path,
            targets_path,
            output_prefix: prefix.clone(),
            sample_name: None,
            wiggle: 4.5,
            barcode_tag: "MI".to_string(),
            barcode_len: 8,
        })
        .unwrap();

        let output = format!("{}.mipseqs.tsv.gz", prefix);
        let reader = open_text_reader(Path::new(&output)).unwrap();
        let rows: Vec<AnnotatedRead> = read_rows(reader, &output)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.sample, "NA12878");
        assert_eq!(row.target, "MIP_1");
        assert_eq!(row.start, 100);
        assert_eq!(row.seq, "=cccccccc*At=ccccccccccc");
        assert_eq!(row.barcode, "AAAAAAAA");
    }
}
