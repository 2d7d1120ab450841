use crate::cli::CallArgs;
use crate::mips::{
    edits::{ContigOffsets, EditCaller, EditCatalog, EditKind},
    records::{read_rows, EditCall, FinalSequence, TableRow},
    writers::TsvWriter,
};
use crate::utils::{open_text_reader, sample_from_path, Result};
use std::path::Path;

pub fn call(args: CallArgs) -> Result<()> {
    let edits_source = args.edits_path.display().to_string();
    let mut catalog = EditCatalog::from_reader(open_text_reader(&args.edits_path)?, &edits_source)?;
    if let Some(path) = &args.prime_edits_path {
        catalog.add_prime_edits(open_text_reader(path)?, &path.display().to_string())?;
    }
    let num_prime = catalog
        .iter()
        .filter(|entry| matches!(entry.kind, EditKind::Prime(_)))
        .count();
    log::info!(
        "Calling {} edits ({} prime edits)",
        catalog.len(),
        num_prime
    );

    let offsets = match &args.contig_offsets_path {
        Some(path) => ContigOffsets::from_reader(open_text_reader(path)?, &path.display().to_string())?,
        None => ContigOffsets::default(),
    };

    let sample_name = match args.sample_name {
        Some(name) => name,
        None => sample_from_path(&args.final_seqs_path)?,
    };

    let mut caller = EditCaller::new(catalog, offsets, args.flank_len);
    let source = args.final_seqs_path.display().to_string();
    let (mut num_seqs, mut num_used) = (0, 0);
    for row in read_rows::<FinalSequence, _>(open_text_reader(&args.final_seqs_path)?, &source) {
        num_seqs += 1;
        if caller.process(&row?) {
            num_used += 1;
        }
    }
    log::info!(
        "Used {} of {} final sequences for {}",
        num_used,
        num_seqs,
        sample_name
    );

    let mut writer = match &args.output_path {
        Some(path) => TsvWriter::new(Path::new(path), EditCall::HEADER)?,
        None => TsvWriter::stdout(EditCall::HEADER)?,
    };
    for call in caller.calls(&sample_name) {
        writer.write(&call)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::edits::EditStatus;
    use tempfile::tempdir;

    #[test]
    fn calls_indel_and_prime_edits() {
        let dir = tempdir().unwrap();
        let seqs_path = dir.path().join("S01.dp2.af0.05.finalseqs.tsv");
        let edits_path = dir.path().join("sites.txt");
        let prime_path = dir.path().join("prime.txt");
        let offsets_path = dir.path().join("offsets.txt");
        let output_path = dir.path().join("S01.calls.tsv");

        let mut seqs = format!("{}\n", FinalSequence::HEADER);
        for (edits, seq) in [
            ("g1", "=acg+tt=ca"),
            ("g1/pe1", "=ccccc*Ag=ccccc"),
            ("none", "=acg-T=ca"),
        ] {
            let qual = "I".repeat(seq.len());
            seqs.push_str(&format!(
                "S01\tMIP_1\tC\t{}\tchrCHD8\t95\t{}\t{}\t10\t5\t0.500000\n",
                edits, seq, qual
            ));
        }
        std::fs::write(&seqs_path, seqs).unwrap();
        std::fs::write(&edits_path, "chr14\t2000\tg1\nchr14\t2100\tpe1\nchr14\t2200\tg2\n").unwrap();
        std::fs::write(&prime_path, "chrom\tcoord\tref\talt\tname\nchr14\t2100\tA\tG\tpe1\n").unwrap();
        std::fs::write(&offsets_path, "chrCHD8\tchr14\t2001\n").unwrap();

        call(CallArgs {
            final_seqs_path: seqs_path,
            edits_path,
            prime_edits_path: Some(prime_path),
            contig_offsets_path: Some(offsets_path),
            output_path: Some(output_path.to_str().unwrap().to_string()),
            sample_name: None,
            flank_len: 5,
        })
        .unwrap();

        let source = output_path.display().to_string();
        let calls: Vec<EditCall> = read_rows(open_text_reader(&output_path).unwrap(), &source)
            .collect::<Result<_>>()
            .unwrap();
        let summary: Vec<(&str, EditStatus, u64)> = calls
            .iter()
            .map(|c| (c.edit.as_str(), c.status, c.indel_count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("g1", EditStatus::HasIndel, 1),
                ("pe1", EditStatus::HasPrimeEdit, 0),
                ("g2", EditStatus::Uncallable, 0),
            ]
        );
        assert!(calls.iter().all(|c| c.sample == "S01"));
    }
}
