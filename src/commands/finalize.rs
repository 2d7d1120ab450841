use crate::cli::FinalizeArgs;
use crate::mips::{
    consensus::filter_group,
    records::{read_rows, FinalSequence, SequenceCount, TableRow},
    writers::TsvWriter,
};
use crate::utils::{create_writer, open_text_reader, Result};
use itertools::Itertools;

pub fn finalize(args: FinalizeArgs) -> Result<()> {
    let source = args.counts_path.display().to_string();
    let counts: Vec<SequenceCount> =
        read_rows(open_text_reader(&args.counts_path)?, &source).collect::<Result<_>>()?;
    log::info!("Loaded {} sequence counts from {}", counts.len(), source);

    let suffix = format!(
        "dp{}.af{}.finalseqs.tsv.gz",
        args.min_tags, args.min_allele_fraction
    );
    let mut writer = create_writer(&args.output_prefix, &suffix, |path| {
        TsvWriter::new(path, FinalSequence::HEADER)
    })?;

    let mut num_groups = 0;
    let groups = counts.into_iter().chunk_by(|count| count.target.clone());
    for (target, group) in &groups {
        let rows = filter_group(
            group.collect(),
            args.min_tags,
            args.min_allele_fraction,
        );
        log::debug!("{}: {} sequences pass", target, rows.len());
        for row in rows {
            writer.write(&row)?;
        }
        num_groups += 1;
    }
    let num_rows = writer.finish()?;

    log::info!(
        "Kept {} sequences over {} targets",
        num_rows,
        num_groups
    );
    Ok(())
}
