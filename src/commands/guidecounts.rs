use crate::cli::GuideCountsArgs;
use crate::mips::{
    guides::GuideCounter,
    records::{read_rows, FinalSequence},
    target::TargetCatalog,
    writers::TsvWriter,
};
use crate::utils::{create_writer, open_text_reader, Result};

pub fn guidecounts(args: GuideCountsArgs) -> Result<()> {
    let targets_source = args.targets_path.display().to_string();
    let targets = TargetCatalog::from_reader(open_text_reader(&args.targets_path)?, &targets_source)?;
    let mut counter = GuideCounter::new(&targets);
    if counter.is_empty() {
        return Err(format!("No guide construct targets found in {}", targets_source));
    }
    log::info!(
        "Counting {} guide constructs with up to {} probes each",
        counter.len(),
        counter.max_probes()
    );

    let source = args.final_seqs_path.display().to_string();
    let (mut num_seqs, mut num_used) = (0, 0);
    for row in read_rows::<FinalSequence, _>(open_text_reader(&args.final_seqs_path)?, &source) {
        num_seqs += 1;
        if counter.add(&row?) {
            num_used += 1;
        }
    }
    log::info!("Used {} of {} final sequences", num_used, num_seqs);

    let header = counter.header();
    let mut writer = create_writer(&args.output_prefix, "guidecounts.tsv", |path| {
        TsvWriter::new(path, &header)
    })?;
    for row in counter.rows() {
        writer.write(&row)?;
    }
    writer.finish()?;
    Ok(())
}
