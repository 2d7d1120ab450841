use crate::cli::CountArgs;
use crate::mips::{
    consensus::{GroupedCounts, SampleCounts, TargetCounts},
    records::{read_rows, AnnotatedRead, SequenceCount, TableRow},
    writers::TsvWriter,
};
use crate::utils::{create_writer, open_text_reader, sample_from_path, Result};

pub fn count(args: CountArgs) -> Result<()> {
    let sample_name = match &args.sample_name {
        Some(name) => name.clone(),
        None => match args.annotation_paths.first() {
            Some(path) => sample_from_path(path)?,
            None => return Err("No annotation tables given".into()),
        },
    };

    let mut sources = Vec::with_capacity(args.annotation_paths.len());
    for path in &args.annotation_paths {
        let reader = open_text_reader(path)?;
        sources.push(read_rows::<AnnotatedRead, _>(
            reader,
            &path.display().to_string(),
        ));
    }
    let reads = sources.into_iter().flatten();

    let mut writer = create_writer(&args.output_prefix, "seqcounts.tsv.gz", |path| {
        TsvWriter::new(path, SequenceCount::HEADER)
    })?;

    let mut num_targets = 0;
    if args.grouped {
        for group in GroupedCounts::new(reads) {
            write_target(&mut writer, &group?, &sample_name)?;
            num_targets += 1;
        }
    } else {
        let mut counts = SampleCounts::default();
        for read in reads {
            counts.add(&read?);
        }
        for group in counts.iter() {
            write_target(&mut writer, group, &sample_name)?;
        }
        num_targets = counts.len();
    }
    let num_rows = writer.finish()?;

    log::info!(
        "Wrote {} distinct sequences over {} targets for {}",
        num_rows,
        num_targets,
        sample_name
    );
    Ok(())
}

fn write_target(writer: &mut TsvWriter, group: &TargetCounts, sample_name: &str) -> Result<()> {
    log::debug!(
        "{}: {} distinct sequences",
        group.target,
        group.counter.len()
    );
    for row in group.to_rows(sample_name) {
        writer.write(&row)?;
    }
    Ok(())
}
