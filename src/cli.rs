use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="mipcall",
          version=&**FULL_VERSION,
          about="Molecular inversion probe sequence annotation and CRISPR edit calling",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Annotate aligned reads against their probe targets")]
    Annotate(AnnotateArgs),
    #[clap(about = "Collapse annotated reads into distinct sequences per target")]
    Count(CountArgs),
    #[clap(about = "Filter sequence counts by tag depth and allele fraction")]
    Finalize(FinalizeArgs),
    #[clap(about = "Call CRISPR edits from final sequences")]
    Call(CallArgs),
    #[clap(name = "guidecounts")]
    #[clap(about = "Count capture events of integrated guide constructs")]
    GuideCounts(GuideCountsArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("annotate")))]
#[command(arg_required_else_help(true))]
pub struct AnnotateArgs {
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reads")]
    #[clap(help = "SAM/BAM/CRAM file with aligned reads carrying MD and barcode tags")]
    #[clap(value_name = "READS")]
    #[arg(value_parser = check_file_exists)]
    pub reads_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 't')]
    #[clap(long = "targets")]
    #[clap(help = "Probe target table")]
    #[clap(value_name = "TARGETS")]
    #[arg(value_parser = check_file_exists)]
    pub targets_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "sample-name")]
    #[clap(value_name = "SAMPLE_NAME")]
    #[clap(help = "Sample name")]
    #[clap(default_value = None)]
    #[arg(value_parser = check_sample_name_nonempty)]
    pub sample_name: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "wiggle")]
    #[clap(value_name = "WIGGLE")]
    #[clap(help = "Maximum distance between a read's mapping position and its probe start")]
    #[clap(default_value = "4.5")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub wiggle: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "barcode-tag")]
    #[clap(value_name = "TAG")]
    #[clap(help = "Aux tag holding the molecular barcode")]
    #[clap(default_value = "MI")]
    #[arg(value_parser = check_aux_tag)]
    pub barcode_tag: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "barcode-len")]
    #[clap(value_name = "BARCODE_LEN")]
    #[clap(help = "Number of barcode bases to keep")]
    #[clap(default_value = "8")]
    #[arg(value_parser = positive_usize)]
    pub barcode_len: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("count")))]
#[command(arg_required_else_help(true))]
pub struct CountArgs {
    #[clap(required = true)]
    #[clap(short = 'a')]
    #[clap(long = "annotations")]
    #[clap(help = "Annotated read tables produced by annotate")]
    #[clap(value_name = "ANNOTATIONS")]
    #[clap(num_args = 1..)]
    #[arg(value_parser = check_file_exists)]
    pub annotation_paths: Vec<PathBuf>,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "sample-name")]
    #[clap(value_name = "SAMPLE_NAME")]
    #[clap(help = "Sample name")]
    #[clap(default_value = None)]
    #[arg(value_parser = check_sample_name_nonempty)]
    pub sample_name: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "grouped")]
    #[clap(help = "Stream input whose reads are already grouped by target")]
    pub grouped: bool,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("finalize")))]
#[command(arg_required_else_help(true))]
pub struct FinalizeArgs {
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "counts")]
    #[clap(help = "Sequence count table produced by count")]
    #[clap(value_name = "COUNTS")]
    #[arg(value_parser = check_file_exists)]
    pub counts_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "min-tags")]
    #[clap(value_name = "MIN_TAGS")]
    #[clap(help = "Minimum number of distinct barcodes supporting a sequence")]
    pub min_tags: u64,

    #[clap(required = true)]
    #[clap(short = 'f')]
    #[clap(long = "min-allele-fraction")]
    #[clap(value_name = "MIN_AF")]
    #[clap(help = "Minimum fraction of a target's tags supporting a sequence")]
    #[arg(value_parser = ensure_unit_float)]
    pub min_allele_fraction: f64,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("call")))]
#[command(arg_required_else_help(true))]
pub struct CallArgs {
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "final-seqs")]
    #[clap(help = "Final sequence table produced by finalize")]
    #[clap(value_name = "FINAL_SEQS")]
    #[arg(value_parser = check_file_exists)]
    pub final_seqs_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'e')]
    #[clap(long = "edits")]
    #[clap(help = "Edit-site table listing the edits to call")]
    #[clap(value_name = "EDITS")]
    #[arg(value_parser = check_file_exists)]
    pub edits_path: PathBuf,

    #[clap(short = 'p')]
    #[clap(long = "prime-edits")]
    #[clap(help = "Prime edit table with expected alleles")]
    #[clap(value_name = "PRIME_EDITS")]
    #[clap(requires = "contig_offsets_path")]
    #[arg(value_parser = check_file_exists)]
    pub prime_edits_path: Option<PathBuf>,

    #[clap(short = 'c')]
    #[clap(long = "contig-offsets")]
    #[clap(help = "Chromosome coordinate of the first base of each contig")]
    #[clap(value_name = "CONTIG_OFFSETS")]
    #[arg(value_parser = check_file_exists)]
    pub contig_offsets_path: Option<PathBuf>,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output path for edit calls (standard output if omitted)")]
    #[clap(value_name = "OUTPUT")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "sample-name")]
    #[clap(value_name = "SAMPLE_NAME")]
    #[clap(help = "Sample name")]
    #[clap(default_value = None)]
    #[arg(value_parser = check_sample_name_nonempty)]
    pub sample_name: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "flank-len")]
    #[clap(value_name = "FLANK_LEN")]
    #[clap(help = "Number of bases on each side of a prime edit that must match the reference")]
    #[clap(default_value = "5")]
    pub flank_len: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("guidecounts")))]
#[command(arg_required_else_help(true))]
pub struct GuideCountsArgs {
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "final-seqs")]
    #[clap(help = "Final sequence table produced by finalize")]
    #[clap(value_name = "FINAL_SEQS")]
    #[arg(value_parser = check_file_exists)]
    pub final_seqs_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 't')]
    #[clap(long = "targets")]
    #[clap(help = "Target table of the probes on guide construct contigs")]
    #[clap(value_name = "TARGETS")]
    #[arg(value_parser = check_file_exists)]
    pub targets_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_sample_name_nonempty(s: &str) -> Result<String> {
    if s.trim().is_empty() {
        Err("Sample name cannot be an empty string".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn check_aux_tag(s: &str) -> Result<String> {
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(s.to_string())
    } else {
        Err(format!("`{}` is not a two-character aux tag", s))
    }
}

fn positive_usize(s: &str) -> Result<usize> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid positive integer", s))?;
    if value >= 1 {
        Ok(value)
    } else {
        Err("Value must be at least 1".into())
    }
}

fn ensure_non_negative_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("The value must be non-negative, got: {}", value))
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validators_reject_bad_values() {
        assert_eq!(ensure_unit_float("0.05"), Ok(0.05));
        assert!(ensure_unit_float("1.5").is_err());
        assert!(ensure_non_negative_float("-1").is_err());
        assert_eq!(ensure_non_negative_float("0"), Ok(0.0));
        assert!(positive_usize("0").is_err());
        assert!(check_aux_tag("MIZ").is_err());
        assert_eq!(check_aux_tag("RX"), Ok("RX".to_string()));
        assert!(check_sample_name_nonempty(" ").is_err());
    }

    #[test]
    fn call_requires_offsets_with_prime_edits() {
        let dir = tempfile::tempdir().unwrap();
        let seqs = dir.path().join("s.finalseqs.tsv");
        std::fs::write(&seqs, "").unwrap();
        let seqs = seqs.to_str().unwrap();
        let result = Cli::try_parse_from([
            "mipcall", "call", "-s", seqs, "-e", seqs, "-p", seqs,
        ]);
        assert!(result.is_err());
        let result = Cli::try_parse_from([
            "mipcall", "call", "-s", seqs, "-e", seqs, "-p", seqs, "-c", seqs,
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn guidecounts_subcommand_is_one_word() {
        let dir = tempfile::tempdir().unwrap();
        let seqs = dir.path().join("s.finalseqs.tsv");
        std::fs::write(&seqs, "").unwrap();
        let seqs = seqs.to_str().unwrap();
        let prefix = dir.path().join("s");
        let prefix = prefix.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "mipcall", "guidecounts", "-s", seqs, "-t", seqs, "-o", prefix,
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::GuideCounts(_)));
    }
}
