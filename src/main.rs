use clap::Parser;
use mipcall::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{annotate, call, count, finalize, guidecounts},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Annotate(_) => "annotate",
        Command::Count(_) => "count",
        Command::Finalize(_) => "finalize",
        Command::Call(_) => "call",
        Command::GuideCounts(_) => "guidecounts",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Annotate(args) => annotate::annotate(args)?,
        Command::Count(args) => count::count(args)?,
        Command::Finalize(args) => finalize::finalize(args)?,
        Command::Call(args) => call::call(args)?,
        Command::GuideCounts(args) => guidecounts::guidecounts(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
