use clap::Parser;
use ecgann::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{annotate, compare, detect, inspect, list, plot},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::List(_) => "list",
        Command::Annotate(_) => "annotate",
        Command::Inspect(_) => "inspect",
        Command::Compare(_) => "compare",
        Command::Plot(_) => "plot",
        Command::Detect(_) => "detect",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::List(args) => list::list(args)?,
        Command::Annotate(args) => annotate::annotate(args)?,
        Command::Inspect(args) => inspect::inspect(args)?,
        Command::Compare(args) => compare::compare_annotations(args)?,
        Command::Plot(args) => plot::plot(args)?,
        Command::Detect(args) => detect::detect(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
