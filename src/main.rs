mod args;
mod tab;

use clap::Parser;
use log::{info, LevelFilter};

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    let command = args
        .command
        .clone()
        .unwrap_or_else(|| tab::DEFAULT_COMMAND.to_string());
    let res = tab::run_tab(
        args.config.clone(),
        command.as_str(),
        args.rounds.clone(),
        args.out.clone(),
        args.reference.clone(),
    );

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        // The error replaces the output, so that a stale table is never left behind.
        if let Err(e2) = tab::write_error(args.out.as_deref(), &e) {
            eprintln!("Could not write the error: {}", e2);
        }
        std::process::exit(1);
    }
}
