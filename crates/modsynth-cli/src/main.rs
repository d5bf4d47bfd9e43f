//! modsynth CLI: the `modsynth` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_tracing(cli.verbose);

    match cli.command {
        Commands::Match {
            pattern,
            names,
            json,
        } => commands::match_glob::run(pattern, names, json),

        Commands::Check { manifest, json } => commands::check::run(manifest, json),

        Commands::Resolve {
            manifest,
            requests,
            json,
        } => commands::resolve::run(manifest, requests, json),

        Commands::Provenance {
            manifest,
            requests,
            json,
        } => commands::provenance::run(manifest, requests, json),
    }
}
