// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, dispatch.

use clap::Parser;
use shopify_cli::cli::{self, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Cli::parse();
    cli::init_logging(args.verbose);
    cli::run(args)
}
