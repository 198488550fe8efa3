//! Binary crate for the `globe` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive credential configuration
//! - Printing resolver output as JSON

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    logger::init_cli_logger(cmd.verbose);
    cmd.run().await
}
