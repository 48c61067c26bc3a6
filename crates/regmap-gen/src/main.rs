//! CLI entry point for the `regmap-gen` binary.
//!
//! Usage: `regmap-gen plan <tree.json>` or `regmap-gen check <tree.json>`.

use std::process;

use clap::Parser;
use regmap_core as _;
use regmap_gen::cli::{run, Cli};
use regmap_gen::init_logging;
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing::error;
use tracing_subscriber as _;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose());

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            error!(%err, "run aborted");
            eprintln!("error: {err}");
            err.exit_code()
        }
    };

    process::exit(exit_code);
}
