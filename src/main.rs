//! tagscan CLI: summarize the XML files under a directory.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tagscan::engine::arg_parser::Cli;
use tagscan::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
