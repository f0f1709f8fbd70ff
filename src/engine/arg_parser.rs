use clap::Parser;
use std::path::PathBuf;

use crate::OutputFormat;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Summarize the XML files under a directory, scanning them on a pool of worker threads.
#[derive(Clone, Parser)]
#[command(name = "tagscan")]
#[command(about = "Outputs a summary of the XML files in DIR; DIR defaults to the current directory.")]
pub struct Cli {
    /// Directory to scan. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Number of worker threads (1..20). Default: 7.
    #[arg(long, short = 't', value_parser = clap::value_parser!(usize))]
    pub threads: Option<usize>,

    /// Verbose output.
    #[arg(long, short = 'v', overrides_with = "no_verbose")]
    pub verbose: bool,

    /// Turn off verbose output set in the config file.
    #[arg(long, overrides_with = "verbose")]
    pub no_verbose: bool,

    /// Prefix each result with the number of the worker that produced it.
    #[arg(long, short = 'd', overrides_with = "no_debug")]
    pub debug: bool,

    /// Turn off worker labels set in the config file.
    #[arg(long, overrides_with = "debug")]
    pub no_debug: bool,

    /// Follow symbolic links.
    #[arg(long, short = 'f', overrides_with = "no_follow_links")]
    pub follow_links: bool,

    /// Do not follow symbolic links, even if the config file says to.
    #[arg(long, overrides_with = "follow_links")]
    pub no_follow_links: bool,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Bytes read from each file to decide whether it is XML.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub prefix_len: Option<usize>,
}

/// `Some(true)` for `--x`, `Some(false)` for `--no-x`, `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl Cli {
    pub fn verbose_flag(&self) -> Option<bool> {
        switch(self.verbose, self.no_verbose)
    }

    pub fn debug_flag(&self) -> Option<bool> {
        switch(self.debug, self.no_debug)
    }

    pub fn follow_links_flag(&self) -> Option<bool> {
        switch(self.follow_links, self.no_follow_links)
    }
}
