//! CLI command handler: resolve settings (defaults → `.tagscan.toml` → flags) and run the scan.

use anyhow::{Context, Result};
use log::{debug, info};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::arg_parser::Cli;
use crate::pipeline::ResultSink;
use crate::utils::config::{DEFAULT_PREFIX_LEN, DEFAULT_THREADS};
use crate::utils::scan_toml::{ScanToml, apply_file_to_settings, load_scan_toml};
use crate::utils::setup_logging;
use crate::{JsonRenderer, OutputFormat, ScanOpts, ScanSummary, TagSet, TextRenderer};

/// Everything the CLI run needs, after merging the config file and the flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSettings {
    pub num_threads: usize,
    pub verbose: bool,
    pub debug: bool,
    pub follow_links: bool,
    pub exclude: Vec<String>,
    pub format: OutputFormat,
    pub prefix_len: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            num_threads: DEFAULT_THREADS,
            verbose: false,
            debug: false,
            follow_links: false,
            exclude: Vec::new(),
            format: OutputFormat::Text,
            prefix_len: DEFAULT_PREFIX_LEN,
        }
    }
}

impl RunSettings {
    pub fn to_scan_opts(&self, cancel: Option<Arc<AtomicBool>>) -> ScanOpts {
        ScanOpts {
            num_threads: self.num_threads,
            prefix_len: self.prefix_len,
            follow_links: self.follow_links,
            exclude: self.exclude.clone(),
            cancel,
        }
    }
}

/// Defaults, then the config file (if any), then flags given on the command line.
pub fn resolve_settings(cli: &Cli, file: Option<&ScanToml>) -> RunSettings {
    let mut settings = RunSettings::default();
    if let Some(file) = file {
        apply_file_to_settings(file, &mut settings);
    }
    if let Some(n) = cli.threads {
        settings.num_threads = n;
    }
    if let Some(v) = cli.verbose_flag() {
        settings.verbose = v;
    }
    if let Some(d) = cli.debug_flag() {
        settings.debug = d;
    }
    if let Some(f) = cli.follow_links_flag() {
        settings.follow_links = f;
    }
    if !cli.exclude.is_empty() {
        settings.exclude = cli.exclude.clone();
    }
    if let Some(format) = cli.format {
        settings.format = format;
    }
    if let Some(n) = cli.prefix_len {
        settings.prefix_len = n;
    }
    settings
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Scan `cli.dir` with the XML tag analyzer and print each result to stdout as it completes.
pub fn handle_run(cli: &Cli) -> Result<ScanSummary> {
    let file = load_scan_toml(&cli.dir);
    let settings = resolve_settings(cli, file.as_ref());
    setup_logging(settings.verbose);

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let opts = settings.to_scan_opts(Some(Arc::clone(&cancel_requested)));
    if settings.verbose {
        info!(
            "Creating {} thread{}...",
            settings.num_threads,
            plural(settings.num_threads)
        );
        info!("Creating file list...");
    }

    let stdout = io::stdout();
    let mut sink: Box<dyn ResultSink<TagSet>> = match settings.format {
        OutputFormat::Text => Box::new(TextRenderer::new(stdout, settings.debug)),
        OutputFormat::Json => Box::new(JsonRenderer::new(stdout)),
    };
    let summary = crate::scan_xml(&cli.dir, &opts, sink.as_mut())?;

    debug!(
        "{} files: {} with tags, {} without, {} errors, {} skipped",
        summary.dispatched, summary.successes, summary.empties, summary.failures, summary.skipped
    );
    if summary.cancelled || cancel_requested.load(Ordering::Relaxed) {
        return Err(anyhow::anyhow!(
            "Scan cancelled by user; {} files were reported",
            summary.reported()
        ));
    }
    Ok(summary)
}
