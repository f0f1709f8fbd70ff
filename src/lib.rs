//! tagscan: concurrent directory scanner with a pluggable per-file analysis

pub mod analyze;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use analyze::{Analyzer, Describe, TagSet, XmlTagAnalyzer, looks_like_xml};
pub use error::ConfigError;
pub use pipeline::ResultSink;
pub use report::{CollectSink, JsonRenderer, TextRenderer};

use log::debug;
use std::path::Path;

/// Result alias used by public tagscan API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: scan `root`, dispatching every file whose first `opts.prefix_len` bytes
/// satisfy `accept` to `opts.num_threads` workers running `analyzer`, and stream each result to
/// `sink` as it completes. Returns once every dispatched file has been reported.
///
/// - `analyzer` is called concurrently from all workers. Errors and panics become
///   [`ScanResult::Failure`] for that file only.
/// - Results arrive in completion order, which differs from discovery order when
///   `num_threads > 1`.
/// - An out-of-range thread count or a missing root fails with [`ConfigError`] before
///   anything starts.
///
/// ```ignore
/// let mut sink = tagscan::CollectSink::default();
/// let summary = tagscan::run(path, &tagscan::XmlTagAnalyzer, tagscan::looks_like_xml, &tagscan::ScanOpts::with_threads(4), &mut sink)?;
/// ```
pub fn run<A, F, S>(
    root: &Path,
    analyzer: &A,
    accept: F,
    opts: &ScanOpts,
    sink: &mut S,
) -> Result<ScanSummary>
where
    A: Analyzer,
    F: Fn(&[u8]) -> bool,
    S: ResultSink<A::Payload> + ?Sized,
{
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    pipeline::run_pipeline(root, analyzer, accept, opts, sink)
}

/// [`run`] with the built-in XML tag analyzer and `<?xml` sniff.
pub fn scan_xml<S>(root: &Path, opts: &ScanOpts, sink: &mut S) -> Result<ScanSummary>
where
    S: ResultSink<TagSet> + ?Sized,
{
    run(root, &XmlTagAnalyzer, looks_like_xml, opts, sink)
}
