//! Public and internal types for the tagscan API and pipeline.

use serde::Serialize;
use std::path::PathBuf;

use crate::utils::config::{DEFAULT_PREFIX_LEN, DEFAULT_THREADS};

/// What an [`Analyzer`](crate::Analyzer) found in one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<P> {
    /// Analysis finished and produced a payload worth reporting.
    Found(P),
    /// Analysis finished but there was nothing of interest.
    Nothing,
}

/// Result for a single dispatched file. Exactly one is produced per accepted path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanResult<P> {
    Success { path: PathBuf, payload: P },
    Empty { path: PathBuf },
    Failure { path: PathBuf, message: String },
}

impl<P> ScanResult<P> {
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanResult::Success { path, .. }
            | ScanResult::Empty { path }
            | ScanResult::Failure { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScanResult::Failure { .. })
    }
}

/// A [`ScanResult`] tagged with the ordinal (1..=N) of the worker that produced it.
/// The ordinal is for diagnostic labels only.
#[derive(Clone, Debug, Serialize)]
pub struct ResultRecord<P> {
    pub worker: usize,
    #[serde(flatten)]
    pub result: ScanResult<P>,
}

/// Counts gathered over one pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Paths accepted by the sniff filter and put on the task queue.
    pub dispatched: usize,
    pub successes: usize,
    pub empties: usize,
    pub failures: usize,
    /// Paths the walk or the sniff could not read.
    pub skipped: usize,
    /// Discovery stopped early because the cancel flag was raised.
    pub cancelled: bool,
}

impl ScanSummary {
    /// Results seen by the collector.
    pub fn reported(&self) -> usize {
        self.successes + self.empties + self.failures
    }
}

/// How the CLI renders results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options for one [`run`](crate::run). Validated before any thread is started.
#[derive(Clone, Debug)]
pub struct ScanOpts {
    /// Worker count. Must lie in `1..=MAX_THREADS`; never reinterpreted.
    pub num_threads: usize,
    /// Bytes read from each file and handed to the accept predicate.
    pub prefix_len: usize,
    /// Follow symbolic links during the walk.
    pub follow_links: bool,
    /// Exclude patterns (glob syntax, e.g. `target`, `*.bak`).
    pub exclude: Vec<String>,
    /// Raised (e.g. by Ctrl+C) to stop discovery; tasks already queued still drain.
    pub cancel: Option<std::sync::Arc<std::sync::atomic::AtomicBool>>,
}

impl Default for ScanOpts {
    fn default() -> Self {
        Self {
            num_threads: DEFAULT_THREADS,
            prefix_len: DEFAULT_PREFIX_LEN,
            follow_links: false,
            exclude: Vec::new(),
            cancel: None,
        }
    }
}

impl ScanOpts {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }
}
