//! Discovery: a lazy walk of the root that sniffs each regular file and yields the accepted ones.

use log::debug;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::tools::{ExcludeMatcher, should_include_in_walk};

/// One result from a directory walk: either an entry to consider or an error with optional path.
pub enum WalkOutcome {
    Ok { path: PathBuf, is_file: bool },
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert a walkdir result into [`WalkOutcome`].
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> WalkOutcome {
    match r {
        Ok(entry) => {
            let is_file = entry.file_type().is_file();
            WalkOutcome::Ok {
                path: entry.into_path(),
                is_file,
            }
        }
        Err(err) => WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

fn walkdir_iter(
    root: &Path,
    follow_links: bool,
    exclude: ExcludeMatcher,
) -> Box<dyn Iterator<Item = WalkOutcome>> {
    use walkdir::WalkDir;
    let root_f = root.to_path_buf();
    Box::new(
        WalkDir::new(root)
            .follow_links(follow_links)
            .into_iter()
            .filter_entry(move |e| should_include_in_walk(e.path(), &root_f, &exclude))
            .map(to_outcome_walkdir),
    )
}

/// Read up to `prefix_len` bytes from the start of `path`.
pub fn read_prefix(path: &Path, prefix_len: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(prefix_len);
    file.take(prefix_len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Verdict of sniffing one file.
#[derive(Debug, PartialEq, Eq)]
pub enum Sniff {
    Accepted,
    Rejected,
    /// File ended before `prefix_len` bytes; treated as rejected.
    Short,
    Unreadable(String),
}

/// Sniff `path` with `accept`. Files shorter than `prefix_len` are never offered to `accept`.
pub fn sniff<F>(path: &Path, prefix_len: usize, accept: &F) -> Sniff
where
    F: Fn(&[u8]) -> bool,
{
    match read_prefix(path, prefix_len) {
        Ok(prefix) if prefix.len() < prefix_len => Sniff::Short,
        Ok(prefix) if accept(&prefix) => Sniff::Accepted,
        Ok(_) => Sniff::Rejected,
        Err(err) => Sniff::Unreadable(err.to_string()),
    }
}

/// Lazy, non-restartable sequence of accepted file paths under a root.
///
/// Unreadable entries are recorded in [`skipped`](Self::skipped) and never end the walk.
/// When the cancel flag is raised the sequence ends at the next entry.
pub struct Discoverer<F> {
    entries: Box<dyn Iterator<Item = WalkOutcome>>,
    accept: F,
    prefix_len: usize,
    cancel: Option<Arc<AtomicBool>>,
    skipped: Vec<(PathBuf, String)>,
    last_path: Option<PathBuf>,
    cancelled: bool,
}

impl<F> Discoverer<F>
where
    F: Fn(&[u8]) -> bool,
{
    /// `root` should already be canonical so yielded paths are absolute.
    pub fn new(
        root: &Path,
        follow_links: bool,
        exclude: ExcludeMatcher,
        prefix_len: usize,
        accept: F,
    ) -> Self {
        Self {
            entries: walkdir_iter(root, follow_links, exclude),
            accept,
            prefix_len,
            cancel: None,
            skipped: Vec::new(),
            last_path: None,
            cancelled: false,
        }
    }

    pub fn with_cancel(mut self, cancel: Option<Arc<AtomicBool>>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Paths the walk or the sniff could not read, with the reason.
    pub fn skipped(&self) -> &[(PathBuf, String)] {
        &self.skipped
    }

    pub fn into_skipped(self) -> Vec<(PathBuf, String)> {
        self.skipped
    }

    /// True if discovery ended because the cancel flag was raised.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    fn cancel_requested(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl<F> Iterator for Discoverer<F>
where
    F: Fn(&[u8]) -> bool,
{
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if self.cancelled {
            return None;
        }
        loop {
            if self.cancel_requested() {
                debug!("discovery cancelled");
                self.cancelled = true;
                return None;
            }
            match self.entries.next()? {
                WalkOutcome::Ok { path, is_file } => {
                    self.last_path = Some(path.clone());
                    if !is_file {
                        continue;
                    }
                    match sniff(&path, self.prefix_len, &self.accept) {
                        Sniff::Accepted => return Some(path),
                        Sniff::Rejected => {}
                        Sniff::Short => debug!("short file, not dispatched: {}", path.display()),
                        Sniff::Unreadable(msg) => {
                            debug!("cannot read {}: {}", path.display(), msg);
                            self.skipped.push((path, msg));
                        }
                    }
                }
                WalkOutcome::Err { msg, path } => {
                    debug!("walk error: {}", msg);
                    // Errors with no path are recorded against the last path seen.
                    let to_push = path.unwrap_or_else(|| {
                        PathBuf::from(format!(
                            "<no-path, last was {}>",
                            self.last_path
                                .as_ref()
                                .map(|p| p.display().to_string())
                                .unwrap_or_else(|| "<none>".to_string())
                        ))
                    });
                    self.skipped.push((to_push, msg));
                }
            }
        }
    }
}
