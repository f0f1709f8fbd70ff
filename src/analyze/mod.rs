//! Per-file analysis strategy and the built-in XML tag analyzer.

pub mod xml;

pub use xml::{TagSet, XmlTagAnalyzer, looks_like_xml};

use anyhow::Result;
use std::path::Path;

use crate::Outcome;

/// Analysis run by each worker on one accepted path.
///
/// Called concurrently from every worker thread, hence `Sync`. Returning `Err` (or panicking)
/// turns into a `Failure` result for that path; it never stops the pool.
pub trait Analyzer: Sync {
    type Payload: Send;

    fn analyze(&self, path: &Path) -> Result<Outcome<Self::Payload>>;
}

impl<F, P> Analyzer for F
where
    F: Fn(&Path) -> Result<Outcome<P>> + Sync,
    P: Send,
{
    type Payload = P;

    fn analyze(&self, path: &Path) -> Result<Outcome<P>> {
        self(path)
    }
}

/// Payloads the text renderer can list, one item per line.
pub trait Describe {
    fn items(&self) -> Vec<String>;
}

impl Describe for TagSet {
    fn items(&self) -> Vec<String> {
        self.iter().cloned().collect()
    }
}

impl Describe for Vec<String> {
    fn items(&self) -> Vec<String> {
        self.clone()
    }
}
