//! Configuration errors. Raised before the pipeline starts; never from inside it.

use std::path::PathBuf;
use thiserror::Error;

use crate::utils::config::{MAX_THREADS, MIN_THREADS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("root path does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("root path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("thread count must be {min}..{max}, got {got}")]
    ThreadCount { got: usize, min: usize, max: usize },

    #[error("prefix length must be at least 1")]
    PrefixLen,
}

impl ConfigError {
    pub(crate) fn thread_count(got: usize) -> Self {
        ConfigError::ThreadCount {
            got,
            min: MIN_THREADS,
            max: MAX_THREADS,
        }
    }
}
