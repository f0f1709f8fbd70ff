//! Path and filter utilities

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::utils::config::PackagePaths;

/// Check if a file should be excluded based on OS-specific hidden files
pub fn is_os_hidden_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name {
            // macOS
            ".DS_Store" | ".AppleDouble" | ".LSOverride" => true,
            // Windows
            "Thumbs.db" | "ehthumbs.db" | "Desktop.ini" | "$RECYCLE.BIN" => true,
            // Linux
            ".directory" => true,
            // macOS resource forks, Linux trash dirs
            _ => name.starts_with("._") || name.starts_with(".Trash-"),
        }
    } else {
        false
    }
}

/// Compiled exclude patterns. A pattern matches either the file name or the full path.
pub struct ExcludeMatcher {
    set: GlobSet,
}

impl ExcludeMatcher {
    /// Build from user patterns plus the package defaults. A leading `!` is ignored.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let defaults = PackagePaths::get().default_exclude_patterns();
        for pattern in defaults.iter().chain(patterns) {
            let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
            builder.add(
                Glob::new(pattern).with_context(|| format!("invalid exclude pattern {pattern:?}"))?,
            );
        }
        let set = builder.build().context("compile exclude patterns")?;
        Ok(Self { set })
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name()
            && self.set.is_match(name)
        {
            return true;
        }
        self.set.is_match(path)
    }
}

/// Returns true if the walk should descend into / consider `path`.
pub fn should_include_in_walk(path: &Path, root: &Path, exclude: &ExcludeMatcher) -> bool {
    if path == root {
        return true;
    }
    !is_os_hidden_file(path) && !exclude.is_excluded(path)
}

/// Canonicalize the scan root. A missing root or a non-directory is a configuration error.
pub fn check_root_and_canonicalize(path: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = path
        .canonicalize()
        .map_err(|_| ConfigError::MissingRoot(path.to_path_buf()))?;
    if !canonical.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }
    Ok(canonical)
}
