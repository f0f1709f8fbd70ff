//! Load `.tagscan.toml` from the scanned directory (CLI only). The library takes everything
//! through `ScanOpts`.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::OutputFormat;
use crate::engine::cli::RunSettings;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct ScanToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    threads: Option<usize>,
    verbose: Option<bool>,
    debug: Option<bool>,
    follow_links: Option<bool>,
    exclude: Option<Vec<String>>,
    format: Option<OutputFormat>,
    prefix_len: Option<usize>,
}

pub fn parse_scan_toml(s: &str) -> Result<ScanToml> {
    Ok(toml::from_str(s)?)
}

/// Load the config file from `dir` if present. Returns None if missing or unreadable.
pub fn load_scan_toml(dir: &Path) -> Option<ScanToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_scan_toml(&s)
        .map_err(|e| log::warn!("{}: {:#}", path.display(), e))
        .ok()
}

/// Overwrite settings field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $opts_field:ident) => {
        if let Some(v) = $idx.$idx_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to settings (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_settings(file: &ScanToml, settings: &mut RunSettings) {
    let idx = &file.settings;
    apply_file_opt!(idx, settings, threads => num_threads);
    apply_file_opt!(idx, settings, verbose => verbose);
    apply_file_opt!(idx, settings, debug => debug);
    apply_file_opt!(idx, settings, follow_links => follow_links);
    apply_file_opt!(idx, settings, exclude => exclude);
    apply_file_opt!(idx, settings, format => format);
    apply_file_opt!(idx, settings, prefix_len => prefix_len);
}
