//! Application configuration constants.
//! Defaults and limits in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Per-directory config file (`.tagscan.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Names excluded from discovery by default: our own config file.
    pub fn default_exclude_patterns(&self) -> Vec<String> {
        vec![self.config_filename().to_string()]
    }
}

// ---- Worker threads ----

/// Smallest accepted worker count.
pub const MIN_THREADS: usize = 1;
/// Largest accepted worker count.
pub const MAX_THREADS: usize = 20;
/// Worker count when neither CLI nor config file sets one.
pub const DEFAULT_THREADS: usize = 7;

// ---- Sniffing ----

/// Bytes read from each file before deciding whether to dispatch it. `<?xml` is 5 bytes.
pub const DEFAULT_PREFIX_LEN: usize = 5;

/// Prefix every XML document with a declaration starts with.
pub const XML_MAGIC: &[u8] = b"<?xml";
