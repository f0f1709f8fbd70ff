pub mod config;
pub mod logger;
pub mod scan_toml;

pub use config::*;
pub use logger::setup_logging;
pub use scan_toml::{ScanToml, load_scan_toml, parse_scan_toml};
