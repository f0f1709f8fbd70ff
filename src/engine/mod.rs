//! Engine module: CLI parsing, the CLI handler, and path utilities

pub mod arg_parser;
pub mod cli;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::{RunSettings, handle_run, resolve_settings};
pub use tools::{ExcludeMatcher, is_os_hidden_file, should_include_in_walk};
