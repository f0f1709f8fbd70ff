use std::path::PathBuf;

/// Log paths discovery could not read. The count goes to warn, each path to debug.
/// Call after the run has drained; skipped paths never fail the run.
pub fn report_skipped_paths(skipped: &[(PathBuf, String)]) {
    if skipped.is_empty() {
        return;
    }
    log::warn!(
        "Skipped {} paths due to permission errors or access issues",
        skipped.len()
    );
    for (path, msg) in skipped {
        log::debug!("  skipped: {} ({})", path.display(), msg);
    }
}
