use std::sync::Arc;

use dsx_lib::browser::ProgressCallback;

/// Human-facing progress lines on stderr, only in verbose mode.
pub fn stderr_progress(verbose: bool) -> Option<ProgressCallback> {
    if verbose {
        Some(Arc::new(|msg: &str| eprintln!("{msg}")))
    } else {
        None
    }
}
