//! Log output for the binary.
//!
//! Only the orchestrator logs (server requests, batch progress). Logs go to
//! stderr so `plan --json` and `gen-config` output stays pipeable.

use tracing::Level;
use tracing_subscriber::fmt;

/// Install the global subscriber. `verbose` lowers the level from INFO to
/// DEBUG. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
