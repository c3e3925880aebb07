use std::path::Path;
use std::sync::OnceLock;

use flexi_logger::{FileSpec, Logger, LoggerHandle};

// The handle must stay alive for the lifetime of the process; dropping it
// shuts the logger down.
static HANDLE: OnceLock<LoggerHandle> = OnceLock::new();

/// Start file-based logging next to the data file. Stderr is unusable once
/// the alternate screen is up, so everything goes to disk. Failures are
/// non-fatal; the app just runs without logs.
pub fn init(log_dir: &Path) {
    let spec = FileSpec::default()
        .directory(log_dir)
        .basename("tplanner")
        .suppress_timestamp();

    match Logger::try_with_env_or_str("info").and_then(|logger| logger.log_to_file(spec).start()) {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
        }
        Err(err) => eprintln!("logging disabled: {err}"),
    }
}
