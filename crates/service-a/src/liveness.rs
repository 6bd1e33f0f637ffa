use std::path::Path;

use chrono::Utc;

pub const DEFAULT_LIVENESS_PATH: &str = "/tmp/alive";

/// Record the current UNIX time (seconds, fractional) for the pod's liveness
/// and readiness probes. Failures are logged, never returned.
pub fn touch(path: &Path) {
    let now = Utc::now();
    let stamp = format!(
        "{}.{:06}",
        now.timestamp(),
        now.timestamp_subsec_micros()
    );
    if let Err(e) = std::fs::write(path, stamp) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to update liveness file");
    }
}
