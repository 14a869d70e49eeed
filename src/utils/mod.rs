use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Key of the policy list inside the configuration document
pub const POLICY_LIST_KEY: &str = "file_mover_config";

/// Resolve a path against the current working directory.
///
/// The path does not need to exist.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Check that a path exists and is a directory (following symlinks)
pub async fn is_directory(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false)
}

/// Convert a UTC instant to a file-system timestamp.
///
/// Returns `None` when the platform clock cannot represent the instant.
pub fn to_system_time(instant: DateTime<Utc>) -> Option<SystemTime> {
    let secs = instant.timestamp();
    let whole = Duration::from_secs(secs.unsigned_abs());
    let nanos = Duration::from_nanos(u64::from(instant.timestamp_subsec_nanos()));

    if secs >= 0 {
        UNIX_EPOCH.checked_add(whole)?.checked_add(nanos)
    } else {
        UNIX_EPOCH.checked_sub(whole)?.checked_add(nanos)
    }
}

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}
