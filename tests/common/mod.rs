#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Create a file (and its parents) whose modification time lies `hours_ago` in the past
pub fn write_aged_file(root: &Path, relative: &str, content: &str, hours_ago: u64) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Should create parent dirs");
    }
    fs::write(&path, content).expect("Should write file");
    set_age(&path, hours_ago);
    path
}

/// Backdate the modification time of an existing file
pub fn set_age(path: &Path, hours_ago: u64) {
    let modified = SystemTime::now() - Duration::from_secs(hours_ago * 3600);
    File::options()
        .write(true)
        .open(path)
        .expect("Should open file")
        .set_modified(modified)
        .expect("Should set modified time");
}

/// Write a policy document and return its path
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("policies.json");
    fs::write(&path, content).expect("Should write config");
    path
}

/// Set the modification time to an arbitrary instant.
///
/// Returns false when the file system refuses the timestamp.
pub fn try_set_modified(path: &Path, modified: SystemTime) -> bool {
    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(modified))
        .is_ok()
}

/// Make a directory read-only.
///
/// Returns false when the current user can still write into it (e.g. root),
/// in which case permissions are restored and the caller should skip.
#[cfg(unix)]
pub fn lock_directory(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dir, fs::Permissions::from_mode(0o555)).expect("Should chmod dir");
    let marker = dir.join(".write-check");
    if fs::write(&marker, "").is_ok() {
        fs::remove_file(&marker).ok();
        unlock_directory(dir);
        return false;
    }
    true
}

#[cfg(unix)]
pub fn unlock_directory(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).expect("Should chmod dir");
}
