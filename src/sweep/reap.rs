use super::{EntryOutcome, Phase, PhaseReport, SweepError};
use crate::threshold::{cutoff_from_now, is_expired};
use crate::utils::{absolute_path, is_directory};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Delete files older than `deletion_threshold_hours` under `target_root`
/// and remove directories that end up empty.
///
/// The walk is post-order: a directory is only considered for removal after
/// everything below it has been handled, so emptied leaves cascade up to
/// their parents in a single pass. `target_root` itself is never removed.
pub async fn reap(target_root: &Path, deletion_threshold_hours: f64) -> PhaseReport {
    info!(
        target = %target_root.display(),
        "--- DELETION PROCESS --- Criterion: older than {} hours",
        deletion_threshold_hours
    );

    let mut report = PhaseReport::new(Phase::Reap, target_root);

    let target_root = match absolute_path(target_root) {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "Failed to resolve target path against the working directory");
            return report;
        }
    };
    report.root = target_root.clone();

    if !is_directory(&target_root).await {
        warn!(
            target = %target_root.display(),
            "Target path does not exist or is not a directory"
        );
        return report;
    }

    let cutoff = cutoff_from_now(deletion_threshold_hours);
    report.cutoff = Some(cutoff);

    for entry in WalkDir::new(&target_root).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let err = SweepError::from(e);
                if !err.is_vanished() {
                    warn!(error = %err, "Failed to read target directory entry");
                }
                report.record(err.into());
                continue;
            }
        };

        if entry.file_type().is_dir() {
            if entry.depth() > 0 && remove_empty_directory(entry.path()).await {
                report.dirs_removed += 1;
            }
            continue;
        }

        match reap_file(entry.path(), cutoff).await {
            Ok(false) => {}
            Ok(true) => {
                info!("  DELETED: {}", entry.path().display());
                report.record(EntryOutcome::Success);
            }
            Err(err) => {
                let outcome = EntryOutcome::from(err);
                match &outcome {
                    EntryOutcome::SkippedVanished => {
                        debug!(path = %entry.path().display(), "File already gone")
                    }
                    EntryOutcome::SkippedError(err) => warn!(
                        path = %entry.path().display(),
                        error = %err,
                        "Error deleting file"
                    ),
                    EntryOutcome::Success => {}
                }
                report.record(outcome);
            }
        }
    }

    report.log_summary();
    report
}

/// Delete a single file if it is older than the cutoff. Returns whether it was deleted.
async fn reap_file(path: &Path, cutoff: DateTime<Utc>) -> Result<bool, SweepError> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| SweepError::io(path, e))?;

    if metadata.is_dir() {
        return Ok(false);
    }

    let modified = metadata.modified().map_err(|e| SweepError::io(path, e))?;
    if !is_expired(modified, cutoff) {
        return Ok(false);
    }

    fs::remove_file(path)
        .await
        .map_err(|e| SweepError::io(path, e))?;
    Ok(true)
}

/// Remove a directory if it is empty. Returns whether it was removed.
///
/// Failures never stop the walk: a directory that still has content or was
/// already removed is expected, anything else is logged.
async fn remove_empty_directory(path: &Path) -> bool {
    match fs::remove_dir(path).await {
        Ok(()) => {
            info!("  REMOVED EMPTY DIRECTORY: {}", path.display());
            true
        }
        Err(e) if matches!(e.kind(), ErrorKind::DirectoryNotEmpty | ErrorKind::NotFound) => {
            debug!(path = %path.display(), error = %e, "Directory kept");
            false
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove directory");
            false
        }
    }
}
