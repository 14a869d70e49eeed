use super::{EntryOutcome, Phase, PhaseReport, SweepError};
use crate::threshold::{cutoff_from_now, is_expired};
use crate::utils::{absolute_path, is_directory};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Move files older than `move_threshold_hours` from `source_root` into the
/// mirrored location under `target_root`.
///
/// Directories are mirrored top-down as they are visited, so every moved
/// file lands at `target_root/<path relative to source_root>`. Existing
/// destination files are overwritten. A missing source root is logged and
/// yields an empty report.
pub async fn relocate(
    source_root: &Path,
    target_root: &Path,
    move_threshold_hours: f64,
) -> PhaseReport {
    info!(
        source = %source_root.display(),
        target = %target_root.display(),
        "--- MOVE PROCESS --- Criterion: older than {} hours",
        move_threshold_hours
    );

    let mut report = PhaseReport::new(Phase::Relocate, source_root);

    let source_root = match absolute_path(source_root) {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "Failed to resolve source path against the working directory");
            return report;
        }
    };
    report.root = source_root.clone();

    if !is_directory(&source_root).await {
        warn!(
            source = %source_root.display(),
            "Source path does not exist or is not a directory"
        );
        return report;
    }

    let (source_root, target_root) = match resolve_roots(&source_root, target_root).await {
        Ok((roots, created)) => {
            if created {
                report.dirs_created += 1;
            }
            roots
        }
        Err(err) => {
            warn!(error = %err, "Failed to prepare target root");
            report.record(EntryOutcome::SkippedError(err));
            return report;
        }
    };
    report.root = source_root.clone();

    let cutoff = cutoff_from_now(move_threshold_hours);
    report.cutoff = Some(cutoff);

    // A target nested inside the source must not be walked, or moved files
    // would be picked up again in the same pass.
    let walker = WalkDir::new(&source_root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.path() != target_root.as_path());

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let err = SweepError::from(e);
                if !err.is_vanished() {
                    warn!(error = %err, "Failed to read source directory entry");
                }
                report.record(err.into());
                continue;
            }
        };

        let destination = mirrored_path(&source_root, entry.path(), &target_root);

        if entry.file_type().is_dir() {
            match ensure_directory(&destination).await {
                Ok(true) => report.dirs_created += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(error = %err, "Failed to create mirrored directory");
                    report.record(EntryOutcome::SkippedError(err));
                }
            }
            continue;
        }

        match relocate_file(entry.path(), &destination, cutoff).await {
            Ok(false) => {}
            Ok(true) => {
                info!(
                    "  MOVED: {} -> {}",
                    entry.path().display(),
                    destination.display()
                );
                report.record(EntryOutcome::Success);
            }
            Err(err) => {
                let outcome = EntryOutcome::from(err);
                match &outcome {
                    EntryOutcome::SkippedVanished => info!(
                        path = %entry.path().display(),
                        "Skipping: file not found (concurrent modification?)"
                    ),
                    EntryOutcome::SkippedError(err) => warn!(
                        path = %entry.path().display(),
                        error = %err,
                        "Error moving file"
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

/// Create the target root, then canonicalise both roots so a target nested in
/// the source is recognised however it was spelled (`..`, symlinks).
///
/// Returns the canonical `(source, target)` pair and whether the target root
/// had to be created.
async fn resolve_roots(
    source_root: &Path,
    target_root: &Path,
) -> Result<((PathBuf, PathBuf), bool), SweepError> {
    let target_root = absolute_path(target_root).map_err(|e| SweepError::io(target_root, e))?;
    let created = ensure_directory(&target_root).await?;

    let source = fs::canonicalize(source_root)
        .await
        .map_err(|e| SweepError::io(source_root, e))?;
    let target = fs::canonicalize(&target_root)
        .await
        .map_err(|e| SweepError::io(&target_root, e))?;

    Ok(((source, target), created))
}

/// Location under `target_root` that mirrors `path` under `source_root`
fn mirrored_path(source_root: &Path, path: &Path, target_root: &Path) -> PathBuf {
    match path.strip_prefix(source_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => target_root.join(relative),
        _ => target_root.to_path_buf(),
    }
}

/// Create a directory and its parents. Returns whether anything was created.
async fn ensure_directory(path: &Path) -> Result<bool, SweepError> {
    if is_directory(path).await {
        return Ok(false);
    }

    fs::create_dir_all(path)
        .await
        .map_err(|e| SweepError::io(path, e))?;
    Ok(true)
}

/// Move a single file if it is older than the cutoff. Returns whether it moved.
async fn relocate_file(
    source: &Path,
    destination: &Path,
    cutoff: DateTime<Utc>,
) -> Result<bool, SweepError> {
    let metadata = fs::metadata(source)
        .await
        .map_err(|e| SweepError::io(source, e))?;

    // Symlinked directories are not followed, and not moved either
    if metadata.is_dir() {
        return Ok(false);
    }

    let modified = metadata
        .modified()
        .map_err(|e| SweepError::io(source, e))?;

    if !is_expired(modified, cutoff) {
        return Ok(false);
    }

    move_file(source, destination, modified).await?;
    Ok(true)
}

/// Rename the file into place. Only a rename across volumes falls back to
/// copy and delete; any other rename failure leaves both trees untouched.
async fn move_file(
    source: &Path,
    destination: &Path,
    modified: SystemTime,
) -> Result<(), SweepError> {
    let rename_err = match fs::rename(source, destination).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    match rename_err.kind() {
        // NotFound may also mean the destination directory is missing
        ErrorKind::NotFound => {
            if fs::try_exists(source).await.unwrap_or(false) {
                Err(SweepError::io(destination, rename_err))
            } else {
                Err(SweepError::io(source, rename_err))
            }
        }
        ErrorKind::CrossesDevices => {
            debug!(
                path = %source.display(),
                error = %rename_err,
                "Rename crosses volumes, falling back to copy"
            );
            copy_and_remove(source, destination, modified).await
        }
        _ => Err(SweepError::io(source, rename_err)),
    }
}

/// Copy through a staging file next to the destination.
///
/// The destination is only replaced, by a same-volume rename, once the
/// source has been removed. Until then a failure discards the staging file
/// and leaves any existing destination as it was.
async fn copy_and_remove(
    source: &Path,
    destination: &Path,
    modified: SystemTime,
) -> Result<(), SweepError> {
    let staging = staging_path(destination);

    if let Err(e) = fs::copy(source, &staging).await {
        fs::remove_file(&staging).await.ok();
        return Err(SweepError::io(source, e));
    }

    if let Err(e) = preserve_modified(&staging, modified).await {
        warn!(
            path = %staging.display(),
            error = %e,
            "Failed to preserve modification time"
        );
    }

    match fs::remove_file(source).await {
        Ok(()) => {}
        // Someone else removed the source; the staged copy is the surviving file
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            fs::remove_file(&staging).await.ok();
            return Err(SweepError::io(source, e));
        }
    }

    if let Err(e) = fs::rename(&staging, destination).await {
        // The source is gone, so the staged copy is kept rather than lost
        warn!(
            staged = %staging.display(),
            destination = %destination.display(),
            error = %e,
            "Failed to put copied file in place"
        );
        return Err(SweepError::io(destination, e));
    }

    Ok(())
}

/// Hidden sibling of `destination` used while copying across volumes
fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.{}.sweeping", name, std::process::id()))
}

async fn preserve_modified(path: &Path, modified: SystemTime) -> std::io::Result<()> {
    let file = fs::OpenOptions::new().write(true).open(path).await?;
    file.into_std().await.set_modified(modified)
}
