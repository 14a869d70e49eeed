//! Age-based file sweeping.
//!
//! Two phases share the same outcome model:
//! - [`relocate`] moves files older than the move cutoff from a source tree
//!   into the mirrored location under a target tree.
//! - [`reap`] deletes files older than the deletion cutoff from a target tree
//!   and removes directories left empty, deepest first.
//!
//! Neither phase aborts on a single entity. Every file either succeeds, is
//! skipped because it vanished (another process got there first), or is
//! skipped with an error that is kept in the [`PhaseReport`].

mod reap;
mod relocate;

pub use reap::reap;
pub use relocate::relocate;

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("IO error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl SweepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Kind of the underlying IO error, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            Self::Walk(e) => e.io_error().map(|e| e.kind()),
        }
    }

    /// The entity disappeared before the operation reached it
    pub fn is_vanished(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }
}

/// Outcome of acting on a single file
#[derive(Debug)]
pub enum EntryOutcome {
    Success,
    SkippedVanished,
    SkippedError(SweepError),
}

impl From<SweepError> for EntryOutcome {
    fn from(err: SweepError) -> Self {
        if err.is_vanished() {
            EntryOutcome::SkippedVanished
        } else {
            EntryOutcome::SkippedError(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Relocate,
    Reap,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Relocate => "move",
            Phase::Reap => "deletion",
        }
    }
}

/// Aggregated outcomes of one phase over one tree
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Absolute root once resolved, the configured root otherwise
    pub root: PathBuf,
    /// `None` when the phase never started (root missing)
    pub cutoff: Option<DateTime<Utc>>,
    /// Files moved or deleted
    pub processed: usize,
    pub vanished: usize,
    pub dirs_created: usize,
    pub dirs_removed: usize,
    pub failures: Vec<SweepError>,
}

impl PhaseReport {
    pub fn new(phase: Phase, root: &Path) -> Self {
        Self {
            phase,
            root: root.to_path_buf(),
            cutoff: None,
            processed: 0,
            vanished: 0,
            dirs_created: 0,
            dirs_removed: 0,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Success => self.processed += 1,
            EntryOutcome::SkippedVanished => self.vanished += 1,
            EntryOutcome::SkippedError(err) => self.failures.push(err),
        }
    }

    /// Whether the phase ran against an existing root
    pub fn started(&self) -> bool {
        self.cutoff.is_some()
    }

    pub fn skipped(&self) -> usize {
        self.vanished + self.failures.len()
    }

    pub(crate) fn log_summary(&self) {
        match self.phase {
            Phase::Relocate => info!(
                phase = self.phase.as_str(),
                root = %self.root.display(),
                moved = self.processed,
                skipped = self.skipped(),
                dirs_created = self.dirs_created,
                "Completed moving files. Total files moved: {}",
                self.processed
            ),
            Phase::Reap => info!(
                phase = self.phase.as_str(),
                root = %self.root.display(),
                deleted = self.processed,
                skipped = self.skipped(),
                dirs_removed = self.dirs_removed,
                "Completed deleting files. Total files deleted: {}",
                self.processed
            ),
        }
    }
}
