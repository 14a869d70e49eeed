//! Sequential execution of sweep policies.
//!
//! Policies run one after another, never concurrently, because several of
//! them may share a target tree.

use crate::config::{Policy, PolicyEntry};
use crate::sweep::{reap, relocate, PhaseReport};
use tracing::{info, warn};

/// Reports produced by one policy
#[derive(Debug)]
pub struct PolicyReport {
    pub relocation: PhaseReport,
    /// `None` when the policy has no deletion threshold
    pub reaping: Option<PhaseReport>,
}

/// Totals over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Policies that passed validation and ran
    pub executed: usize,
    /// Entries skipped as invalid
    pub skipped: usize,
    pub moved: usize,
    pub deleted: usize,
    pub dirs_removed: usize,
    /// Per-entity failures across all phases
    pub failures: usize,
}

impl RunSummary {
    /// Whether at least one valid policy ran
    pub fn has_work(&self) -> bool {
        self.executed > 0
    }

    fn absorb(&mut self, report: &PolicyReport) {
        self.executed += 1;
        self.moved += report.relocation.processed;
        self.failures += report.relocation.failures.len();

        if let Some(reaping) = &report.reaping {
            self.deleted += reaping.processed;
            self.dirs_removed += reaping.dirs_removed;
            self.failures += reaping.failures.len();
        }
    }
}

/// Run one validated policy: relocate, then reap when a deletion threshold is set.
pub async fn run_policy(policy: &Policy) -> PolicyReport {
    let relocation = relocate(
        &policy.source_path,
        &policy.target_path,
        policy.move_threshold_hours,
    )
    .await;

    let reaping = match policy.deletion_threshold_hours {
        Some(hours) => Some(reap(&policy.target_path, hours).await),
        None => {
            info!(
                target = %policy.target_path.display(),
                "Skipping deletion: 'deletion_threshold_hours' not configured"
            );
            None
        }
    };

    PolicyReport {
        relocation,
        reaping,
    }
}

/// Validate and run every entry in order, skipping invalid ones.
pub async fn run_policies(entries: &[PolicyEntry]) -> RunSummary {
    let mut summary = RunSummary::default();

    for (index, entry) in entries.iter().enumerate() {
        let policy = match Policy::try_from(entry) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(index, error = %e, "Skipping configuration");
                summary.skipped += 1;
                continue;
            }
        };

        let report = run_policy(&policy).await;
        summary.absorb(&report);
    }

    summary
}
