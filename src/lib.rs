//! Policy-driven file lifecycle sweeper.
//!
//! For every configured policy, files older than the move threshold are
//! relocated from the source tree to the same relative location under the
//! target tree. When a deletion threshold is configured, files in the target
//! tree older than it are deleted and emptied directories are pruned.

pub mod config;
pub mod runner;
pub mod sweep;
pub mod threshold;
pub mod utils;

// Re-export commonly used types
pub use config::{load_policies, read_config, ConfigError, Policy, PolicyEntry, PolicyError};
pub use runner::{run_policies, run_policy, PolicyReport, RunSummary};
pub use sweep::{reap, relocate, EntryOutcome, Phase, PhaseReport, SweepError};
pub use threshold::{cutoff_at, cutoff_from_now};
