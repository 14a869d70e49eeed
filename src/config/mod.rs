//! Policy document loading and validation.
//!
//! The document is a JSON object whose `file_mover_config` key holds a list
//! of policy entries:
//!
//! ```json
//! {
//!   "file_mover_config": [
//!     {
//!       "source_path": "/var/spool/incoming",
//!       "target_path": "/srv/archive/incoming",
//!       "age_threshold_hours": 24,
//!       "deletion_threshold_hours": 168
//!     }
//!   ]
//! }
//! ```

use crate::utils::POLICY_LIST_KEY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON format: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration document: {0}")]
    InvalidDocument(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("'source_path' missing")]
    MissingSourcePath,

    #[error("'target_path' missing")]
    MissingTargetPath,

    #[error("'{field}' must be a non-negative number, got {value}")]
    InvalidThreshold { field: &'static str, value: f64 },
}

/// A policy entry as written in the configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    /// Move threshold in hours. Absent means 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_threshold_hours: Option<f64>,
    /// Deletion threshold in hours. Absent disables deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_threshold_hours: Option<f64>,
}

/// A validated sweep policy
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub move_threshold_hours: f64,
    /// `Some(0.0)` is meaningful: every file in the target qualifies.
    pub deletion_threshold_hours: Option<f64>,
}

impl TryFrom<&PolicyEntry> for Policy {
    type Error = PolicyError;

    fn try_from(entry: &PolicyEntry) -> Result<Self, Self::Error> {
        let source_path = required_path(&entry.source_path).ok_or(PolicyError::MissingSourcePath)?;
        let target_path = required_path(&entry.target_path).ok_or(PolicyError::MissingTargetPath)?;

        let move_threshold_hours =
            validate_threshold("age_threshold_hours", entry.age_threshold_hours.unwrap_or(0.0))?;
        let deletion_threshold_hours = entry
            .deletion_threshold_hours
            .map(|hours| validate_threshold("deletion_threshold_hours", hours))
            .transpose()?;

        Ok(Self {
            source_path,
            target_path,
            move_threshold_hours,
            deletion_threshold_hours,
        })
    }
}

fn required_path(value: &Option<String>) -> Option<PathBuf> {
    value
        .as_deref()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

fn validate_threshold(field: &'static str, value: f64) -> Result<f64, PolicyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PolicyError::InvalidThreshold { field, value })
    }
}

/// Parse a configuration document into its policy entries.
///
/// A missing policy list yields no entries. List elements that do not have
/// the shape of a policy entry are logged and dropped.
pub fn parse_config(content: &str) -> Result<Vec<PolicyEntry>, ConfigError> {
    let document: serde_json::Value = serde_json::from_str(content)?;
    let object = document
        .as_object()
        .ok_or_else(|| ConfigError::InvalidDocument("expected a JSON object".to_string()))?;

    let list = match object.get(POLICY_LIST_KEY) {
        None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
        Some(serde_json::Value::Array(list)) => list,
        Some(_) => {
            return Err(ConfigError::InvalidDocument(format!(
                "'{}' must be a list",
                POLICY_LIST_KEY
            )))
        }
    };

    let mut entries = Vec::with_capacity(list.len());
    for (index, value) in list.iter().enumerate() {
        match serde_json::from_value::<PolicyEntry>(value.clone()) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(index, error = %e, "Dropping malformed policy entry"),
        }
    }

    Ok(entries)
}

/// Read the configuration file
pub async fn read_config(path: &Path) -> Result<Vec<PolicyEntry>, ConfigError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    parse_config(&content)
}

/// Read the configuration file, degrading to an empty list on failure
pub async fn load_policies(path: &Path) -> Vec<PolicyEntry> {
    match read_config(path).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(config = %path.display(), error = %e, "Failed to load configuration");
            Vec::new()
        }
    }
}
