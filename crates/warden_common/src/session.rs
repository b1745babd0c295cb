//! Session context
//!
//! One run of the maintenance pipeline. Every file the run writes is derived
//! from a single timestamp captured at startup.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Sortable, second-granularity timestamp used in every session file name
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub const LOG_PREFIX: &str = "maintenance_";
pub const AUDIT_PREFIX: &str = "audit_";
pub const FINAL_PREFIX: &str = "full_report_";
pub const BACKUP_PREFIX: &str = "backups_";

/// Immutable session context passed to every component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    started_at: DateTime<Local>,
    timestamp: String,
    log_dir: PathBuf,
    log_path: PathBuf,
    audit_path: PathBuf,
    final_report_path: PathBuf,
    backup_dir: PathBuf,
}

impl Session {
    /// Start a session now
    pub fn start(log_dir: impl Into<PathBuf>) -> Self {
        Self::at(log_dir, Local::now())
    }

    /// Build a session for a given start time
    pub fn at(log_dir: impl Into<PathBuf>, started_at: DateTime<Local>) -> Self {
        let log_dir = log_dir.into();
        let timestamp = started_at.format(TIMESTAMP_FORMAT).to_string();

        Self {
            log_path: log_dir.join(format!("{LOG_PREFIX}{timestamp}.log")),
            audit_path: log_dir.join(format!("{AUDIT_PREFIX}{timestamp}.txt")),
            final_report_path: log_dir.join(format!("{FINAL_PREFIX}{timestamp}.txt")),
            backup_dir: log_dir.join(format!("{BACKUP_PREFIX}{timestamp}")),
            started_at,
            timestamp,
            log_dir,
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn audit_path(&self) -> &Path {
        &self.audit_path
    }

    /// Preferred final report path; the aggregator picks a numbered sibling if
    /// this one is already taken.
    pub fn final_report_path(&self) -> &Path {
        &self.final_report_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}
