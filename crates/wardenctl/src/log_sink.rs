//! Log sink
//!
//! Prepares the log directory for a session: retention first, then the
//! exclusive creation of the session log and audit report, then the
//! diagnostic logger on top of the transcript.

use crate::audit::AuditReport;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use warden_common::session::{AUDIT_PREFIX, FINAL_PREFIX, LOG_PREFIX};
use warden_common::{ui, Echo, Session, Transcript, WardenConfig, WardenError, WardenResult};

/// Env var holding the diagnostic filter directives
pub const LOG_FILTER_ENV: &str = "ARCHWARDEN_LOG";

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Open outputs of a session
#[derive(Debug)]
pub struct LogSink {
    pub transcript: Transcript,
    pub audit: AuditReport,
    pub sweep: RetentionSweep,
}

/// Result of a retention pass
#[derive(Debug, Default)]
pub struct RetentionSweep {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// File name of a log, audit or final report. Backups and foreign files
/// never match.
pub fn is_session_artifact(name: &str) -> bool {
    (name.starts_with(LOG_PREFIX) && name.ends_with(".log"))
        || (name.starts_with(AUDIT_PREFIX) && name.ends_with(".txt"))
        || (name.starts_with(FINAL_PREFIX) && name.ends_with(".txt"))
}

/// Delete session artifacts in `dir` last modified more than `retention`
/// before `now`. Only regular files are touched.
pub fn prune_expired(dir: &Path, retention: Duration, now: SystemTime) -> RetentionSweep {
    let mut sweep = RetentionSweep::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            sweep.failed.push((dir.to_path_buf(), e.to_string()));
            return sweep;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        if !is_session_artifact(&name.to_string_lossy()) {
            continue;
        }

        // symlink_metadata: a link named like a log is not followed
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        let age = meta
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok());
        if !age.is_some_and(|age| age > retention) {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => sweep.removed.push(path),
            Err(e) => sweep.failed.push((path, e.to_string())),
        }
    }

    sweep.removed.sort();
    sweep
}

/// Start the session's outputs. Nothing is appended anywhere until retention
/// has run.
pub fn init(session: &Session, config: &WardenConfig, echo: Echo) -> WardenResult<LogSink> {
    fs::create_dir_all(session.log_dir()).map_err(|source| WardenError::LogDirectory {
        path: session.log_dir().to_path_buf(),
        source,
    })?;

    let sweep = prune_expired(session.log_dir(), config.retention(), SystemTime::now());

    let transcript = Transcript::create(session.log_path(), echo)?;
    let audit = match AuditReport::create(session.audit_path()) {
        Ok(audit) => audit,
        Err(e) => {
            // the log is still empty; leave no half-started session behind
            drop(transcript);
            let _ = fs::remove_file(session.log_path());
            return Err(e);
        }
    };

    ui::banner(&transcript, session.started_at());
    for path in &sweep.removed {
        ui::info(&transcript, format!("Removed expired {}", path.display()));
    }
    for (path, reason) in &sweep.failed {
        ui::warn(
            &transcript,
            format!("Could not remove {}: {}", path.display(), reason),
        );
    }

    Ok(LogSink {
        transcript,
        audit,
        sweep,
    })
}

/// Route `tracing` events into the transcript. A second call in the same
/// process is ignored.
pub fn install_diagnostics(transcript: &Transcript) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let writer = transcript.clone();

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(move || writer.clone())
        .try_init();

    match installed {
        Ok(()) => debug!("Diagnostics routed to {}", transcript.path().display()),
        Err(e) => warn!("Diagnostic logger already installed: {}", e),
    }
}
