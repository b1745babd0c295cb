//! Final report aggregation and the end-of-session summary

use crate::recommendations::severity_digest;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use warden_common::{ui, Session, Transcript};

pub const LOG_HEADER: &str = "=== SESSION LOG ===\n";
pub const AUDIT_HEADER: &str = "=== AUDIT REPORT ===\n";

/// Lines of the severity digest shown on the terminal at exit
pub const SUMMARY_TOP: usize = 10;

/// `full_report_<ts>.txt`, then `full_report_<ts>.1.txt`, ...
pub fn numbered(path: &Path, n: usize) -> PathBuf {
    if n == 0 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}.{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}.{}", stem, n),
    };
    path.with_file_name(name)
}

/// Open the first unused numbered variant of `path`
fn create_unique(path: &Path) -> io::Result<(File, PathBuf)> {
    let mut n = 0;
    loop {
        let candidate = numbered(path, n);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Final reports written so far for `session`, in creation order
pub fn final_reports(session: &Session) -> Vec<PathBuf> {
    (0..)
        .map(|n| numbered(session.final_report_path(), n))
        .take_while(|path| path.exists())
        .collect()
}

/// Concatenate the session log and audit report into a new file.
///
/// Never overwrites: a second finalize of the same session gets its own
/// numbered file. Sources are read as they are at call time.
pub fn finalize(session: &Session) -> io::Result<PathBuf> {
    let log = fs::read(session.log_path())?;
    let audit = fs::read(session.audit_path())?;

    let (mut file, path) = create_unique(session.final_report_path())?;
    file.write_all(LOG_HEADER.as_bytes())?;
    file.write_all(&log)?;
    file.write_all(AUDIT_HEADER.as_bytes())?;
    file.write_all(&audit)?;
    file.flush()?;

    info!("Final report written to {}", path.display());
    Ok(path)
}

/// Terminal summary at the end of a session: artifact paths and the most
/// frequent severity lines
pub fn print_summary(session: &Session, transcript: &Transcript) {
    ui::section(transcript, "Session summary");
    ui::info(transcript, format!("Session log: {}", session.log_path().display()));
    ui::info(transcript, format!("Audit report: {}", session.audit_path().display()));
    for path in final_reports(session) {
        ui::info(transcript, format!("Full report: {}", path.display()));
    }
    if session.backup_dir().is_dir() {
        ui::info(transcript, format!("Backups: {}", session.backup_dir().display()));
    }

    let log = match fs::read_to_string(session.log_path()) {
        Ok(log) => log,
        Err(_) => return,
    };
    let digest = severity_digest(&log);
    if digest.is_empty() {
        return;
    }
    ui::info(transcript, "Most frequent findings:");
    for (count, line) in digest.iter().take(SUMMARY_TOP) {
        ui::output(transcript, &format!("{:>4}x  {}", count, line));
    }
}
