//! Audit report
//!
//! Append-only text file with one labeled section per executed probe, in
//! invocation order. Only the running session writes to it.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use warden_common::{WardenError, WardenResult};

/// Header line opening a report section
pub fn section_header(title: &str) -> String {
    format!("=== {} ===", title)
}

#[derive(Debug)]
pub struct AuditReport {
    file: File,
    path: PathBuf,
}

impl AuditReport {
    /// Create the report; an existing file means another session owns it
    pub fn create(path: &Path) -> WardenResult<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => WardenError::SessionClash(path.to_path_buf()),
                _ => WardenError::Io(e),
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a header followed by `body` verbatim
    pub fn section(&mut self, title: &str, body: &str) -> io::Result<()> {
        writeln!(self.file, "\n{}", section_header(title))?;
        self.file.write_all(body.as_bytes())?;
        if !body.is_empty() && !body.ends_with('\n') {
            self.file.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Append a single line outside any section
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.file, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sections_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit_x.txt");
        let mut report = AuditReport::create(&path).unwrap();

        report.section("Memory", "Mem: 16Gi\n").unwrap();
        report.line("[CPU] lscpu not installed, skipping").unwrap();
        report.section("Swap devices", "").unwrap();
        report.section("Uptime", "up 3 days").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "\n=== Memory ===\nMem: 16Gi\n\
             [CPU] lscpu not installed, skipping\n\
             \n=== Swap devices ===\n\
             \n=== Uptime ===\nup 3 days\n"
        );
    }

    #[test]
    fn test_create_refuses_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit_x.txt");
        fs::write(&path, "").unwrap();
        assert!(matches!(
            AuditReport::create(&path),
            Err(WardenError::SessionClash(_))
        ));
    }
}
