//! Recommendations
//!
//! Reads the session log back, condenses its severity lines and adds a disk
//! usage table. The log itself is never modified.

use crate::context::RunContext;
use crate::pipeline::{StepOutcome, StepResult};
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::sync::OnceLock;
use warden_common::{ui, Invocation};

pub const SECTION_TITLE: &str = "Recommendations";

pub const DF_COMMAND: &str = "df -h --output=source,fstype,size,used,avail,pcent,target";

/// Pseudo and in-memory filesystems left out of the usage table
pub const VIRTUAL_FS: &[&str] = &[
    "tmpfs",
    "devtmpfs",
    "proc",
    "sysfs",
    "squashfs",
    "overlay",
    "efivarfs",
    "devpts",
    "cgroup",
    "cgroup2",
    "securityfs",
    "debugfs",
    "tracefs",
    "configfs",
    "fusectl",
    "mqueue",
    "hugetlbfs",
    "pstore",
    "bpf",
    "autofs",
    "ramfs",
    "nsfs",
];

fn severity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)error|warning|fail").expect("static pattern"))
}

/// Line mentions an error, warning or failure
pub fn is_severity_line(line: &str) -> bool {
    severity_pattern().is_match(line)
}

/// Distinct severity lines with their occurrence count, most frequent first,
/// ties in line order
pub fn severity_digest(log: &str) -> Vec<(usize, String)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in log.lines() {
        let line = line.trim_end();
        if is_severity_line(line) {
            *counts.entry(line).or_default() += 1;
        }
    }

    let mut digest: Vec<(usize, String)> = counts
        .into_iter()
        .map(|(line, count)| (count, line.to_string()))
        .collect();
    digest.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    digest
}

/// One mounted filesystem from `df`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskUsageRow {
    pub source: String,
    pub fstype: String,
    pub size: String,
    pub used: String,
    pub avail: String,
    /// `None` when df prints `-`
    pub percent: Option<u8>,
    pub target: String,
}

impl DiskUsageRow {
    pub fn is_virtual(&self) -> bool {
        VIRTUAL_FS.contains(&self.fstype.as_str())
    }

    pub fn exceeds(&self, threshold: u8) -> bool {
        self.percent.is_some_and(|p| p >= threshold)
    }
}

/// Parse [`DF_COMMAND`] output, dropping the header, malformed lines and
/// virtual filesystems
pub fn parse_df(output: &str) -> Vec<DiskUsageRow> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 7 {
                return None;
            }
            Some(DiskUsageRow {
                source: fields[0].to_string(),
                fstype: fields[1].to_string(),
                size: fields[2].to_string(),
                used: fields[3].to_string(),
                avail: fields[4].to_string(),
                percent: fields[5].trim_end_matches('%').parse().ok(),
                // mount points may contain spaces
                target: fields[6..].join(" "),
            })
        })
        .filter(|row| !row.is_virtual())
        .collect()
}

/// Section body: digest first, then the usage table
pub fn render(digest: &[(usize, String)], rows: &[DiskUsageRow], threshold: u8) -> String {
    let mut out = String::new();

    out.push_str("Session log findings:\n");
    if digest.is_empty() {
        out.push_str("  nothing notable in the session log\n");
    }
    for (count, line) in digest {
        let _ = writeln!(out, "  {:>4}x  {}", count, line);
    }

    let _ = writeln!(out, "\nDisk usage (flagged at {}% and above):", threshold);
    if rows.is_empty() {
        out.push_str("  no disk usage data\n");
        return out;
    }

    let source_width = rows.iter().map(|r| r.source.len()).max().unwrap_or(0).max(10);
    let _ = writeln!(
        out,
        "  {:<sw$}  {:<8}  {:>6}  {:>6}  {:>6}  {:>5}  {}",
        "Filesystem",
        "Type",
        "Size",
        "Used",
        "Avail",
        "Use%",
        "Mounted on",
        sw = source_width
    );
    for row in rows {
        let percent = row
            .percent
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| "-".to_string());
        let flag = if row.exceeds(threshold) { "  <-- HIGH" } else { "" };
        let _ = writeln!(
            out,
            "  {:<sw$}  {:<8}  {:>6}  {:>6}  {:>6}  {:>5}  {}{}",
            row.source,
            row.fstype,
            row.size,
            row.used,
            row.avail,
            percent,
            row.target,
            flag,
            sw = source_width
        );
    }
    out
}

pub fn generate(ctx: &mut RunContext<'_>) -> StepResult {
    let log = fs::read_to_string(ctx.transcript.path())?;
    let digest = severity_digest(&log);

    let rows = match ctx.runner.capture(&Invocation::shell(DF_COMMAND)) {
        Ok(outcome) if outcome.success() => parse_df(&outcome.output),
        Ok(outcome) => {
            ui::warn(
                ctx.transcript,
                format!("df exited abnormally ({})", outcome.failure_reason()),
            );
            parse_df(&outcome.output)
        }
        Err(e) => {
            ui::warn(ctx.transcript, format!("Could not run df: {}", e));
            Vec::new()
        }
    };

    let threshold = ctx.config.disk_usage_alert_percent;
    let flagged = rows.iter().filter(|row| row.exceeds(threshold)).count();
    ctx.audit
        .section(SECTION_TITLE, &render(&digest, &rows, threshold))?;

    ui::info(
        ctx.transcript,
        format!(
            "{} distinct severity line(s), {} filesystem(s) at or above {}%",
            digest.len(),
            flagged,
            threshold
        ),
    );
    Ok(StepOutcome::Completed)
}
