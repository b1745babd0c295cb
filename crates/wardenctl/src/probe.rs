//! Probe - one read-only diagnostic command whose output becomes an audit
//! report section.
//!
//! Probes never fail the pipeline. A nonzero exit is recorded like any other
//! output; only probes that declare a fallback line get it appended when their
//! command exits nonzero (the `grep ... || echo "nothing found"` pattern).

use crate::context::RunContext;
use std::io;
use tracing::debug;
use warden_common::{ui, Invocation};

/// When a probe may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Always runs
    Always,
    /// Needs the tool; a single placeholder line is recorded when missing
    RequiresTool(&'static str),
    /// Needs the tool; silently omitted when missing
    WhenPresent(&'static str),
}

impl Requirement {
    pub fn tool(&self) -> Option<&'static str> {
        match self {
            Requirement::Always => None,
            Requirement::RequiresTool(tool) | Requirement::WhenPresent(tool) => Some(tool),
        }
    }
}

/// Static description of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeDescriptor {
    /// Stable identifier
    pub name: &'static str,
    /// Section title in the audit report
    pub header: &'static str,
    pub requirement: Requirement,
    /// Shell command; stderr is merged into the captured text
    pub command: &'static str,
    /// Line appended when the command exits nonzero
    pub fallback: Option<&'static str>,
}

impl ProbeDescriptor {
    pub const fn new(name: &'static str, header: &'static str, command: &'static str) -> Self {
        Self {
            name,
            header,
            requirement: Requirement::Always,
            command,
            fallback: None,
        }
    }

    pub const fn requires(self, tool: &'static str) -> Self {
        Self {
            requirement: Requirement::RequiresTool(tool),
            ..self
        }
    }

    pub const fn when_present(self, tool: &'static str) -> Self {
        Self {
            requirement: Requirement::WhenPresent(tool),
            ..self
        }
    }

    pub const fn or_else(self, fallback: &'static str) -> Self {
        Self {
            fallback: Some(fallback),
            ..self
        }
    }

    /// Report line written instead of a section when the tool is missing
    pub fn placeholder(&self, tool: &str) -> String {
        format!("[{}] {} not installed, skipping", self.header, tool)
    }
}

/// What happened to a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Section written; exit code of the command (`None` if it never ran or
    /// was killed)
    Recorded { exit_code: Option<i32> },
    /// Required tool missing, placeholder written
    Skipped,
    /// Optional tool missing, nothing written
    Omitted,
}

/// Run one probe and append its section to the audit report.
///
/// Only an audit write failure is an error.
pub fn run(probe: &ProbeDescriptor, ctx: &mut RunContext<'_>) -> io::Result<ProbeOutcome> {
    if let Some(tool) = probe.requirement.tool() {
        if !ctx.resolver.is_installed(tool) {
            return match probe.requirement {
                Requirement::WhenPresent(_) => {
                    debug!("Probe {} omitted: {} not installed", probe.name, tool);
                    Ok(ProbeOutcome::Omitted)
                }
                _ => {
                    ui::info(
                        ctx.transcript,
                        format!("{}: {} not installed, skipping", probe.header, tool),
                    );
                    ctx.audit.line(&probe.placeholder(tool))?;
                    Ok(ProbeOutcome::Skipped)
                }
            };
        }
    }

    ui::info(ctx.transcript, format!("Probing: {}", probe.header));

    let (mut body, exit_code) = match ctx.runner.capture(&Invocation::shell(probe.command)) {
        Ok(outcome) => (outcome.output, outcome.exit_code),
        Err(e) => (format!("could not run `{}`: {}\n", probe.command, e), None),
    };

    if exit_code != Some(0) {
        debug!("Probe {} exited with {:?}", probe.name, exit_code);
        if let Some(fallback) = probe.fallback {
            body.push_str(fallback);
            body.push('\n');
        }
    }

    ctx.audit.section(probe.header, &body)?;
    Ok(ProbeOutcome::Recorded { exit_code })
}

/// Run a battery of probes in declaration order
pub fn run_all(
    probes: &[ProbeDescriptor],
    ctx: &mut RunContext<'_>,
) -> io::Result<Vec<ProbeOutcome>> {
    let mut outcomes = Vec::with_capacity(probes.len());
    for probe in probes {
        outcomes.push(run(probe, ctx)?);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let probe = ProbeDescriptor::new("orphans", "Orphaned packages", "pacman -Qtdq")
            .requires("pacman")
            .or_else("No orphaned packages found");

        assert_eq!(probe.requirement, Requirement::RequiresTool("pacman"));
        assert_eq!(probe.requirement.tool(), Some("pacman"));
        assert_eq!(probe.fallback, Some("No orphaned packages found"));
    }

    #[test]
    fn test_placeholder_names_probe_and_tool() {
        let probe = ProbeDescriptor::new("smart", "Disk health (SMART)", "smartctl -H /dev/sda")
            .requires("smartctl");
        assert_eq!(
            probe.placeholder("smartctl"),
            "[Disk health (SMART)] smartctl not installed, skipping"
        );
    }

    #[test]
    fn test_always_has_no_tool() {
        assert_eq!(Requirement::Always.tool(), None);
        assert_eq!(Requirement::WhenPresent("docker").tool(), Some("docker"));
    }
}
