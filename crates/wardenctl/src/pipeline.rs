//! Pipeline runner
//!
//! Executes steps strictly in order. A failing step either ends the session
//! (fatal policy, operator abort) or is logged as a warning; already applied
//! changes are never rolled back.

use crate::context::RunContext;
use crate::step::{Action, FailurePolicy, Gate, Step};
use crate::{containers, maintenance, probe, recommendations, report};
use tracing::debug;
use warden_common::{ui, Invocation, WardenError, WardenResult};

/// Step finished without failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// Precondition unmet; reason for the log
    Skipped(String),
}

/// Step did not finish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    Failed(String),
    /// Operator chose to end the session
    Aborted,
}

impl From<std::io::Error> for StepFailure {
    fn from(e: std::io::Error) -> Self {
        StepFailure::Failed(e.to_string())
    }
}

pub type StepResult = Result<StepOutcome, StepFailure>;

/// Tally of a finished pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub completed: usize,
    pub skipped: usize,
    pub warnings: usize,
}

impl PipelineSummary {
    /// One-line status for the session log. Worded to stay out of the
    /// severity digest: the failures it counts are already logged.
    pub fn tally(&self) -> String {
        format!(
            "{} completed, {} skipped, {} not clean",
            self.completed, self.skipped, self.warnings
        )
    }
}

/// Run `steps` in order, stopping at the first fatal failure
pub fn run(steps: &[Step], ctx: &mut RunContext<'_>) -> WardenResult<PipelineSummary> {
    let mut summary = PipelineSummary::default();

    for step in steps {
        ui::section(ctx.transcript, &step.name);

        match execute(step, ctx) {
            Ok(StepOutcome::Completed) => {
                ui::ok(ctx.transcript, format!("{} done", step.name));
                summary.completed += 1;
            }
            Ok(StepOutcome::Skipped(reason)) => {
                ui::info(ctx.transcript, format!("Skipped {}: {}", step.name, reason));
                summary.skipped += 1;
            }
            Err(StepFailure::Aborted) => {
                ui::error(
                    ctx.transcript,
                    format!("Session aborted by operator during {}", step.name),
                );
                return Err(WardenError::Aborted {
                    step: step.name.clone(),
                });
            }
            Err(StepFailure::Failed(reason)) => match step.policy {
                FailurePolicy::Fatal => {
                    ui::error(ctx.transcript, format!("{} failed: {}", step.name, reason));
                    return Err(WardenError::FatalStep {
                        step: step.name.clone(),
                        reason,
                    });
                }
                FailurePolicy::WarnAndContinue => {
                    ui::warn(
                        ctx.transcript,
                        format!("{} failed: {}; continuing", step.name, reason),
                    );
                    summary.warnings += 1;
                }
            },
        }
    }

    debug!("Pipeline finished: {:?}", summary);
    Ok(summary)
}

/// Run a single step's action
pub fn execute(step: &Step, ctx: &mut RunContext<'_>) -> StepResult {
    match &step.action {
        Action::Command {
            script,
            gate,
            as_invoking_user,
        } => run_command(script, gate, *as_invoking_user, ctx),
        Action::BackupConfigs => maintenance::backup_configs(ctx),
        Action::RebootCheck => maintenance::reboot_check(ctx),
        Action::ContainerCleanup => containers::cleanup(ctx),
        Action::Probes(probes) => {
            probe::run_all(probes, ctx)?;
            Ok(StepOutcome::Completed)
        }
        Action::Recommendations => recommendations::generate(ctx),
        Action::FinalReport => {
            let path = report::finalize(ctx.session)?;
            ui::info(ctx.transcript, format!("Final report written to {}", path.display()));
            Ok(StepOutcome::Completed)
        }
    }
}

fn run_command(
    script: &str,
    gate: &Gate,
    as_invoking_user: bool,
    ctx: &mut RunContext<'_>,
) -> StepResult {
    match gate {
        Gate::Always => {}
        Gate::Tool(tool) => {
            if !ctx.resolver.is_installed(tool) {
                return Ok(StepOutcome::Skipped(format!("{} not installed", tool)));
            }
        }
        Gate::BtrfsRoot => {
            if !maintenance::root_is_btrfs(ctx) {
                return Ok(StepOutcome::Skipped("root filesystem is not btrfs".to_string()));
            }
        }
    }

    let mut invocation = Invocation::shell(script);
    if as_invoking_user {
        match &ctx.invoking_user {
            Some(user) => invocation = invocation.as_user(user.clone()),
            None => {
                ui::warn(ctx.transcript, "No invoking user (SUDO_USER) to run as");
                return Ok(StepOutcome::Skipped("needs a non-root invoking user".to_string()));
            }
        }
    }

    let transcript = ctx.transcript;
    let outcome = ctx
        .runner
        .run(&invocation, &mut |line| ui::output(transcript, line))?;

    if outcome.success() {
        Ok(StepOutcome::Completed)
    } else {
        Err(StepFailure::Failed(outcome.failure_reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally() {
        let summary = PipelineSummary {
            completed: 10,
            skipped: 13,
            warnings: 2,
        };
        assert_eq!(summary.tally(), "10 completed, 13 skipped, 2 not clean");
    }
}
