//! Container cleanup
//!
//! Pruning stops nothing, but running containers are a sign the machine is
//! busy; the operator gets a chance to end the session first.

use crate::context::RunContext;
use crate::pipeline::{StepFailure, StepOutcome, StepResult};
use tracing::debug;
use warden_common::{ui, Invocation};

pub const RUNTIME: &str = "docker";

/// Count container ids in `docker ps -q` output
pub fn count_running(ps_output: &str) -> usize {
    ps_output.lines().filter(|line| !line.trim().is_empty()).count()
}

pub fn cleanup(ctx: &mut RunContext<'_>) -> StepResult {
    if !ctx.resolver.is_installed(RUNTIME) {
        return Ok(StepOutcome::Skipped(format!("{} not installed", RUNTIME)));
    }

    let ps = ctx.runner.capture(&Invocation::shell("docker ps -q"))?;
    if !ps.success() {
        return Err(StepFailure::Failed(format!(
            "cannot list containers: {}",
            ps.failure_reason()
        )));
    }

    let running = count_running(&ps.output);
    debug!("{} running container(s)", running);
    if running > 0 {
        ui::warn(
            ctx.transcript,
            format!("{} container(s) are running", running),
        );
        if ctx
            .operator
            .confirm("Abort the session before container cleanup?")
        {
            return Err(StepFailure::Aborted);
        }
    }

    let transcript = ctx.transcript;
    let outcome = ctx.runner.run(
        &Invocation::shell("docker system prune -f"),
        &mut |line| ui::output(transcript, line),
    )?;

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
    fn test_count_running() {
        assert_eq!(count_running(""), 0);
        assert_eq!(count_running("\n"), 0);
        assert_eq!(count_running("3f2a9c1b\n8e7d6c5b\n"), 2);
    }
}
