//! Pipeline steps
//!
//! Every step names its own failure policy; nothing about fatality is left to
//! convention.

use crate::probe::ProbeDescriptor;

/// What a failed step does to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole run with a nonzero exit
    Fatal,
    /// Log a warning and go on with the next step
    WarnAndContinue,
}

/// Precondition for a command step; unmet means skipped, not failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Always,
    Tool(String),
    /// Root filesystem is btrfs (and the btrfs tool is installed)
    BtrfsRoot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Mutating shell command, output streamed to the session log
    Command {
        script: String,
        gate: Gate,
        /// Run as the user behind sudo instead of root
        as_invoking_user: bool,
    },
    BackupConfigs,
    RebootCheck,
    ContainerCleanup,
    Probes(Vec<ProbeDescriptor>),
    Recommendations,
    FinalReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub policy: FailurePolicy,
    pub action: Action,
}

impl Step {
    pub fn new(name: impl Into<String>, policy: FailurePolicy, action: Action) -> Self {
        Self {
            name: name.into(),
            policy,
            action,
        }
    }

    /// Ungated, non-fatal shell command
    pub fn command(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self::new(
            name,
            FailurePolicy::WarnAndContinue,
            Action::Command {
                script: script.into(),
                gate: Gate::Always,
                as_invoking_user: false,
            },
        )
    }

    /// Non-fatal probe battery
    pub fn probes(name: impl Into<String>, probes: Vec<ProbeDescriptor>) -> Self {
        Self::new(name, FailurePolicy::WarnAndContinue, Action::Probes(probes))
    }

    pub fn fatal(mut self) -> Self {
        self.policy = FailurePolicy::Fatal;
        self
    }

    pub fn requires(self, tool: impl Into<String>) -> Self {
        self.gated(Gate::Tool(tool.into()))
    }

    pub fn on_btrfs_root(self) -> Self {
        self.gated(Gate::BtrfsRoot)
    }

    pub fn as_invoking_user(mut self) -> Self {
        if let Action::Command {
            as_invoking_user, ..
        } = &mut self.action
        {
            *as_invoking_user = true;
        }
        self
    }

    fn gated(mut self, new_gate: Gate) -> Self {
        if let Action::Command { gate, .. } = &mut self.action {
            *gate = new_gate;
        }
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.policy == FailurePolicy::Fatal
    }
}
