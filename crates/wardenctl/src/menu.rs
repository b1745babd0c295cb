//! Interactive menu

use crate::context::RunContext;
use crate::{pipeline, plan};
use crate::step::Step;
use tracing::debug;
use warden_common::{ui, WardenConfig, WardenResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SystemUpdate,
    Cleanup,
    SecurityProbe,
    ExtendedAudit,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 5] = [
        MenuChoice::SystemUpdate,
        MenuChoice::Cleanup,
        MenuChoice::SecurityProbe,
        MenuChoice::ExtendedAudit,
        MenuChoice::Exit,
    ];

    /// Menu number or name (case-insensitive); `None` for anything else
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().to_lowercase();
        match input.as_str() {
            "1" | "update" | "system update" => Some(MenuChoice::SystemUpdate),
            "2" | "cleanup" | "clean" => Some(MenuChoice::Cleanup),
            "3" | "security" | "basic security" => Some(MenuChoice::SecurityProbe),
            "4" | "audit" | "extended audit" => Some(MenuChoice::ExtendedAudit),
            "5" | "exit" | "quit" | "q" => Some(MenuChoice::Exit),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::SystemUpdate => "System update",
            MenuChoice::Cleanup => "Cleanup",
            MenuChoice::SecurityProbe => "Basic security check",
            MenuChoice::ExtendedAudit => "Extended audit",
            MenuChoice::Exit => "Exit",
        }
    }

    pub fn steps(&self, config: &WardenConfig) -> Vec<Step> {
        match self {
            MenuChoice::SystemUpdate => plan::update_bundle(config),
            MenuChoice::Cleanup => plan::cleanup_bundle(),
            MenuChoice::SecurityProbe => plan::security_bundle(),
            MenuChoice::ExtendedAudit => plan::audit_bundle(),
            MenuChoice::Exit => Vec::new(),
        }
    }
}

fn show(ctx: &RunContext<'_>) {
    ui::section(ctx.transcript, "Archwarden menu");
    for (i, choice) in MenuChoice::ALL.iter().enumerate() {
        ui::output(ctx.transcript, &format!("{}) {}", i + 1, choice.label()));
    }
}

/// Loop until exit or end of input. A fatal step or an abort inside a bundle
/// ends the session like in unattended mode.
pub fn run(ctx: &mut RunContext<'_>) -> WardenResult<()> {
    loop {
        show(ctx);
        let input = match ctx.operator.read_line("Choose an option: ") {
            Some(input) => input,
            None => {
                debug!("End of input at menu");
                return Ok(());
            }
        };

        match MenuChoice::parse(&input) {
            Some(MenuChoice::Exit) => return Ok(()),
            Some(choice) => {
                let steps = choice.steps(ctx.config);
                let summary = pipeline::run(&steps, ctx)?;
                ui::ok(ctx.transcript, format!("{}: {}", choice.label(), summary.tally()));
            }
            None => ui::warn(ctx.transcript, format!("Unknown option '{}'", input)),
        }
    }
}
