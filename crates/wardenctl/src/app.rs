//! Session driver: wires the real system into a run context and runs the
//! selected mode.

use crate::context::{RunContext, TerminalOperator};
use crate::{log_sink, menu, pipeline, plan, privilege, report};
use tracing::info;
use warden_common::ui::{self, MessageType};
use warden_common::{
    Echo, Session, SystemRunner, WardenConfig, WardenError, WardenResult, WhichResolver,
    EXIT_SUCCESS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unattended,
    Interactive,
}

/// Run `mode` against an already built context
pub fn execute(mode: Mode, ctx: &mut RunContext<'_>) -> WardenResult<()> {
    info!("Session {} starting in {:?} mode", ctx.session.timestamp(), mode);
    match mode {
        Mode::Unattended => {
            let summary = pipeline::run(&plan::unattended(ctx.config), ctx)?;
            ui::ok(ctx.transcript, format!("Maintenance finished: {}", summary.tally()));
            Ok(())
        }
        Mode::Interactive => menu::run(ctx),
    }
}

/// Full session on the live system. Returns the process exit code.
///
/// `config_error` is a configuration problem found before the log existed;
/// it is reported once the session log is open.
pub fn run(mode: Mode, config: WardenConfig, config_error: Option<WardenError>) -> i32 {
    let session = Session::start(&config.log_dir);

    let mut sink = match log_sink::init(&session, &config, Echo::Console) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("{}", ui::format_message(MessageType::Error, &e.to_string(), false));
            return e.exit_code();
        }
    };
    log_sink::install_diagnostics(&sink.transcript);

    if let Some(e) = config_error {
        ui::warn(&sink.transcript, format!("{}; using defaults", e));
    }

    let runner = SystemRunner;
    let resolver = WhichResolver;
    let mut operator = TerminalOperator::new(sink.transcript.clone());
    let transcript = sink.transcript.clone();

    let mut ctx = RunContext {
        session: &session,
        config: &config,
        runner: &runner,
        resolver: &resolver,
        operator: &mut operator,
        transcript: &transcript,
        audit: &mut sink.audit,
        invoking_user: privilege::invoking_user(),
    };

    let result = execute(mode, &mut ctx);
    report::print_summary(&session, &transcript);

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            ui::error(&transcript, format!("Session ended early: {}", e));
            e.exit_code()
        }
    }
}
