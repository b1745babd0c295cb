//! wardenctl - Arch Linux maintenance and audit
//!
//! Elevates itself, keeps the sudo grant alive and runs the session on a
//! blocking thread; the exit code reflects how the session ended.

use anyhow::{Context, Result};
use clap::Parser;
use warden_common::ui::{self, MessageType};
use warden_common::WardenConfig;
use wardenctl::cli::Cli;
use wardenctl::keeper::TokenKeeper;
use wardenctl::{app, privilege};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = privilege::ensure_elevated() {
        eprintln!("{}", ui::format_message(MessageType::Error, &e.to_string(), false));
        std::process::exit(e.exit_code());
    }

    let (config, config_error) = match WardenConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (WardenConfig::default(), Some(e)),
    };

    let keeper = TokenKeeper::spawn(config.keeper_interval());

    let mode = cli.mode();
    let code = tokio::task::spawn_blocking(move || app::run(mode, config, config_error))
        .await
        .context("Maintenance session panicked")?;

    keeper.stop().await;
    std::process::exit(code);
}
