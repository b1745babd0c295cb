//! Console messaging
//!
//! Every user-facing status line goes through here so it is styled the same
//! way and lands in the session transcript.

use crate::transcript::Transcript;
use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::OnceLock;

/// Message types determine prefix and color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Ok,
    Warn,
    Error,
}

impl MessageType {
    pub fn prefix(&self) -> &'static str {
        match self {
            MessageType::Info => "[INFO]",
            MessageType::Ok => "[ OK ]",
            MessageType::Warn => "[WARNING]",
            MessageType::Error => "[ERROR]",
        }
    }
}

fn color_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    })
}

/// Render a status line (no I/O)
pub fn format_message(kind: MessageType, message: &str, color: bool) -> String {
    let prefix = kind.prefix();
    if !color {
        return format!("{} {}", prefix, message);
    }
    let prefix = match kind {
        MessageType::Info => prefix.blue().bold().to_string(),
        MessageType::Ok => prefix.green().bold().to_string(),
        MessageType::Warn => prefix.yellow().bold().to_string(),
        MessageType::Error => prefix.red().bold().to_string(),
    };
    format!("{} {}", prefix, message)
}

pub fn say(transcript: &Transcript, kind: MessageType, message: impl AsRef<str>) {
    transcript.line(&format_message(kind, message.as_ref(), color_enabled()));
}

pub fn info(transcript: &Transcript, message: impl AsRef<str>) {
    say(transcript, MessageType::Info, message);
}

pub fn ok(transcript: &Transcript, message: impl AsRef<str>) {
    say(transcript, MessageType::Ok, message);
}

pub fn warn(transcript: &Transcript, message: impl AsRef<str>) {
    say(transcript, MessageType::Warn, message);
}

pub fn error(transcript: &Transcript, message: impl AsRef<str>) {
    say(transcript, MessageType::Error, message);
}

/// Step heading
pub fn section(transcript: &Transcript, title: &str) {
    let line = format!("==> {}", title);
    if color_enabled() {
        transcript.line(&line.cyan().bold().to_string());
    } else {
        transcript.line(&line);
    }
}

/// Session start banner
pub fn banner(transcript: &Transcript, started_at: DateTime<Local>) {
    let rule = "=".repeat(64);
    transcript.line(&rule);
    transcript.line(&format!(
        "archwarden {} maintenance session started {}",
        env!("CARGO_PKG_VERSION"),
        started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    transcript.line(&rule);
}

/// Untouched command output, streamed while a step runs
pub fn output(transcript: &Transcript, line: &str) {
    if color_enabled() {
        transcript.line(&format!("    {}", line.dimmed()));
    } else {
        transcript.line(&format!("    {}", line));
    }
}
