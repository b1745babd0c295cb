//! Run context shared by every pipeline step

use crate::audit::AuditReport;
use std::io::{self, BufRead, Write};
use warden_common::{CommandRunner, Session, ToolResolver, Transcript, WardenConfig};

/// Everything a step may touch. Built once per session and passed down; no
/// component reaches for globals.
pub struct RunContext<'a> {
    pub session: &'a Session,
    pub config: &'a WardenConfig,
    pub runner: &'a dyn CommandRunner,
    pub resolver: &'a dyn ToolResolver,
    pub operator: &'a mut dyn Operator,
    pub transcript: &'a Transcript,
    pub audit: &'a mut AuditReport,
    /// Non-root user behind sudo, for user-scoped steps
    pub invoking_user: Option<String>,
}

/// The human at the keyboard
pub trait Operator {
    /// Yes/no question, defaulting to no
    fn confirm(&mut self, question: &str) -> bool;

    /// One line of input; `None` at end of input
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Operator reading from stdin. Prompts go to the terminal, answers are
/// recorded in the session log.
pub struct TerminalOperator {
    transcript: Transcript,
}

impl TerminalOperator {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }
}

impl Operator for TerminalOperator {
    fn confirm(&mut self, question: &str) -> bool {
        let answer = self
            .read_line(&format!("{} [y/N] ", question))
            .unwrap_or_default()
            .to_lowercase();
        answer == "y" || answer == "yes"
    }

    fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = io::stdout().flush();

        let mut response = String::new();
        match io::stdin().lock().read_line(&mut response) {
            Ok(0) | Err(_) => {
                println!();
                self.transcript.record(&format!("{}<end of input>", prompt));
                None
            }
            Ok(_) => {
                let response = response.trim().to_string();
                self.transcript.record(&format!("{}{}", prompt, response));
                Some(response)
            }
        }
    }
}
