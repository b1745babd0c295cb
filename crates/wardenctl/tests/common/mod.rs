//! Scripted stand-ins for the host: commands, installed tools and the
//! operator, plus a harness owning one session in a temporary log directory.

#![allow(dead_code)]

use chrono::{Local, TimeZone};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;
use warden_common::{
    CommandOutcome, CommandRunner, Echo, Invocation, Session, ToolResolver, Transcript,
    WardenConfig,
};
use wardenctl::audit::AuditReport;
use wardenctl::log_sink;
use wardenctl::{Operator, RunContext};

/// Kernel release with a modules directory in every harness
pub const INSTALLED_KERNEL: &str = "6.9.1-arch1-1";

pub fn outcome(exit_code: i32, output: &str) -> CommandOutcome {
    CommandOutcome {
        exit_code: Some(exit_code),
        output: output.to_string(),
        duration_ms: 1,
    }
}

/// Answers invocations by the first rule whose pattern occurs in the script;
/// anything unmatched succeeds silently.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<(String, CommandOutcome)>,
    unspawnable: Vec<String>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn on(&mut self, pattern: &str, exit_code: i32, output: &str) {
        self.rules.push((pattern.to_string(), outcome(exit_code, output)));
    }

    /// Invocations containing `pattern` fail to start
    pub fn unspawnable(&mut self, pattern: &str) {
        self.unspawnable.push(pattern.to_string());
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.calls().iter().any(|call| call.script.contains(pattern))
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<CommandOutcome> {
        self.calls.lock().unwrap().push(invocation.clone());

        if self
            .unspawnable
            .iter()
            .any(|p| invocation.script.contains(p.as_str()))
        {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file or directory"));
        }

        let outcome = self
            .rules
            .iter()
            .find(|(pattern, _)| invocation.script.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| outcome(0, ""));
        for line in outcome.output.lines() {
            on_line(line);
        }
        Ok(outcome)
    }
}

#[derive(Default)]
pub struct FakeResolver {
    installed: HashSet<String>,
}

impl FakeResolver {
    pub fn with(tools: &[&str]) -> Self {
        Self {
            installed: tools.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn install(&mut self, tool: &str) {
        self.installed.insert(tool.to_string());
    }
}

impl ToolResolver for FakeResolver {
    fn is_installed(&self, tool: &str) -> bool {
        self.installed.contains(tool)
    }
}

/// Replays canned answers; runs out as end of input
#[derive(Default)]
pub struct ScriptedOperator {
    pub confirmations: VecDeque<bool>,
    pub lines: VecDeque<String>,
    pub questions: Vec<String>,
}

impl ScriptedOperator {
    pub fn answering(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.confirmations.pop_front().unwrap_or(false)
    }

    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.questions.push(prompt.to_string());
        self.lines.pop_front()
    }
}

/// One session in a scratch log directory, created the way a real run
/// creates it
pub struct Harness {
    pub dir: TempDir,
    pub session: Session,
    pub config: WardenConfig,
    pub runner: FakeRunner,
    pub resolver: FakeResolver,
    pub operator: ScriptedOperator,
    pub transcript: Transcript,
    pub audit: AuditReport,
    pub invoking_user: Option<String>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut WardenConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let etc = dir.path().join("etc");
        fs::create_dir_all(&etc).unwrap();
        fs::write(etc.join("pacman.conf"), "[options]\nHoldPkg = pacman glibc\n").unwrap();
        let modules = dir.path().join("modules");
        fs::create_dir_all(modules.join(INSTALLED_KERNEL)).unwrap();

        let mut config = WardenConfig {
            log_dir: dir.path().join("logs"),
            backup_files: vec![etc.join("pacman.conf"), etc.join("absent.conf")],
            modules_root: modules,
            ..Default::default()
        };
        adjust(&mut config);

        let session = Session::at(
            &config.log_dir,
            Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        );
        let sink = log_sink::init(&session, &config, Echo::Silent).unwrap();

        Self {
            dir,
            session,
            config,
            runner: FakeRunner::default(),
            resolver: FakeResolver::default(),
            operator: ScriptedOperator::default(),
            transcript: sink.transcript,
            audit: sink.audit,
            invoking_user: None,
        }
    }

    pub fn ctx(&mut self) -> RunContext<'_> {
        RunContext {
            session: &self.session,
            config: &self.config,
            runner: &self.runner,
            resolver: &self.resolver,
            operator: &mut self.operator,
            transcript: &self.transcript,
            audit: &mut self.audit,
            invoking_user: self.invoking_user.clone(),
        }
    }

    pub fn log(&self) -> String {
        fs::read_to_string(self.session.log_path()).unwrap()
    }

    pub fn audit_text(&self) -> String {
        fs::read_to_string(self.session.audit_path()).unwrap()
    }

    pub fn log_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.config.log_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn final_report(&self) -> PathBuf {
        self.session.final_report_path().to_path_buf()
    }
}
