//! Command execution layer
//!
//! Runs shell invocations on the real system and hands back their combined
//! output and exit code WITHOUT interpretation. Callers decide what a nonzero
//! exit means.
//!
//! Two seams live here so the pipeline can be exercised without touching the
//! host: [`CommandRunner`] (who executes) and [`ToolResolver`] (what is
//! installed).

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;

/// A shell script to run, optionally as another (non-root) user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub script: String,
    pub run_as: Option<String>,
}

impl Invocation {
    pub fn shell(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            run_as: None,
        }
    }

    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        self.run_as = Some(user.into());
        self
    }

    /// Build the process: `sh -c` with stderr folded into stdout so the
    /// captured text keeps the order the tool produced it in.
    pub fn to_command(&self) -> Command {
        let script = format!("exec 2>&1\n{}", self.script);
        match &self.run_as {
            Some(user) => {
                let mut command = Command::new("sudo");
                command.args(["-u", user.as_str(), "-H", "--", "sh", "-c"]).arg(script);
                command
            }
            None => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(script);
                command
            }
        }
    }
}

/// Result of a finished invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr text
    pub output: String,
    pub duration_ms: u64,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short human-readable reason for a failed run
    pub fn failure_reason(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Executes invocations
pub trait CommandRunner: Send + Sync {
    /// Run to completion, feeding each output line to `on_line` as it arrives.
    fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> std::io::Result<CommandOutcome>;

    /// Run and only capture the output
    fn capture(&self, invocation: &Invocation) -> std::io::Result<CommandOutcome> {
        self.run(invocation, &mut |_| {})
    }
}

/// Runs invocations on the host through `sh`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> std::io::Result<CommandOutcome> {
        let start = Instant::now();
        debug!("Executing: {:?}", invocation);

        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Only sudo itself can still write here; drain it off-thread so a
        // chatty failure never blocks the child.
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf);
            }
            buf
        });

        let mut output = String::new();
        let streamed = match child.stdout.take() {
            Some(stdout) => stream_lines(stdout, on_line, &mut output),
            None => Ok(()),
        };

        // Reap the child and the drain thread even when reading failed; the
        // pipe is closed by then, so the child cannot block on it.
        let status = child.wait();
        let stderr = stderr_reader.join().unwrap_or_default();
        streamed?;
        let status = status?;
        for line in String::from_utf8_lossy(&stderr).lines() {
            on_line(line);
            output.push_str(line);
            output.push('\n');
        }

        let outcome = CommandOutcome {
            exit_code: status.code(),
            output,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            "Finished in {}ms with {:?}",
            outcome.duration_ms, outcome.exit_code
        );
        Ok(outcome)
    }
}

/// Feed `source` to `on_line` line by line, appending each line to `output`.
/// Lines already read stay in `output` when a read fails.
fn stream_lines<R: Read>(
    source: R,
    on_line: &mut dyn FnMut(&str),
    output: &mut String,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        on_line(line);
        output.push_str(line);
        output.push('\n');
    }
}

/// Answers "is this tool installed?"
pub trait ToolResolver: Send + Sync {
    fn is_installed(&self, tool: &str) -> bool;
}

/// Resolves tools through `which`, like the shell's `command -v`
#[derive(Debug, Default, Clone, Copy)]
pub struct WhichResolver;

impl ToolResolver for WhichResolver {
    fn is_installed(&self, tool: &str) -> bool {
        Command::new("which")
            .arg(tool)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}
