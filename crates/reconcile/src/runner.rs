//! Subprocess seam for stores that live behind external command-line tools.
//!
//! Reconcilers never spawn processes directly; they go through a
//! [`ToolRunner`], so the same logic runs against the real system
//! ([`SystemRunner`]) or against scripted responses in tests
//! ([`RecordingRunner`]).

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Captured output of a finished external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            status: output.status.code(),
        }
    }
}

impl CommandOutput {
    /// A successful run with the given stdout text.
    pub fn with_stdout(stdout: &str) -> Self {
        Self {
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
            status: Some(0),
        }
    }

    /// A successful run with no output.
    pub fn ok() -> Self {
        Self::with_stdout("")
    }

    /// A failed run with the given exit code and stderr text.
    pub fn failed(status: i32, stderr: &str) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
            status: Some(status),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Get stdout as a string.
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string.
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Turn a non-zero exit into an [`Error::ExternalTool`].
    pub fn require_success(self, command: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        let status = match self.status {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr_str();
        let stderr = stderr.trim();
        let detail = if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        };
        Err(Error::ExternalTool {
            command: command.to_string(),
            detail,
        })
    }
}

/// Render a program and its arguments as one display line.
pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Runs external commands on behalf of reconcilers.
///
/// A non-zero exit is reported in the returned [`CommandOutput`], not as an
/// error, because existence checks rely on it; failure to spawn at all is
/// an [`Error::ExternalTool`].
pub trait ToolRunner {
    /// Run a command to completion, capturing its output.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a command with `input` written to its stdin.
    fn run_with_stdin(&self, program: &str, args: &[&str], input: &str) -> Result<CommandOutput>;
}

/// [`ToolRunner`] backed by real subprocesses.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| Error::spawn(command_line(program, args), source))?;
        Ok(output.into())
    }

    fn run_with_stdin(&self, program: &str, args: &[&str], input: &str) -> Result<CommandOutput> {
        let line = command_line(program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::spawn(line.clone(), source))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(|source| Error::spawn(line.clone(), source))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|source| Error::spawn(line, source))?;
        Ok(output.into())
    }
}

/// One invocation observed by a [`RecordingRunner`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl RecordedCall {
    /// The invocation as one display line (stdin excluded).
    pub fn line(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        command_line(&self.program, &args)
    }
}

struct Stub {
    prefix: String,
    output: CommandOutput,
}

/// Scripted [`ToolRunner`] for tests: records every invocation and replays
/// configured responses. Commands without a matching stub succeed with
/// empty output.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    stubs: Mutex<Vec<Stub>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `output` to any command line starting with `prefix`.
    /// Earlier stubs win when prefixes overlap.
    pub fn stub(&self, prefix: &str, output: CommandOutput) {
        self.stubs.lock().unwrap().push(Stub {
            prefix: prefix.to_string(),
            output,
        });
    }

    /// Every invocation observed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Observed invocations as display lines.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::line).collect()
    }

    fn respond(&self, line: &str) -> CommandOutput {
        let stubs = self.stubs.lock().unwrap();
        stubs
            .iter()
            .find(|s| line.starts_with(&s.prefix))
            .map(|s| s.output.clone())
            .unwrap_or_else(CommandOutput::ok)
    }

    fn record(&self, program: &str, args: &[&str], stdin: Option<&str>) -> CommandOutput {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            stdin: stdin.map(str::to_string),
        };
        let line = call.line();
        self.calls.lock().unwrap().push(call);
        self.respond(&line)
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        Ok(self.record(program, args, None))
    }

    fn run_with_stdin(&self, program: &str, args: &[&str], input: &str) -> Result<CommandOutput> {
        Ok(self.record(program, args, Some(input)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins() {
        assert_eq!(command_line("net", &["conf", "list"]), "net conf list");
        assert_eq!(command_line("true", &[]), "true");
    }

    #[test]
    fn require_success_passes_zero_exit() {
        let output = CommandOutput::with_stdout("fine");
        assert!(output.require_success("anything").is_ok());
    }

    #[test]
    fn require_success_reports_status_and_stderr() {
        let err = CommandOutput::failed(2, "boom\n")
            .require_success("net conf list")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("net conf list"));
        assert!(message.contains("exit status 2"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn recording_runner_replays_stubs_in_order() {
        let runner = RecordingRunner::new();
        runner.stub("net conf list", CommandOutput::with_stdout("[global]\n"));
        runner.stub("net", CommandOutput::failed(1, "no"));

        let listed = runner.run("net", &["conf", "list"]).unwrap();
        assert_eq!(listed.stdout_str(), "[global]\n");

        let other = runner.run("net", &["ads", "join"]).unwrap();
        assert!(!other.success());
    }

    #[test]
    fn recording_runner_records_stdin() {
        let runner = RecordingRunner::new();
        runner
            .run_with_stdin("smbpasswd", &["-s", "-a", "bob"], "pw\npw\n")
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].line(), "smbpasswd -s -a bob");
        assert_eq!(calls[0].stdin.as_deref(), Some("pw\npw\n"));
    }

    #[test]
    fn unstubbed_commands_succeed_empty() {
        let runner = RecordingRunner::new();
        let output = runner.run("pdbedit", &["--user=bob"]).unwrap();
        assert!(output.success());
        assert!(output.stdout_str().is_empty());
    }
}
