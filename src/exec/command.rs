//! Unified command specification and result types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Timeout applied to a spec that does not choose its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Which shell or interpreter wrapping strategy runs a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// Direct process invocation, no shell wrapper
    #[default]
    Process,
    /// PowerShell, preferring `pwsh` over Windows PowerShell
    Powershell,
    /// Classic command interpreter in run-one-command mode
    Cmd,
    /// Re-invocation of the current executable's module dispatcher
    Module,
}

/// Command payload: a single command line or an explicit argv.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandLine {
    Line(String),
    Argv(Vec<String>),
}

impl CommandLine {
    /// Collapse to a single command line. The argv form is joined with
    /// single spaces, which loses the original quoting; shell executors
    /// accept this limitation.
    pub fn joined(&self) -> String {
        match self {
            CommandLine::Line(line) => line.clone(),
            CommandLine::Argv(argv) => argv.join(" "),
        }
    }
}

impl From<&str> for CommandLine {
    fn from(line: &str) -> Self {
        CommandLine::Line(line.to_string())
    }
}

impl From<String> for CommandLine {
    fn from(line: String) -> Self {
        CommandLine::Line(line)
    }
}

impl From<Vec<String>> for CommandLine {
    fn from(argv: Vec<String>) -> Self {
        CommandLine::Argv(argv)
    }
}

impl From<&[&str]> for CommandLine {
    fn from(argv: &[&str]) -> Self {
        CommandLine::Argv(argv.iter().map(|s| s.to_string()).collect())
    }
}

/// Specification for running a single command step.
///
/// Immutable once constructed: runners borrow specs and results carry
/// their own copy, so one spec may back any number of executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(default)]
    pub executor: ExecutorKind,
    pub command: CommandLine,
    /// `None` waits indefinitely.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Requires the hosting process to already hold elevated privileges.
    #[serde(default)]
    pub elevate: bool,
    /// Extra environment variables merged over the inherited environment.
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

fn default_timeout() -> Option<Duration> {
    Some(DEFAULT_TIMEOUT)
}

impl CommandSpec {
    pub fn new(executor: ExecutorKind, command: impl Into<CommandLine>) -> Self {
        Self {
            executor,
            command: command.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            elevate: false,
            env: None,
            cwd: None,
        }
    }

    pub fn process(command: impl Into<CommandLine>) -> Self {
        Self::new(ExecutorKind::Process, command)
    }

    pub fn powershell(command: impl Into<CommandLine>) -> Self {
        Self::new(ExecutorKind::Powershell, command)
    }

    pub fn cmd(command: impl Into<CommandLine>) -> Self {
        Self::new(ExecutorKind::Cmd, command)
    }

    pub fn module(command: impl Into<CommandLine>) -> Self {
        Self::new(ExecutorKind::Module, command)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait indefinitely for the command to finish.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn elevated(mut self) -> Self {
        self.elevate = true;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Human-readable form for logs and status lines.
    pub fn display(&self) -> String {
        match &self.command {
            CommandLine::Line(line) => line.clone(),
            CommandLine::Argv(argv) => shell_words::join(argv),
        }
    }
}

/// Outcome of one executed command step.
///
/// Created only by the command runner once the child has completed;
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    pub spec: CommandSpec,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_defaults() {
        let spec = CommandSpec::cmd("ipconfig /flushdns");
        assert_eq!(spec.executor, ExecutorKind::Cmd);
        assert_eq!(spec.timeout, Some(DEFAULT_TIMEOUT));
        assert!(!spec.elevate);
        assert!(spec.env.is_none());
        assert!(spec.cwd.is_none());
    }

    #[test]
    fn spec_deserializes_from_toml() {
        let spec: CommandSpec = toml::from_str(
            r#"
            executor = "cmd"
            command = "netsh winsock reset"
            timeout = "15s"
            elevate = true
            "#,
        )
        .unwrap();
        assert_eq!(spec.executor, ExecutorKind::Cmd);
        assert_eq!(spec.command, CommandLine::Line("netsh winsock reset".into()));
        assert_eq!(spec.timeout, Some(Duration::from_secs(15)));
        assert!(spec.elevate);
    }

    #[test]
    fn spec_deserializes_argv_form_with_defaults() {
        let spec: CommandSpec = toml::from_str(
            r#"
            command = ["ping", "-n", "4", "8.8.8.8"]
            "#,
        )
        .unwrap();
        assert_eq!(spec.executor, ExecutorKind::Process);
        assert_eq!(spec.timeout, Some(DEFAULT_TIMEOUT));
        match spec.command {
            CommandLine::Argv(argv) => assert_eq!(argv.len(), 4),
            CommandLine::Line(_) => panic!("expected argv form"),
        }
    }

    #[test]
    fn joined_collapses_argv() {
        let line = CommandLine::from(&["ipconfig", "/release"][..]);
        assert_eq!(line.joined(), "ipconfig /release");
        let line = CommandLine::from("ipconfig /renew");
        assert_eq!(line.joined(), "ipconfig /renew");
    }

    #[test]
    fn display_quotes_argv_form() {
        let spec = CommandSpec::process(vec!["ping".to_string(), "my host".to_string()]);
        assert_eq!(spec.display(), "ping 'my host'");
    }

    #[test]
    fn result_success_predicate() {
        let spec = CommandSpec::cmd("exit 0");
        let result = CommandResult {
            spec: spec.clone(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::from_millis(12),
        };
        assert!(result.succeeded());
        let failed = CommandResult {
            exit_code: 7,
            ..result
        };
        assert!(!failed.succeeded());
    }
}
