//! Process spawn seam
//!
//! `ProcessRunner` separates execution policy (elevation, argv
//! construction, result shaping) from the operating system. Production
//! code spawns through tokio; tests substitute [`MockProcessRunner`]
//! to observe spawn attempts without side effects.
//!
//! [`MockProcessRunner`]: super::mock::MockProcessRunner

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Overlay applied over the inherited environment.
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ProcessCommand {
    /// Build from an argv list. The list must be non-empty; the builder
    /// upstream guarantees this.
    pub fn from_argv(mut argv: Vec<String>) -> Self {
        let program = if argv.is_empty() {
            String::new()
        } else {
            argv.remove(0)
        };
        Self {
            program,
            args: argv,
            env: HashMap::new(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured output of a completed process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("process timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Effective child environment: the full inherited environment with the
/// overlay applied key-by-key. Overlay keys replace inherited keys of
/// the same name; everything else passes through unchanged.
pub fn effective_env<I>(inherited: I, overlay: &HashMap<String, String>) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: HashMap<String, String> = inherited.into_iter().collect();
    env.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}

/// Production runner backed by `tokio::process`.
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        if error.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: command.display(),
                source: error,
            }
        }
    }

    fn exit_code_of(status: std::process::ExitStatus) -> i32 {
        if let Some(code) = status.code() {
            return code;
        }
        Self::signal_code(status)
    }

    // Mirror the POSIX convention of reporting signal death as a
    // negative code; the exit code stays an honest i32 either way.
    #[cfg(unix)]
    fn signal_code(status: std::process::ExitStatus) -> i32 {
        use std::os::unix::process::ExitStatusExt;
        status.signal().map(|signal| -signal).unwrap_or(-1)
    }

    #[cfg(not(unix))]
    fn signal_code(_status: std::process::ExitStatus) -> i32 {
        -1
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        tracing::debug!("spawning: {}", command.display());

        let start = Instant::now();
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .env_clear()
            .envs(effective_env(std::env::vars(), &command.env))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must take the child
            // down with it.
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .map_err(|error| Self::map_spawn_error(error, &command))?;

        let output = match command.timeout {
            None => child.wait_with_output().await.map_err(|source| ProcessError::Io {
                command: command.display(),
                source,
            })?,
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(done) => done.map_err(|source| ProcessError::Io {
                    command: command.display(),
                    source,
                })?,
                Err(_elapsed) => {
                    tracing::warn!(
                        "killed '{}' after timeout of {:?}",
                        command.display(),
                        limit
                    );
                    return Err(ProcessError::Timeout(limit));
                }
            },
        };

        let duration = start.elapsed();
        let exit_code = Self::exit_code_of(output.status);
        tracing::debug!(
            "'{}' exited with code {} in {:?}",
            command.display(),
            exit_code,
            duration
        );

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
        })
    }
}
