//! Single-step command runner
//!
//! Enforces the elevation precondition before anything is spawned, builds
//! the argv, delegates the spawn to the [`ProcessRunner`] seam, and shapes
//! the outcome into a [`CommandResult`].

use std::sync::Arc;

use super::builder::build_argv;
use super::command::{CommandResult, CommandSpec};
use super::error::ExecError;
use super::process::{ProcessCommand, ProcessError, ProcessRunner, TokioProcessRunner};

#[derive(Clone)]
pub struct CommandRunner {
    process: Arc<dyn ProcessRunner>,
}

impl CommandRunner {
    pub fn new(process: Arc<dyn ProcessRunner>) -> Self {
        Self { process }
    }

    pub fn production() -> Self {
        Self::new(Arc::new(TokioProcessRunner))
    }

    /// Execute one spec under the caller's admin context.
    ///
    /// A timed-out child is killed and reaped before the error surfaces;
    /// the caller never sees both a result and a timeout for the same
    /// invocation.
    pub async fn run(
        &self,
        spec: &CommandSpec,
        is_admin: bool,
    ) -> Result<CommandResult, ExecError> {
        if spec.elevate && !is_admin {
            return Err(ExecError::ElevationDenied);
        }

        let mut command = ProcessCommand::from_argv(build_argv(spec)?);
        command.env = spec.env.clone().unwrap_or_default();
        command.working_dir = spec.cwd.clone();
        command.timeout = spec.timeout;

        let output = self.process.run(command).await.map_err(|error| match error {
            ProcessError::Timeout(timeout) => ExecError::CommandTimedOut {
                spec: Box::new(spec.clone()),
                timeout,
            },
            other => ExecError::Process(other),
        })?;

        Ok(CommandResult {
            spec: spec.clone(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            duration: output.duration,
        })
    }
}
