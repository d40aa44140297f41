//! Workflow engine
//!
//! Resolves each step's action reference, runs its command steps
//! through the sequence runner, and applies the per-step failure
//! policy. A failed result under the `stop` policy halts the workflow
//! normally; a sequence-level error (elevation, timeout) aborts it.

use serde::Serialize;
use thiserror::Error;

use super::{OnFail, WorkflowStep};
use crate::exec::{AsyncCommandRunner, CommandResult, ExecError, SequenceError};
use crate::tools::{ToolRegistry, UnknownAction};

/// Terminal disposition of a workflow run that did not abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Every step was processed.
    Completed,
    /// A step failed under the `stop` policy; later steps never ran.
    Halted,
}

/// Accumulated results plus how the run ended.
#[derive(Debug)]
pub struct WorkflowReport {
    pub results: Vec<CommandResult>,
    pub status: WorkflowStatus,
    pub steps_completed: usize,
    pub steps_total: usize,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),

    /// A sequence aborted mid-run. Results accumulated before the abort
    /// ride along so the caller can report partial progress.
    #[error("workflow aborted: {source}")]
    Aborted {
        completed: Vec<CommandResult>,
        #[source]
        source: ExecError,
    },
}

pub struct WorkflowEngine {
    registry: ToolRegistry,
    runner: AsyncCommandRunner,
}

impl WorkflowEngine {
    pub fn new(registry: ToolRegistry, runner: AsyncCommandRunner) -> Self {
        Self { registry, runner }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn runner(&self) -> &AsyncCommandRunner {
        &self.runner
    }

    /// Execute workflow steps in order under the caller's admin context.
    pub async fn execute(
        &self,
        steps: &[WorkflowStep],
        is_admin: bool,
    ) -> Result<WorkflowReport, WorkflowError> {
        let mut results = Vec::new();

        for (index, step) in steps.iter().enumerate() {
            let action = self.registry.resolve(&step.action_ref)?;
            tracing::info!(
                "workflow step {}/{}: {} ({})",
                index + 1,
                steps.len(),
                step.action_ref,
                action.label
            );

            let step_results = match self
                .runner
                .run_sequence(action.exec_steps.clone(), is_admin)
                .await
            {
                Ok(step_results) => step_results,
                Err(SequenceError { completed, error }) => {
                    results.extend(completed);
                    return Err(WorkflowError::Aborted {
                        completed: results,
                        source: error,
                    });
                }
            };

            let step_failed = step_results.iter().any(|result| !result.succeeded());
            results.extend(step_results);

            if step_failed && step.on_fail == OnFail::Stop {
                tracing::warn!("workflow halted at step {}: {}", index + 1, step.action_ref);
                return Ok(WorkflowReport {
                    results,
                    status: WorkflowStatus::Halted,
                    steps_completed: index + 1,
                    steps_total: steps.len(),
                });
            }
        }

        Ok(WorkflowReport {
            results,
            status: WorkflowStatus::Completed,
            steps_completed: steps.len(),
            steps_total: steps.len(),
        })
    }

    /// Stop accepting new work; running sequences finish on their own.
    pub fn shutdown(&self) {
        self.runner.shutdown();
    }
}
