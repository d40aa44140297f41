//! Scripted process runner for tests
//!
//! Responses are consumed in submission order per matching program, and
//! every call is recorded, so tests can assert both outcomes and spawn
//! counts.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::process::{ProcessCommand, ProcessError, ProcessOutput, ProcessRunner};

enum MockOutcome {
    Output(ProcessOutput),
    Timeout(Duration),
}

struct MockResponse {
    program: String,
    outcome: MockOutcome,
}

#[derive(Clone, Default)]
pub struct MockProcessRunner {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<ProcessCommand>>>,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next run of `program`.
    pub fn respond(&self, program: &str, exit_code: i32, stdout: &str) {
        self.push(
            program,
            MockOutcome::Output(ProcessOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: String::new(),
                duration: Duration::from_millis(10),
            }),
        );
    }

    /// Queue a timeout failure for the next run of `program`.
    pub fn respond_timeout(&self, program: &str, timeout: Duration) {
        self.push(program, MockOutcome::Timeout(timeout));
    }

    fn push(&self, program: &str, outcome: MockOutcome) {
        self.responses.lock().unwrap().push_back(MockResponse {
            program: program.to_string(),
            outcome,
        });
    }

    /// Every command this runner was asked to spawn, in call order.
    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.calls.lock().unwrap().push(command.clone());

        let response = {
            let mut responses = self.responses.lock().unwrap();
            let position = responses
                .iter()
                .position(|response| response.program == command.program);
            position.and_then(|index| responses.remove(index))
        };

        match response {
            Some(MockResponse {
                outcome: MockOutcome::Output(output),
                ..
            }) => Ok(output),
            Some(MockResponse {
                outcome: MockOutcome::Timeout(timeout),
                ..
            }) => Err(ProcessError::Timeout(timeout)),
            None => Err(ProcessError::MockExpectationNotMet(format!(
                "no scripted response for command: {}",
                command.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_are_consumed_in_order() {
        let mock = MockProcessRunner::new();
        mock.respond("step", 0, "one");
        mock.respond("step", 7, "two");

        let first = mock
            .run(ProcessCommand::from_argv(vec!["step".to_string()]))
            .await
            .unwrap();
        let second = mock
            .run(ProcessCommand::from_argv(vec!["step".to_string()]))
            .await
            .unwrap();
        assert_eq!(first.stdout, "one");
        assert_eq!(second.exit_code, 7);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn unscripted_command_is_an_error() {
        let mock = MockProcessRunner::new();
        let result = mock
            .run(ProcessCommand::from_argv(vec!["surprise".to_string()]))
            .await;
        assert!(matches!(
            result,
            Err(ProcessError::MockExpectationNotMet(_))
        ));
    }
}
