//! Workflow definitions and execution
//!
//! A workflow is an ordered list of references to registered tool
//! actions, each with its own failure policy. The engine resolves the
//! references and drives the sequence runner.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod engine;
pub mod parser;

pub use engine::{WorkflowEngine, WorkflowError, WorkflowReport, WorkflowStatus};
pub use parser::{list_sample_workflows, load_workflow_file};

/// Per-step failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFail {
    #[default]
    Stop,
    Continue,
}

/// One step of a workflow: a dotted `tool.action` reference plus policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub action_ref: String,
    /// Reserved for parameter substitution.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub on_fail: OnFail,
}

impl WorkflowStep {
    pub fn new(action_ref: &str) -> Self {
        Self {
            action_ref: action_ref.to_string(),
            params: HashMap::new(),
            on_fail: OnFail::Stop,
        }
    }

    pub fn on_fail(mut self, policy: OnFail) -> Self {
        self.on_fail = policy;
        self
    }
}

/// A loadable workflow definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_defaults_to_stop_policy() {
        let step: WorkflowStep = toml::from_str(r#"action_ref = "network.flush_dns""#).unwrap();
        assert_eq!(step.on_fail, OnFail::Stop);
        assert!(step.params.is_empty());
    }

    #[test]
    fn continue_policy_parses() {
        let step: WorkflowStep = toml::from_str(
            r#"
            action_ref = "network.renew_ip"
            on_fail = "continue"
            "#,
        )
        .unwrap();
        assert_eq!(step.on_fail, OnFail::Continue);
    }

    #[test]
    fn workflow_config_parses_step_list() {
        let config: WorkflowConfig = toml::from_str(
            r#"
            name = "network-reset"

            [[steps]]
            action_ref = "network.flush_dns"

            [[steps]]
            action_ref = "network.winsock_reset"
            on_fail = "continue"
            "#,
        )
        .unwrap();
        assert_eq!(config.name.as_deref(), Some("network-reset"));
        assert_eq!(config.steps.len(), 2);
        assert_eq!(config.steps[1].on_fail, OnFail::Continue);
    }
}
