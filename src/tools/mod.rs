//! Declarative tool and action registry
//!
//! A tool is a named group of actions; an action bundles the command
//! steps that implement one remediation. Tools register their actions
//! once at startup and the table is read-only afterwards.

use std::collections::HashMap;
use thiserror::Error;

use crate::exec::CommandSpec;

pub mod network;
pub mod services;

pub use network::NetworkTool;
pub use services::ServicesTool;

/// A dotted `tool.action` reference that does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{reference}'")]
pub struct UnknownAction {
    pub reference: String,
}

impl UnknownAction {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Declarative description of a tool action.
#[derive(Debug, Clone)]
pub struct Action {
    pub id: String,
    pub label: String,
    pub description: String,
    pub exec_steps: Vec<CommandSpec>,
    pub requires_admin: bool,
}

impl Action {
    pub fn new(id: &str, label: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            exec_steps: Vec::new(),
            requires_admin: false,
        }
    }

    pub fn step(mut self, spec: CommandSpec) -> Self {
        self.exec_steps.push(spec);
        self
    }

    pub fn requires_admin(mut self) -> Self {
        self.requires_admin = true;
        self
    }
}

/// A named group of registered actions.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// Populate the action table. Called once when the tool is added to
    /// a registry.
    fn register_actions(&mut self);

    fn actions(&self) -> &HashMap<String, Action>;

    fn get_action(&self, id: &str) -> Result<&Action, UnknownAction> {
        self.actions()
            .get(id)
            .ok_or_else(|| UnknownAction::new(format!("{}.{}", self.name(), id)))
    }
}

/// Registry resolving dotted `tool.action` references.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the suite's built-in tools.
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NetworkTool::new()));
        registry.register(Box::new(ServicesTool::new()));
        registry
    }

    /// Add a tool and populate its actions.
    pub fn register(&mut self, mut tool: Box<dyn Tool>) {
        tool.register_actions();
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    /// Resolve a dotted `tool.action` reference.
    pub fn resolve(&self, reference: &str) -> Result<&Action, UnknownAction> {
        let (tool_name, action_id) = reference
            .split_once('.')
            .ok_or_else(|| UnknownAction::new(reference))?;
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| UnknownAction::new(reference))?;
        tool.actions()
            .get(action_id)
            .ok_or_else(|| UnknownAction::new(reference))
    }

    /// All registered actions as `(tool, action)` pairs, sorted for
    /// stable listings.
    pub fn list(&self) -> Vec<(&str, &Action)> {
        let mut entries: Vec<(&str, &Action)> = self
            .tools
            .values()
            .flat_map(|tool| {
                tool.actions()
                    .values()
                    .map(move |action| (tool.name(), action))
            })
            .collect();
        entries.sort_by(|a, b| (a.0, a.1.id.as_str()).cmp(&(b.0, b.1.id.as_str())));
        entries
    }
}
