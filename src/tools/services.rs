//! Windows service management actions

use std::collections::HashMap;
use std::time::Duration;

use super::{Action, Tool};
use crate::exec::CommandSpec;

pub struct ServicesTool {
    actions: HashMap<String, Action>,
}

impl ServicesTool {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    fn insert(&mut self, action: Action) {
        self.actions.insert(action.id.clone(), action);
    }
}

impl Default for ServicesTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ServicesTool {
    fn name(&self) -> &'static str {
        "services"
    }

    fn description(&self) -> &'static str {
        "Manage Windows services"
    }

    fn register_actions(&mut self) {
        self.insert(
            Action::new("list", "List Services", "Get-Service").step(
                CommandSpec::powershell("Get-Service | ConvertTo-Json")
                    .timeout(Duration::from_secs(15)),
            ),
        );

        // The target service name is supplied through the TARGET_SERVICE
        // environment override at invocation time.
        self.insert(
            Action::new("start", "Start Service", "Start-Service")
                .step(
                    CommandSpec::powershell("Start-Service -Name $env:TARGET_SERVICE")
                        .env("TARGET_SERVICE", "")
                        .elevated(),
                )
                .requires_admin(),
        );

        self.insert(
            Action::new("stop", "Stop Service", "Stop-Service")
                .step(
                    CommandSpec::powershell("Stop-Service -Name $env:TARGET_SERVICE")
                        .env("TARGET_SERVICE", "")
                        .elevated(),
                )
                .requires_admin(),
        );
    }

    fn actions(&self) -> &HashMap<String, Action> {
        &self.actions
    }
}
