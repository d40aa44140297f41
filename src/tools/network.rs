//! Network quick-fix actions

use std::collections::HashMap;
use std::time::Duration;

use super::{Action, Tool};
use crate::exec::CommandSpec;

pub struct NetworkTool {
    actions: HashMap<String, Action>,
}

impl NetworkTool {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    fn insert(&mut self, action: Action) {
        self.actions.insert(action.id.clone(), action);
    }
}

impl Default for NetworkTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for NetworkTool {
    fn name(&self) -> &'static str {
        "network"
    }

    fn description(&self) -> &'static str {
        "Network diagnostics and quick fixes"
    }

    fn register_actions(&mut self) {
        self.insert(
            Action::new("flush_dns", "Flush DNS", "ipconfig /flushdns").step(
                CommandSpec::cmd("ipconfig /flushdns").timeout(Duration::from_secs(15)),
            ),
        );

        self.insert(
            Action::new("winsock_reset", "Reset Winsock", "netsh winsock reset")
                .step(
                    CommandSpec::cmd("netsh winsock reset")
                        .timeout(Duration::from_secs(15))
                        .elevated(),
                )
                .requires_admin(),
        );

        self.insert(
            Action::new("renew_ip", "Renew IP", "ipconfig /release && ipconfig /renew")
                .step(CommandSpec::cmd("ipconfig /release").timeout(Duration::from_secs(30)))
                .step(CommandSpec::cmd("ipconfig /renew").timeout(Duration::from_secs(30))),
        );

        self.insert(
            Action::new("ping_host", "Ping Host", "ping -n 4 <host>").step(
                CommandSpec::powershell("ping -n 4 $env:TARGET_HOST")
                    .timeout(Duration::from_secs(20))
                    .env("TARGET_HOST", "8.8.8.8"),
            ),
        );

        self.insert(
            Action::new("curl_head", "HTTP HEAD", "curl -I <url>").step(
                CommandSpec::powershell("curl.exe -I $env:TARGET_URL")
                    .timeout(Duration::from_secs(20))
                    .env("TARGET_URL", "https://www.microsoft.com"),
            ),
        );
    }

    fn actions(&self) -> &HashMap<String, Action> {
        &self.actions
    }
}
