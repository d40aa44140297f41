//! # Sanity Suite
//!
//! OS diagnostics and quick-fix toolkit. Remediation actions (flush
//! DNS, reset the network stack, manage services) are declared as
//! command sequences and executed under supervision: timeout-bounded,
//! privilege-gated, and dispatched off the caller's scheduling context.
//!
//! ## Modules
//!
//! - `admin` - elevation detection for the hosting process
//! - `config` - settings and application data directories
//! - `exec` - command specification, supervision and sequence execution
//! - `tools` - declarative action registry (network, services)
//! - `workflow` - multi-action workflows with per-step failure policy
pub mod admin;
pub mod config;
pub mod exec;
pub mod tools;
pub mod workflow;
