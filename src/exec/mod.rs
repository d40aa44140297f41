//! Command execution core
//!
//! Turns declarative [`CommandSpec`] values into supervised process
//! executions: timeout-bounded, privilege-gated, dispatched off the
//! caller's scheduling context by a bounded worker pool.

pub mod builder;
pub mod command;
pub mod error;
pub mod mock;
pub mod process;
pub mod runner;
pub mod sequence;


pub use builder::{build_argv, split_command_line};
pub use command::{CommandLine, CommandResult, CommandSpec, ExecutorKind, DEFAULT_TIMEOUT};
pub use error::ExecError;
pub use mock::MockProcessRunner;
pub use process::{
    effective_env, ProcessCommand, ProcessError, ProcessOutput, ProcessRunner, TokioProcessRunner,
};
pub use runner::CommandRunner;
pub use sequence::{
    AsyncCommandRunner, ExecObserver, SequenceError, SequenceHandle, DEFAULT_WORKERS,
};
