//! Error taxonomy for the execution core

use std::time::Duration;
use thiserror::Error;

use super::command::CommandSpec;
use super::process::ProcessError;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The spec demanded elevation but the hosting process is not
    /// elevated. Raised before any child is spawned.
    #[error(
        "command requested elevation but the application is not running \
         with administrative privileges"
    )]
    ElevationDenied,

    /// The child exceeded its allotted duration and was killed.
    #[error("command '{}' timed out after {timeout:?}", .spec.display())]
    CommandTimedOut {
        spec: Box<CommandSpec>,
        timeout: Duration,
    },

    /// The spec produced no program to run.
    #[error("command specification produced an empty argv")]
    EmptyCommand,

    /// The sequence was cancelled before it started running.
    #[error("sequence cancelled before it started")]
    Cancelled,

    /// The worker pool no longer accepts submissions.
    #[error("command runner is shut down")]
    PoolShutdown,

    #[error(transparent)]
    Process(#[from] ProcessError),
}
