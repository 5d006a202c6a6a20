//! Error types for process execution.

use std::io;
use thiserror::Error;

/// Failure while draining one output stream of a child process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StreamError {
    /// Reading from the stream failed.
    #[error("failed to read process output: {0}")]
    Io(#[from] io::Error),

    /// The task draining the stream panicked or was cancelled.
    #[error("stream handler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors returned by [`CommandExecutor::run`](crate::CommandExecutor::run).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommandExecutionError {
    /// The command line has no program to run.
    #[error("command line is empty")]
    EmptyCommand,

    /// The process could not be started.
    ///
    /// Typical causes are a missing executable, a missing working directory,
    /// or a permission problem.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the process to exit failed.
    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    /// One of the stream handlers reported a fault.
    #[error("output stream handling failed: {0}")]
    Stream(#[from] StreamError),
}
