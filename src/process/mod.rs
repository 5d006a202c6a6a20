//! Child process execution with streamed output.
//!
//! A [`CommandExecutor`] spawns one process and hands its stdout and stderr
//! to two [`AsyncStreamHandler`]s. `run` only returns once the process has
//! exited and both handlers have drained their stream to the end, so no
//! trailing output is lost.

mod errors;
mod executor;
mod stream;

pub use errors::{CommandExecutionError, StreamError};
pub use executor::{CommandExecutor, CommandExecutorFactory, ProcessExecutor, ProcessExecutorFactory};
pub use stream::{AsyncStreamHandler, LineForwarder, OutputCollector, StreamHandle};
