//! Error types for install script execution.
//!
//! Every variant maps to one of three failure kinds: the script could not be
//! started, the script ran and failed, or running it broke down in between.

use crate::{CommandExecutionError, StreamError};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running the install script.
///
/// # Example
///
/// ```rust
/// use managed_sdk::InstallError;
///
/// let error = InstallError::NonZeroExit { exit_code: 10 };
/// assert_eq!(error.to_string(), "Installer exited with non-zero exit code: 10");
/// assert_eq!(error.exit_code(), Some(10));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The script provider returned an empty command line.
    #[error("Install script command line is empty")]
    EmptyScriptCommand,

    /// The install script could not be started.
    #[error("Failed to start install script: {0}")]
    Io(#[source] io::Error),

    /// The install script ran but exited with a non-zero code.
    ///
    /// The message format is fixed; tooling parses the code out of it.
    #[error("Installer exited with non-zero exit code: {exit_code}")]
    NonZeroExit {
        /// The code the script exited with.
        exit_code: i32,
    },

    /// Waiting for the script or draining its output failed.
    #[error("Install script execution failed: {0}")]
    Execution(#[source] CommandExecutionError),

    /// The script did not finish within the configured timeout.
    #[error("Installer timed out after {duration:?}")]
    Timeout {
        /// How long the script was allowed to run.
        duration: Duration,
    },
}

impl InstallError {
    /// Exit code of the install script, for [`NonZeroExit`](Self::NonZeroExit).
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code } => Some(*exit_code),
            _ => None,
        }
    }

    /// An actionable suggestion for fixing this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_sdk::InstallError;
    ///
    /// let error = InstallError::NonZeroExit { exit_code: 1 };
    /// assert!(error.fix_suggestion().contains("output"));
    /// ```
    pub fn fix_suggestion(&self) -> &'static str {
        match self {
            Self::EmptyScriptCommand => "Check that the SDK archive contains its install script",
            Self::Io(_) => {
                "Check that the install script exists, is executable, and the SDK directory exists"
            }
            Self::NonZeroExit { .. } => "See the install script output above for details",
            Self::Execution(_) => "Retry the installation; the script output could not be read",
            Self::Timeout { .. } => "Retry with a longer timeout or check for a stuck install script",
        }
    }
}

impl From<CommandExecutionError> for InstallError {
    fn from(error: CommandExecutionError) -> Self {
        match error {
            CommandExecutionError::Spawn { source, .. } => Self::Io(source),
            CommandExecutionError::EmptyCommand => Self::EmptyScriptCommand,
            other => Self::Execution(other),
        }
    }
}

impl From<StreamError> for InstallError {
    fn from(error: StreamError) -> Self {
        Self::Execution(CommandExecutionError::Stream(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let error = InstallError::NonZeroExit { exit_code: 10 };
        assert_eq!(
            error.to_string(),
            "Installer exited with non-zero exit code: 10"
        );
    }

    #[test]
    fn test_negative_exit_code_message() {
        let error = InstallError::NonZeroExit { exit_code: -1 };
        assert_eq!(
            error.to_string(),
            "Installer exited with non-zero exit code: -1"
        );
    }

    #[test]
    fn test_spawn_failure_becomes_io() {
        let error = InstallError::from(CommandExecutionError::Spawn {
            program: "install.sh".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        match error {
            InstallError::Io(source) => assert_eq!(source.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected Io, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_fault_becomes_execution() {
        let error = InstallError::from(StreamError::Io(io::Error::new(
            io::ErrorKind::Other,
            "broken",
        )));
        assert!(matches!(
            error,
            InstallError::Execution(CommandExecutionError::Stream(_))
        ));
        assert_eq!(error.exit_code(), None);
    }

    #[test]
    fn test_all_variants_have_fix() {
        let errors = vec![
            InstallError::EmptyScriptCommand,
            InstallError::Io(io::Error::new(io::ErrorKind::NotFound, "missing")),
            InstallError::NonZeroExit { exit_code: 2 },
            InstallError::Execution(CommandExecutionError::Wait(io::Error::new(
                io::ErrorKind::Other,
                "wait failed",
            ))),
            InstallError::Timeout {
                duration: Duration::from_secs(1),
            },
        ];

        for error in errors {
            assert!(
                !error.fix_suggestion().is_empty(),
                "fix_suggestion() should return non-empty string for {:?}",
                error
            );
        }
    }
}
