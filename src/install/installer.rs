//! The install script orchestrator.

use crate::install::{InstallError, InstallOptions, InstallScriptProvider};
use crate::{AsyncStreamHandler, CommandExecutor, CommandExecutorFactory, MessageListener};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::timeout;

/// Flags appended to every script command line, in this order, before
/// `--usage-reporting`.
const FIXED_FLAGS: [&str; 3] = ["--path-update=false", "--command-completion=false", "--quiet"];

/// Drives one run of the SDK install script.
///
/// An `Installer` is built for a single attempt. Each call to
/// [`install`](Self::install) creates a new executor from the factory, so a
/// fake factory is all a test needs to observe what would be run.
pub struct Installer<P, F, O, E> {
    working_directory: PathBuf,
    script_provider: P,
    options: InstallOptions,
    listener: Arc<dyn MessageListener>,
    executor_factory: F,
    stdout_handler: O,
    stderr_handler: E,
}

impl<P, F, O, E> Installer<P, F, O, E>
where
    P: InstallScriptProvider,
    F: CommandExecutorFactory,
    O: AsyncStreamHandler,
    E: AsyncStreamHandler,
{
    /// Create an installer that runs the script in `working_directory`.
    ///
    /// `working_directory` must exist and be the directory the install
    /// script expects to run from, normally the extracted SDK home.
    pub fn new(
        working_directory: impl Into<PathBuf>,
        script_provider: P,
        options: InstallOptions,
        listener: Arc<dyn MessageListener>,
        executor_factory: F,
        stdout_handler: O,
        stderr_handler: E,
    ) -> Self {
        Self {
            working_directory: working_directory.into(),
            script_provider,
            options,
            listener,
            executor_factory,
            stdout_handler,
            stderr_handler,
        }
    }

    /// Directory the install script runs in.
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The full command line: the script's base command followed by
    /// `--path-update=false`, `--command-completion=false`, `--quiet` and
    /// `--usage-reporting=<true|false>`.
    ///
    /// # Errors
    ///
    /// [`InstallError::EmptyScriptCommand`] if the provider returned nothing.
    pub fn command_line(&self) -> Result<Vec<String>, InstallError> {
        let mut command = self.script_provider.script_command_line();
        if command.is_empty() {
            return Err(InstallError::EmptyScriptCommand);
        }
        command.extend(FIXED_FLAGS.iter().map(|flag| flag.to_string()));
        command.push(self.options.usage_reporting_flag());
        Ok(command)
    }

    /// Run the install script to completion.
    ///
    /// Waits until the script has exited and both of its output streams have
    /// been fully drained by the handlers. Nothing is retried.
    ///
    /// # Errors
    ///
    /// - [`InstallError::Io`] if the script could not be started
    /// - [`InstallError::NonZeroExit`] if it exited with a non-zero code
    /// - [`InstallError::Execution`] if waiting or draining output failed
    /// - [`InstallError::Timeout`] if [`InstallOptions::timeout`] elapsed
    pub async fn install(&self) -> Result<(), InstallError> {
        let command = self.command_line()?;

        self.listener
            .message(&format!("Running command : {}\n", command.join(" ")));
        tracing::info!(
            working_directory = %self.working_directory.display(),
            ?command,
            "running install script"
        );

        let mut executor = self.executor_factory.new_command_executor();
        executor.set_working_directory(self.working_directory.clone());
        let run = executor.run(&command, &self.stdout_handler, &self.stderr_handler);

        let exit_code = match self.options.timeout {
            Some(duration) => timeout(duration, run)
                .await
                .map_err(|_| InstallError::Timeout { duration })??,
            None => run.await?,
        };

        if exit_code != 0 {
            tracing::warn!(exit_code, "install script failed");
            return Err(InstallError::NonZeroExit { exit_code });
        }

        tracing::info!("install script completed");
        Ok(())
    }
}

impl<P, F, O, E> std::fmt::Debug for Installer<P, F, O, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("working_directory", &self.working_directory)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
