//! Process spawning with concurrent stdout/stderr draining.

use crate::{AsyncStreamHandler, CommandExecutionError};
use futures::future::join3;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Runs one external command and reports its exit code.
///
/// Callers configure the executor first, then call [`run`](Self::run) once.
/// Executors are created per attempt through a [`CommandExecutorFactory`],
/// which is also the seam tests use to substitute a fake.
pub trait CommandExecutor: Send {
    /// Set the current directory of the spawned process.
    fn set_working_directory(&mut self, directory: PathBuf);

    /// Add environment variables to the spawned process.
    fn set_environment(&mut self, environment: HashMap<String, String>);

    /// Spawn `command`, wire its stdout and stderr to the two handlers, and
    /// wait for the exit code.
    ///
    /// Resolves only after the process has exited *and* both handlers have
    /// drained their stream to the end.
    fn run<O, E>(
        &mut self,
        command: &[String],
        stdout_handler: &O,
        stderr_handler: &E,
    ) -> impl Future<Output = Result<i32, CommandExecutionError>> + Send
    where
        O: AsyncStreamHandler,
        E: AsyncStreamHandler;
}

/// Creates a fresh [`CommandExecutor`] for every install attempt.
pub trait CommandExecutorFactory: Send + Sync {
    /// The executor type produced.
    type Executor: CommandExecutor;

    /// Create a new, unconfigured executor.
    fn new_command_executor(&self) -> Self::Executor;
}

/// [`CommandExecutor`] backed by `tokio::process`.
///
/// The child's stdin is closed, and the child is killed if the `run` future
/// is dropped before it finishes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    working_directory: Option<PathBuf>,
    environment: HashMap<String, String>,
}

impl ProcessExecutor {
    /// Create an executor that inherits the current directory and environment.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandExecutor for ProcessExecutor {
    fn set_working_directory(&mut self, directory: PathBuf) {
        self.working_directory = Some(directory);
    }

    fn set_environment(&mut self, environment: HashMap<String, String>) {
        self.environment = environment;
    }

    async fn run<O, E>(
        &mut self,
        command: &[String],
        stdout_handler: &O,
        stderr_handler: &E,
    ) -> Result<i32, CommandExecutionError>
    where
        O: AsyncStreamHandler,
        E: AsyncStreamHandler,
    {
        let (program, args) = command
            .split_first()
            .ok_or(CommandExecutionError::EmptyCommand)?;

        tracing::debug!(
            ?command,
            working_directory = ?self.working_directory,
            "spawning process"
        );

        let spawned = {
            let mut process = Command::new(program);
            process
                .args(args)
                .envs(&self.environment)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(directory) = &self.working_directory {
                process.current_dir(directory);
            }
            process.spawn()
        };
        let mut child = spawned.map_err(|source| CommandExecutionError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| pipe_missing(program, "stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| pipe_missing(program, "stderr"))?;

        let (status, stdout_result, stderr_result) = join3(
            child.wait(),
            stdout_handler.handle_stream(stdout),
            stderr_handler.handle_stream(stderr),
        )
        .await;

        let status = status.map_err(CommandExecutionError::Wait)?;
        stdout_result?;
        stderr_result?;

        let code = exit_code(status);
        tracing::debug!(%program, exit_code = code, "process exited");
        Ok(code)
    }
}

/// Factory producing [`ProcessExecutor`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutorFactory;

impl CommandExecutorFactory for ProcessExecutorFactory {
    type Executor = ProcessExecutor;

    fn new_command_executor(&self) -> ProcessExecutor {
        ProcessExecutor::new()
    }
}

fn pipe_missing(program: &str, stream: &str) -> CommandExecutionError {
    CommandExecutionError::Spawn {
        program: program.to_string(),
        source: io::Error::new(
            io::ErrorKind::BrokenPipe,
            format!("{stream} of child process was not captured"),
        ),
    }
}

/// Numeric exit code; a Unix process killed by a signal reports `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{LineForwarder, MessageListener, OutputCollector, StreamError, StreamHandle};
    use std::sync::{Arc, Mutex};
    use tokio::io::AsyncRead;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_run_collects_both_streams() {
        let stdout = OutputCollector::new();
        let stderr = OutputCollector::new();
        let mut executor = ProcessExecutor::new();

        let code = executor
            .run(&sh("echo to-out; echo to-err 1>&2"), &stdout, &stderr)
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(stdout.output(), "to-out\n");
        assert_eq!(stderr.output(), "to-err\n");
    }

    #[tokio::test]
    async fn test_run_returns_non_zero_exit_code() {
        let collector = OutputCollector::new();
        let mut executor = ProcessExecutor::new();

        let code = executor
            .run(&sh("exit 10"), &collector, &collector)
            .await
            .unwrap();

        assert_eq!(code, 10);
    }

    #[tokio::test]
    async fn test_run_reports_signal_as_exit_code() {
        let collector = OutputCollector::new();
        let mut executor = ProcessExecutor::new();

        let code = executor
            .run(&sh("kill -9 $$"), &collector, &collector)
            .await
            .unwrap();

        assert_eq!(code, 128 + 9);
    }

    #[tokio::test]
    async fn test_run_uses_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let stdout = OutputCollector::new();
        let stderr = OutputCollector::new();
        let mut executor = ProcessExecutor::new();
        executor.set_working_directory(dir.path().to_path_buf());

        let code = executor.run(&sh("pwd -P"), &stdout, &stderr).await.unwrap();

        assert_eq!(code, 0);
        let reported = PathBuf::from(stdout.output().trim_end());
        assert_eq!(reported, dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_run_passes_environment() {
        let stdout = OutputCollector::new();
        let stderr = OutputCollector::new();
        let mut executor = ProcessExecutor::new();
        executor.set_environment(HashMap::from([(
            "MANAGED_SDK_TEST_VALUE".to_string(),
            "from-env".to_string(),
        )]));

        executor
            .run(&sh("echo $MANAGED_SDK_TEST_VALUE"), &stdout, &stderr)
            .await
            .unwrap();

        assert_eq!(stdout.output(), "from-env\n");
    }

    #[tokio::test]
    async fn test_run_delivers_trailing_output() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Arc<dyn MessageListener> =
            Arc::new(move |text: &str| sink.lock().unwrap().push(text.to_string()));
        let forwarder = LineForwarder::new(listener);
        let mut executor = ProcessExecutor::new();

        executor
            .run(&sh("printf 'first\\nlast'"), &forwarder, &forwarder)
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["first\n", "last\n"]);
    }

    #[tokio::test]
    async fn test_run_missing_program_is_spawn_error() {
        let collector = OutputCollector::new();
        let mut executor = ProcessExecutor::new();

        let result = executor
            .run(
                &["/nonexistent/path/to/install.sh".to_string()],
                &collector,
                &collector,
            )
            .await;

        match result {
            Err(CommandExecutionError::Spawn { program, source }) => {
                assert_eq!(program, "/nonexistent/path/to/install.sh");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_working_directory_is_spawn_error() {
        let collector = OutputCollector::new();
        let mut executor = ProcessExecutor::new();
        executor.set_working_directory(PathBuf::from("/nonexistent/working/directory"));

        let result = executor.run(&sh("true"), &collector, &collector).await;

        assert!(matches!(result, Err(CommandExecutionError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_run_empty_command() {
        let collector = OutputCollector::new();
        let mut executor = ProcessExecutor::new();

        let result = executor.run(&[], &collector, &collector).await;

        assert!(matches!(result, Err(CommandExecutionError::EmptyCommand)));
    }

    struct BrokenHandler;

    impl AsyncStreamHandler for BrokenHandler {
        fn handle_stream<R>(&self, _stream: R) -> StreamHandle
        where
            R: AsyncRead + Unpin + Send + 'static,
        {
            StreamHandle::spawn(async {
                Err::<(), StreamError>(StreamError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "handler broke",
                )))
            })
        }
    }

    #[tokio::test]
    async fn test_run_surfaces_stream_fault() {
        let collector = OutputCollector::new();
        let mut executor = ProcessExecutor::new();

        let result = executor
            .run(&sh("echo hello"), &collector, &BrokenHandler)
            .await;

        assert!(matches!(
            result,
            Err(CommandExecutionError::Stream(StreamError::Io(_)))
        ));
    }

    #[test]
    fn test_factory_creates_fresh_executors() {
        let factory = ProcessExecutorFactory;
        let mut first = factory.new_command_executor();
        first.set_working_directory(PathBuf::from("/tmp"));
        let second = factory.new_command_executor();

        assert_eq!(first.working_directory, Some(PathBuf::from("/tmp")));
        assert_eq!(second.working_directory, None);
    }
}
