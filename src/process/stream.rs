//! Concurrent consumers for child process output streams.

use crate::{MessageListener, StreamError};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::task::JoinHandle;

/// Completion signal of a stream being drained in the background.
///
/// Resolves once the stream reached end-of-stream, or with a
/// [`StreamError`] if reading failed or the drain task died. Dropping the
/// handle aborts the drain, including when a timed-out run is abandoned
/// while a grandchild still holds the pipe open.
#[derive(Debug)]
pub struct StreamHandle {
    task: JoinHandle<Result<(), StreamError>>,
}

impl StreamHandle {
    /// Start `drain` on the tokio runtime and return its completion handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(drain: F) -> Self
    where
        F: Future<Output = Result<(), StreamError>> + Send + 'static,
    {
        Self {
            task: tokio::spawn(drain),
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Future for StreamHandle {
    type Output = Result<(), StreamError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(StreamError::Task(e))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A consumer of one process output stream.
///
/// `handle_stream` must not block: it starts draining `stream` in the
/// background and returns a [`StreamHandle`] that resolves when the stream is
/// exhausted. The same handler value may be used for both stdout and stderr,
/// in which case it is driven from two tasks concurrently.
pub trait AsyncStreamHandler: Send + Sync {
    /// Begin consuming `stream`.
    fn handle_stream<R>(&self, stream: R) -> StreamHandle
    where
        R: AsyncRead + Unpin + Send + 'static;
}

/// Forwards every line of a stream to a [`MessageListener`].
///
/// Lines are passed through as-is (invalid UTF-8 is replaced) and always end
/// with `"\n"`, including a final line the process left unterminated.
#[derive(Clone)]
pub struct LineForwarder {
    listener: Arc<dyn MessageListener>,
}

impl LineForwarder {
    /// Create a forwarder that reports to `listener`.
    pub fn new(listener: Arc<dyn MessageListener>) -> Self {
        Self { listener }
    }
}

impl std::fmt::Debug for LineForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineForwarder").finish_non_exhaustive()
    }
}

impl AsyncStreamHandler for LineForwarder {
    fn handle_stream<R>(&self, stream: R) -> StreamHandle
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let listener = Arc::clone(&self.listener);
        StreamHandle::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut line = Vec::new();
            loop {
                line.clear();
                if reader.read_until(b'\n', &mut line).await? == 0 {
                    return Ok(());
                }
                if line.last() != Some(&b'\n') {
                    line.push(b'\n');
                }
                listener.message(&String::from_utf8_lossy(&line));
            }
        })
    }
}

/// Accumulates everything written to a stream.
///
/// Clones share the same buffer, so a clone kept by the caller can read the
/// collected text with [`output`](Self::output) after the run completes.
#[derive(Debug, Clone, Default)]
pub struct OutputCollector {
    buffer: Arc<Mutex<String>>,
}

impl OutputCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text collected so far.
    pub fn output(&self) -> String {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AsyncStreamHandler for OutputCollector {
    fn handle_stream<R>(&self, mut stream: R) -> StreamHandle
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::clone(&self.buffer);
        StreamHandle::spawn(async move {
            let mut bytes = Vec::new();
            stream.read_to_end(&mut bytes).await?;
            buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_str(&String::from_utf8_lossy(&bytes));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn recording_listener() -> (Arc<dyn MessageListener>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Arc<dyn MessageListener> =
            Arc::new(move |text: &str| sink.lock().unwrap().push(text.to_string()));
        (listener, seen)
    }

    #[tokio::test]
    async fn test_line_forwarder_sends_each_line() {
        let (listener, seen) = recording_listener();
        let forwarder = LineForwarder::new(listener);

        let input: &'static [u8] = b"Beginning install\nDone.\n";
        forwarder.handle_stream(input).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["Beginning install\n", "Done.\n"]);
    }

    #[tokio::test]
    async fn test_line_forwarder_terminates_last_line() {
        let (listener, seen) = recording_listener();
        let forwarder = LineForwarder::new(listener);

        let input: &'static [u8] = b"no newline";
        forwarder.handle_stream(input).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["no newline\n"]);
    }

    #[tokio::test]
    async fn test_line_forwarder_empty_stream() {
        let (listener, seen) = recording_listener();
        let forwarder = LineForwarder::new(listener);

        let input: &'static [u8] = b"";
        forwarder.handle_stream(input).await.unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_output_collector_collects_everything() {
        let collector = OutputCollector::new();
        let reader = collector.clone();

        let input: &'static [u8] = b"line one\nline two";
        collector.handle_stream(input).await.unwrap();

        assert_eq!(reader.output(), "line one\nline two");
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "read failed")))
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_observable() {
        let collector = OutputCollector::new();
        let result = collector.handle_stream(FailingReader).await;
        assert!(matches!(result, Err(StreamError::Io(_))));
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_drain() {
        use tokio::io::AsyncWriteExt;

        let (mut writer, reader) = tokio::io::duplex(8);
        let handle = OutputCollector::new().handle_stream(reader);
        drop(handle);

        // The reader half goes away with the aborted task, so writes start failing.
        let closed = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                if writer.write_all(b"still running").await.is_err() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(closed.is_ok(), "drain task kept reading after its handle was dropped");
    }

    #[tokio::test]
    async fn test_panicking_drain_resolves_in_error() {
        let handle = StreamHandle::spawn(async {
            if true {
                panic!("drain exploded");
            }
            Ok::<(), StreamError>(())
        });
        let result = handle.await;
        assert!(matches!(result, Err(StreamError::Task(_))));
    }
}
