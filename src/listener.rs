//! Progress message sinks.

/// A sink for human-readable progress lines.
///
/// Extraction sends one message per archive entry, and the install step
/// forwards the install script's output line by line. The stdout and stderr
/// forwarders of a single install attempt share one listener and call it
/// from two tasks at once, so implementations must be `Send + Sync` and
/// serialize internally if ordering across the two streams matters to them.
///
/// Any `Fn(&str) + Send + Sync` closure is a listener.
///
/// # Example
///
/// ```rust
/// use managed_sdk::MessageListener;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let listener = move |text: &str| sink.lock().unwrap().push(text.to_string());
///
/// listener.message("/opt/sdk/root\n");
/// assert_eq!(seen.lock().unwrap().len(), 1);
/// ```
pub trait MessageListener: Send + Sync {
    /// Receive one progress message.
    fn message(&self, text: &str);
}

impl<F> MessageListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn message(&self, text: &str) {
        self(text)
    }
}

/// Listener that re-emits every message as a `tracing` event at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl MessageListener for TracingListener {
    fn message(&self, text: &str) {
        tracing::info!("{}", text.trim_end_matches(['\r', '\n']));
    }
}

/// Listener that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl MessageListener for NullListener {
    fn message(&self, _text: &str) {}
}
