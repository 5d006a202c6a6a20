//! Options for running the install script.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for controlling an install attempt.
///
/// Use [`Default::default()`] for the standard behavior: usage reporting
/// disabled and no deadline.
///
/// # Example
///
/// ```rust
/// use managed_sdk::InstallOptions;
/// use std::time::Duration;
///
/// let options = InstallOptions::default();
/// assert!(!options.usage_reporting);
/// assert_eq!(options.timeout, None);
///
/// let options = InstallOptions {
///     usage_reporting: true,
///     timeout: Some(Duration::from_secs(600)),
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallOptions {
    /// Value passed to the script as `--usage-reporting=<true|false>`.
    ///
    /// Default: `false`.
    pub usage_reporting: bool,

    /// Maximum time to wait for the script and its output.
    ///
    /// When exceeded the script is killed and the attempt fails with
    /// [`InstallError::Timeout`](crate::InstallError::Timeout).
    ///
    /// Default: `None` (wait indefinitely).
    pub timeout: Option<Duration>,
}

impl InstallOptions {
    /// The `--usage-reporting` flag for these options.
    pub(crate) fn usage_reporting_flag(&self) -> String {
        format!("--usage-reporting={}", self.usage_reporting)
    }
}
