//! End-to-end SDK installation: extract the archive, then run its script.

use crate::{
    platform_script_provider, ExtractError, Extractor, InstallError, InstallOptions, Installer,
    LineForwarder, MessageListener, ProcessExecutorFactory,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Directory the SDK archive unpacks to, below the install root.
pub const DEFAULT_SDK_DIRECTORY_NAME: &str = "google-cloud-sdk";

/// Options for [`SdkInstaller`].
///
/// # Example
///
/// ```rust
/// use managed_sdk::SdkInstallOptions;
///
/// let options = SdkInstallOptions::default();
/// assert_eq!(options.sdk_directory_name, "google-cloud-sdk");
/// assert!(!options.install.usage_reporting);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkInstallOptions {
    /// Options passed through to the [`Installer`].
    pub install: InstallOptions,
    /// Name of the top-level directory inside the archive.
    pub sdk_directory_name: String,
}

impl Default for SdkInstallOptions {
    fn default() -> Self {
        Self {
            install: InstallOptions::default(),
            sdk_directory_name: DEFAULT_SDK_DIRECTORY_NAME.to_string(),
        }
    }
}

/// Errors from [`SdkInstaller::install`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SdkInstallError {
    /// Extracting the archive failed.
    #[error("Failed to extract SDK archive: {0}")]
    Extract(#[from] ExtractError),

    /// The archive did not contain the expected SDK directory.
    #[error("SDK directory not found after extraction: {}", path.display())]
    MissingSdkHome {
        /// Where the SDK home was expected.
        path: PathBuf,
    },

    /// The install script failed; see [`InstallError`].
    #[error(transparent)]
    Install(#[from] InstallError),
}

/// Installs an SDK archive into a managed location.
///
/// Extraction progress and the install script's output both go to the same
/// listener, in that order.
pub struct SdkInstaller {
    install_root: PathBuf,
    options: SdkInstallOptions,
    listener: Arc<dyn MessageListener>,
}

impl SdkInstaller {
    /// Installer that unpacks archives into `install_root` and reports
    /// extraction and script output to `listener`.
    pub fn new(
        install_root: impl Into<PathBuf>,
        options: SdkInstallOptions,
        listener: Arc<dyn MessageListener>,
    ) -> Self {
        Self {
            install_root: install_root.into(),
            options,
            listener,
        }
    }

    /// Directory archives are extracted into.
    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Where the SDK lives once extracted.
    pub fn sdk_home(&self) -> PathBuf {
        self.install_root.join(&self.options.sdk_directory_name)
    }

    /// Extract `archive` and run the SDK's install script.
    ///
    /// Returns the SDK home directory. Calling this again re-extracts over
    /// the existing tree and reruns the script.
    pub async fn install(&self, archive: &Path) -> Result<PathBuf, SdkInstallError> {
        // Step 1: Extract
        let report = Extractor::new(archive, &self.install_root, Arc::clone(&self.listener))
            .extract()
            .await?;
        tracing::debug!(entries = report.entries.len(), "SDK archive extracted");

        // Step 2: Locate the SDK home
        let sdk_home = self.sdk_home();
        if !sdk_home.is_dir() {
            return Err(SdkInstallError::MissingSdkHome { path: sdk_home });
        }

        // Step 3: Run the install script from the SDK home
        let installer = Installer::new(
            &sdk_home,
            platform_script_provider(&sdk_home),
            self.options.install.clone(),
            Arc::clone(&self.listener),
            ProcessExecutorFactory,
            LineForwarder::new(Arc::clone(&self.listener)),
            LineForwarder::new(Arc::clone(&self.listener)),
        );
        installer.install().await?;

        tracing::info!(sdk_home = %sdk_home.display(), "SDK installed");
        Ok(sdk_home)
    }
}

impl std::fmt::Debug for SdkInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkInstaller")
            .field("install_root", &self.install_root)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
