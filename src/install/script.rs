//! Platform-specific install script command lines.

use std::path::{Path, PathBuf};

/// Supplies the base command line of the install script.
///
/// The returned vector is the executable followed by its arguments, before
/// the [`Installer`](crate::Installer) appends its fixed flags.
pub trait InstallScriptProvider: Send + Sync {
    /// The script command line.
    fn script_command_line(&self) -> Vec<String>;
}

/// Runs `<sdk_root>/install.sh` directly.
#[derive(Debug, Clone)]
pub struct UnixInstallScriptProvider {
    sdk_root: PathBuf,
}

impl UnixInstallScriptProvider {
    /// Provider for the SDK extracted at `sdk_root`.
    pub fn new(sdk_root: impl Into<PathBuf>) -> Self {
        Self {
            sdk_root: sdk_root.into(),
        }
    }
}

impl InstallScriptProvider for UnixInstallScriptProvider {
    fn script_command_line(&self) -> Vec<String> {
        vec![self
            .sdk_root
            .join("install.sh")
            .to_string_lossy()
            .into_owned()]
    }
}

/// Runs `<sdk_root>\install.bat` through `cmd.exe /c`.
#[derive(Debug, Clone)]
pub struct WindowsInstallScriptProvider {
    sdk_root: PathBuf,
}

impl WindowsInstallScriptProvider {
    /// Provider for the SDK extracted at `sdk_root`.
    pub fn new(sdk_root: impl Into<PathBuf>) -> Self {
        Self {
            sdk_root: sdk_root.into(),
        }
    }
}

impl InstallScriptProvider for WindowsInstallScriptProvider {
    fn script_command_line(&self) -> Vec<String> {
        vec![
            "cmd.exe".to_string(),
            "/c".to_string(),
            self.sdk_root
                .join("install.bat")
                .to_string_lossy()
                .into_owned(),
        ]
    }
}

/// Script provider for the platform this crate was compiled for.
#[cfg(windows)]
pub fn platform_script_provider(sdk_root: &Path) -> WindowsInstallScriptProvider {
    WindowsInstallScriptProvider::new(sdk_root)
}

/// Script provider for the platform this crate was compiled for.
#[cfg(not(windows))]
pub fn platform_script_provider(sdk_root: &Path) -> UnixInstallScriptProvider {
    UnixInstallScriptProvider::new(sdk_root)
}
