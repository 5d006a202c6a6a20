//! # managed-sdk
//!
//! Extraction and install-script orchestration for a locally managed SDK
//! distribution.
//!
//! The crate takes an already-downloaded SDK archive, unpacks it with exact
//! POSIX permissions, and then runs the SDK's own install script as a child
//! process while streaming its output to a [`MessageListener`].
//!
//! ## Features
//!
//! - [`extract_archive`] / [`Extractor`] for `.tar.gz`, `.tar` and `.zip` archives
//! - [`Installer`] for running the install script with the fixed install flags
//! - [`ProcessExecutor`] and the [`AsyncStreamHandler`] implementations that
//!   drain a child's stdout and stderr concurrently
//! - [`SdkInstaller`] chaining extraction and installation
//!
//! ## Example
//!
//! ```rust,no_run
//! use managed_sdk::{SdkInstallOptions, SdkInstaller, TracingListener};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let installer = SdkInstaller::new(
//!         "/opt/managed-sdk",
//!         SdkInstallOptions::default(),
//!         Arc::new(TracingListener),
//!     );
//!
//!     match installer.install(Path::new("/tmp/sdk.tar.gz")).await {
//!         Ok(home) => println!("SDK ready at {}", home.display()),
//!         Err(e) => eprintln!("Install failed: {}", e),
//!     }
//! }
//! ```

mod extract;
mod install;
mod listener;
mod process;
mod sdk;

pub use extract::{
    extract_archive, ArchiveFormat, EntryKind, ExtractError, ExtractedEntry, ExtractionReport,
    Extractor,
};
pub use install::{
    platform_script_provider, InstallError, InstallOptions, InstallScriptProvider, Installer,
    UnixInstallScriptProvider, WindowsInstallScriptProvider,
};
pub use listener::{MessageListener, NullListener, TracingListener};
pub use process::{
    AsyncStreamHandler, CommandExecutionError, CommandExecutor, CommandExecutorFactory,
    LineForwarder, OutputCollector, ProcessExecutor, ProcessExecutorFactory, StreamError,
    StreamHandle,
};
pub use sdk::{SdkInstallError, SdkInstallOptions, SdkInstaller, DEFAULT_SDK_DIRECTORY_NAME};
