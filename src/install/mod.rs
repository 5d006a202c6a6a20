//! Running the SDK's install script.
//!
//! The [`Installer`] appends the fixed install flags to the script command
//! line supplied by an [`InstallScriptProvider`], runs it through a freshly
//! created [`CommandExecutor`](crate::CommandExecutor), and turns a non-zero
//! exit code into an [`InstallError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use managed_sdk::{
//!     platform_script_provider, InstallOptions, Installer, LineForwarder, MessageListener,
//!     ProcessExecutorFactory, TracingListener,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sdk_home = std::path::PathBuf::from("/opt/managed-sdk/google-cloud-sdk");
//!     let listener: Arc<dyn MessageListener> = Arc::new(TracingListener);
//!
//!     let installer = Installer::new(
//!         sdk_home.clone(),
//!         platform_script_provider(&sdk_home),
//!         InstallOptions::default(),
//!         listener.clone(),
//!         ProcessExecutorFactory,
//!         LineForwarder::new(listener.clone()),
//!         LineForwarder::new(listener),
//!     );
//!
//!     if let Err(e) = installer.install().await {
//!         eprintln!("{}. Fix: {}", e, e.fix_suggestion());
//!     }
//! }
//! ```

mod errors;
mod installer;
mod options;
mod script;

pub use errors::InstallError;
pub use installer::Installer;
pub use options::InstallOptions;
pub use script::{
    platform_script_provider, InstallScriptProvider, UnixInstallScriptProvider,
    WindowsInstallScriptProvider,
};
