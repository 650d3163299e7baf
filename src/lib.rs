//! # sitedeploy
//!
//! Upload a local directory tree to a remote folder store.
//!
//! ## Features
//!
//! - **Single round trip**: every folder creation and file upload of a run is
//!   queued in one [`Batch`](store::Batch) and sent by a single commit.
//! - **Target resolution**: the target folder is looked up first and created
//!   when the store reports it missing.
//! - **Overwrite semantics**: every local file replaces the remote file of the
//!   same name. Remote files absent locally are left alone.
//! - **Handle safety**: every local file opened during the walk is closed
//!   exactly once, whether the commit succeeds or fails.
//! - **Stores**: [`RestStore`] talks to a site's HTTP batch endpoint,
//!   [`MemoryStore`] keeps everything in memory.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use sitedeploy::{DeployOptions, MemoryStore, deploy};
//!
//! # async fn example() -> sitedeploy::Result<()> {
//! let mut store = MemoryStore::new();
//! let report = deploy(
//!     &mut store,
//!     "/SiteAssets/App",
//!     Path::new("./dist"),
//!     DeployOptions::default(),
//! )
//! .await?;
//! println!("{} operations committed", report.operations);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod progress;
pub mod secret;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::{CliArgs, DeployConfig};
pub use error::{DeployError, Result};
pub use progress::{DeployEvent, ProgressCallback};
pub use secret::Password;
pub use store::{
    Batch, CommitReport, ExistingFolderPolicy, MemoryStore, OpenHandles, PendingOperation,
    RemoteFolder, RemoteStore, RestStore,
};
pub use sync::{
    DeployOptions, DeployReport, deploy, deploy_with_handles, resolve_or_create, synchronize,
};
