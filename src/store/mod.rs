//! Remote folder store contract.
//!
//! A store sees two kinds of traffic: an immediate folder lookup, used once
//! per run to find the target folder, and a single [`Batch`] commit that
//! carries every queued folder creation and file upload. Implementations
//! execute the batch in enqueue order and report either full success or one
//! aggregated [`DeployError::Commit`](crate::DeployError::Commit).

mod batch;
mod handles;
pub mod memory;
pub mod rest;

use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{DeployError, Result};

pub use batch::{Batch, PendingOperation};
pub use handles::{HandleId, OpenHandles};
pub use memory::MemoryStore;
pub use rest::RestStore;

/// What a store does when asked to create a folder that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingFolderPolicy {
    /// Treat the create as a no-op and keep the existing folder
    #[default]
    Reuse,
    /// Fail the operation with `AlreadyExists`
    Fail,
}

impl ExistingFolderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExistingFolderPolicy::Reuse => "reuse",
            ExistingFolderPolicy::Fail => "fail",
        }
    }
}

impl FromStr for ExistingFolderPolicy {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reuse" => Ok(ExistingFolderPolicy::Reuse),
            "fail" => Ok(ExistingFolderPolicy::Fail),
            other => Err(DeployError::Validation(format!(
                "Invalid existing folder policy '{}', expected reuse or fail",
                other
            ))),
        }
    }
}

/// Handle to a folder in the remote store, addressed by its server-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFolder {
    path: String,
}

impl RemoteFolder {
    /// Handle for the server-relative `path`, taken as given.
    pub fn at(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    /// Server-relative path without a leading separator.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Server-relative path of a direct child.
    pub fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        }
    }

    /// Handle for a direct child folder.
    pub fn child(&self, name: &str) -> RemoteFolder {
        RemoteFolder {
            path: self.child_path(name),
        }
    }
}

/// Result of an immediate folder lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub path: String,
    /// Number of direct children as reported by the store
    pub item_count: u64,
}

/// Totals reported back by a successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub folders_created: usize,
    pub files_uploaded: usize,
    pub bytes_uploaded: u64,
}

/// A remote folder/file store with deferred, batched execution.
#[async_trait]
pub trait RemoteStore: Send {
    /// Get the store type identifier
    fn store_type(&self) -> &'static str;

    /// Look up a folder immediately. A missing folder is reported as a
    /// server error whose kind is `NotFound`.
    async fn load_folder(&mut self, path: &str) -> Result<FolderInfo>;

    /// Execute every operation of `batch` as one round trip. File content is
    /// read from `handles`, which stay owned by the caller.
    async fn commit(&mut self, batch: Batch, handles: &mut OpenHandles) -> Result<CommitReport>;
}

/// Turn per-operation failures of a batch into one `Commit` error.
pub(crate) fn aggregate_failures(mut failures: Vec<DeployError>, total: usize) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    let failed = failures.len();
    Err(DeployError::Commit {
        failed,
        total,
        first: Box::new(failures.swap_remove(0)),
    })
}

/// Strip one leading separator from a server-relative path. Applied once, to
/// the target folder, when it is resolved.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/SiteAssets/App"), "SiteAssets/App");
        assert_eq!(normalize_path("SiteAssets/App"), "SiteAssets/App");
        // Only the first separator is dropped
        assert_eq!(normalize_path("//double"), "/double");
    }

    #[test]
    fn test_policy_names() {
        for policy in [ExistingFolderPolicy::Reuse, ExistingFolderPolicy::Fail] {
            assert_eq!(policy.as_str().parse::<ExistingFolderPolicy>().unwrap(), policy);
        }
        let err = "Reuse".parse::<ExistingFolderPolicy>().unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn test_child_paths() {
        let root = RemoteFolder::at("SiteAssets/App");
        let sub = root.child("scripts");
        assert_eq!(sub.path(), "SiteAssets/App/scripts");
        assert_eq!(sub.child_path("main.js"), "SiteAssets/App/scripts/main.js");

        let site_root = RemoteFolder::at("");
        assert_eq!(site_root.child_path("top"), "top");
    }
}
