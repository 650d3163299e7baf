//! In-memory remote store.
//!
//! Behaves like a non-transactional batch endpoint: operations run in
//! enqueue order, a failed operation does not stop the ones after it, and
//! the commit reports every failure as one aggregated error. Every lookup
//! and commit is recorded so callers can inspect exactly what was sent.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tracing::debug;

use super::{
    Batch, CommitReport, ExistingFolderPolicy, FolderInfo, OpenHandles, PendingOperation,
    RemoteStore, aggregate_failures,
};
use crate::api::ServerErrorKind;
use crate::error::{DeployError, Result};

/// A batch as the store received it.
#[derive(Debug, Clone)]
pub struct RecordedCommit {
    pub operations: Vec<PendingOperation>,
    /// Local streams still open when the commit ran
    pub open_handles: usize,
}

/// Remote store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    folders: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    policy: ExistingFolderPolicy,
    lookup_failure: Option<(String, String)>,
    commit_failure: Option<(String, String)>,
    lookups: Vec<String>,
    commits: Vec<RecordedCommit>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing folder.
    pub fn with_folder(mut self, path: &str) -> Self {
        self.folders.insert(path.to_string());
        self
    }

    /// Seed an existing file.
    pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(path.to_string(), content.to_vec());
        self
    }

    pub fn with_policy(mut self, policy: ExistingFolderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Make every folder lookup fail with the given server error.
    pub fn fail_lookups(mut self, type_name: &str, message: &str) -> Self {
        self.lookup_failure = Some((type_name.to_string(), message.to_string()));
        self
    }

    /// Make the next commits fail as a whole, before any operation applies.
    pub fn fail_commits(mut self, type_name: &str, message: &str) -> Self {
        self.commit_failure = Some((type_name.to_string(), message.to_string()));
        self
    }

    pub fn has_folder(&self, path: &str) -> bool {
        path.is_empty() || self.folders.contains(path)
    }

    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Paths passed to `load_folder`, in call order.
    pub fn lookups(&self) -> &[String] {
        &self.lookups
    }

    /// Batches passed to `commit`, in call order.
    pub fn commits(&self) -> &[RecordedCommit] {
        &self.commits
    }

    fn child_count(&self, path: &str) -> u64 {
        let prefix = format!("{}/", path);
        let direct = |p: &&String| {
            p.strip_prefix(&prefix)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
        };
        (self.folders.iter().filter(direct).count() + self.files.keys().filter(direct).count())
            as u64
    }

    fn parent_exists(&self, path: &str) -> bool {
        match path.rfind('/') {
            Some(idx) => self.has_folder(&path[..idx]),
            None => true,
        }
    }

    fn create_folder(&mut self, path: String) -> Result<bool> {
        if !self.parent_exists(&path) {
            return Err(not_found(&path));
        }
        if self.folders.contains(&path) {
            return match self.policy {
                ExistingFolderPolicy::Reuse => Ok(false),
                ExistingFolderPolicy::Fail => Err(DeployError::server(
                    ServerErrorKind::AlreadyExists.type_name(),
                    format!("A folder named '{}' already exists", path),
                )),
            };
        }
        if self.files.contains_key(&path) {
            return Err(DeployError::server(
                ServerErrorKind::AlreadyExists.type_name(),
                format!("A file named '{}' already exists", path),
            ));
        }
        self.folders.insert(path);
        Ok(true)
    }

    fn put_file(&mut self, path: String, content: Vec<u8>, overwrite: bool) -> Result<()> {
        if !self.parent_exists(&path) {
            return Err(not_found(&path));
        }
        if self.folders.contains(&path) || (!overwrite && self.files.contains_key(&path)) {
            return Err(DeployError::server(
                ServerErrorKind::AlreadyExists.type_name(),
                format!("'{}' already exists", path),
            ));
        }
        self.files.insert(path, content);
        Ok(())
    }
}

fn not_found(path: &str) -> DeployError {
    DeployError::server(
        ServerErrorKind::NotFound.type_name(),
        format!("Parent folder of '{}' does not exist", path),
    )
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    async fn load_folder(&mut self, path: &str) -> Result<FolderInfo> {
        let path = path.to_string();
        self.lookups.push(path.clone());

        if let Some((type_name, message)) = &self.lookup_failure {
            return Err(DeployError::server(type_name.clone(), message.clone()));
        }
        if !self.has_folder(&path) {
            return Err(DeployError::server(
                ServerErrorKind::NotFound.type_name(),
                format!("Folder '{}' does not exist", path),
            ));
        }

        Ok(FolderInfo {
            item_count: self.child_count(&path),
            path,
        })
    }

    async fn commit(&mut self, batch: Batch, handles: &mut OpenHandles) -> Result<CommitReport> {
        let operations = batch.into_operations();
        self.commits.push(RecordedCommit {
            operations: operations.clone(),
            open_handles: handles.open_count(),
        });

        if let Some((type_name, message)) = &self.commit_failure {
            return Err(DeployError::server(type_name.clone(), message.clone()));
        }

        let total = operations.len();
        let mut report = CommitReport::default();
        let mut failures = Vec::new();

        for op in operations {
            let path = op.target_path();
            let outcome = match op {
                PendingOperation::CreateFolder { .. } => {
                    self.create_folder(path.clone()).map(|created| {
                        if created {
                            report.folders_created += 1;
                        }
                    })
                }
                PendingOperation::UploadFile {
                    handle, overwrite, ..
                } => match handles.read_all(handle).await {
                    Ok(content) => {
                        let len = content.len() as u64;
                        self.put_file(path.clone(), content, overwrite).map(|()| {
                            report.files_uploaded += 1;
                            report.bytes_uploaded += len;
                        })
                    }
                    Err(e) => Err(e),
                },
            };
            if let Err(e) = outcome {
                debug!(path = %path, error = %e, "operation failed");
                failures.push(e);
            }
        }

        aggregate_failures(failures, total)?;
        Ok(report)
    }
}
