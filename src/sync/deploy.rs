//! One deploy run: resolve, walk, commit, release.

use std::path::Path;

use tracing::{info, warn};

use super::resolve::{RootState, resolve_or_create};
use super::tree::{WalkStats, synchronize};
use crate::error::Result;
use crate::progress::{DeployEvent, ProgressCallback};
use crate::store::{Batch, CommitReport, OpenHandles, RemoteFolder, RemoteStore};

/// Run options.
#[derive(Default)]
pub struct DeployOptions {
    /// Walk and report the batch without committing it
    pub dry_run: bool,
    pub progress: Option<ProgressCallback>,
}

impl DeployOptions {
    fn emit(&mut self, event: DeployEvent<'_>) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&event);
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub root: RemoteFolder,
    pub root_created: bool,
    pub walk: WalkStats,
    /// Operations in the committed (or planned) batch
    pub operations: usize,
    /// `None` on a dry run
    pub commit: Option<CommitReport>,
    pub handles_released: usize,
}

/// Upload everything below `source` into the remote folder `target`.
pub async fn deploy<S>(
    store: &mut S,
    target: &str,
    source: &Path,
    options: DeployOptions,
) -> Result<DeployReport>
where
    S: RemoteStore + ?Sized,
{
    let mut handles = OpenHandles::new();
    deploy_with_handles(store, target, source, options, &mut handles).await
}

/// Like [`deploy`], with the caller owning the stream registry. Every stream
/// opened by the run is closed before this returns, on success and on error.
pub async fn deploy_with_handles<S>(
    store: &mut S,
    target: &str,
    source: &Path,
    mut options: DeployOptions,
    handles: &mut OpenHandles,
) -> Result<DeployReport>
where
    S: RemoteStore + ?Sized,
{
    let outcome = run(store, target, source, &mut options, handles).await;
    let released = handles.close_all();

    match outcome {
        Ok(mut report) => {
            report.handles_released = released;
            Ok(report)
        }
        Err(e) => {
            if released > 0 {
                warn!(released, error = %e, "run failed, released local files");
            }
            Err(e)
        }
    }
}

async fn run<S>(
    store: &mut S,
    target: &str,
    source: &Path,
    options: &mut DeployOptions,
    handles: &mut OpenHandles,
) -> Result<DeployReport>
where
    S: RemoteStore + ?Sized,
{
    let mut batch = Batch::new();

    let root = resolve_or_create(store, &mut batch, target).await?;
    let root_created = root.state == RootState::Created;
    if root_created {
        options.emit(DeployEvent::RootMissing {
            path: root.folder.path(),
        });
    } else {
        options.emit(DeployEvent::RootFound {
            path: root.folder.path(),
        });
    }

    let walk = synchronize(source, &root.folder, &mut batch, handles)?;
    options.emit(DeployEvent::Walked {
        folders: walk.folders,
        files: walk.files,
        bytes: walk.bytes,
    });

    let operations = batch.len();
    let commit = if options.dry_run {
        options.emit(DeployEvent::Planned(&batch));
        None
    } else {
        options.emit(DeployEvent::Committing { operations });
        info!(store = store.store_type(), operations, "committing batch");
        let report = store.commit(batch, handles).await?;
        info!(
            folders = report.folders_created,
            files = report.files_uploaded,
            bytes = report.bytes_uploaded,
            "batch committed"
        );
        options.emit(DeployEvent::Committed(&report));
        Some(report)
    };

    Ok(DeployReport {
        root: root.folder,
        root_created,
        walk,
        operations,
        commit,
        handles_released: 0,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::DeployError;
    use crate::store::{MemoryStore, PendingOperation};

    /// root/{a.txt, sub/b.txt}
    fn scenario_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), b"bravo!").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_missing_root_full_run() {
        let dir = scenario_tree();
        let mut store = MemoryStore::new();

        let report = deploy(&mut store, "root", dir.path(), DeployOptions::default())
            .await
            .unwrap();

        assert!(report.root_created);
        assert_eq!(report.operations, 4);
        assert_eq!(report.handles_released, 2);
        assert_eq!(
            report.commit,
            Some(CommitReport {
                folders_created: 2,
                files_uploaded: 2,
                bytes_uploaded: 11,
            })
        );

        // One lookup, one commit carrying everything
        assert_eq!(store.lookups().len(), 1);
        assert_eq!(store.commits().len(), 1);
        let ops = &store.commits()[0].operations;
        assert_eq!(
            ops[0],
            PendingOperation::CreateFolder {
                parent: None,
                name: "root".to_string(),
            }
        );
        let creates = ops.iter().filter(|op| !op.is_upload()).count();
        let uploads = ops.iter().filter(|op| op.is_upload()).count();
        assert_eq!((creates, uploads), (2, 2));

        assert!(store.has_folder("root/sub"));
        assert_eq!(store.file("root/a.txt"), Some(&b"alpha"[..]));
        assert_eq!(store.file("root/sub/b.txt"), Some(&b"bravo!"[..]));
    }

    #[tokio::test]
    async fn test_existing_root_overwrites_files() {
        let dir = scenario_tree();
        let mut store = MemoryStore::new()
            .with_folder("root")
            .with_file("root/a.txt", b"stale")
            .with_file("root/keep.txt", b"untouched");

        let report = deploy(&mut store, "/root", dir.path(), DeployOptions::default())
            .await
            .unwrap();

        assert!(!report.root_created);
        assert_eq!(report.operations, 3);
        assert_eq!(store.file("root/a.txt"), Some(&b"alpha"[..]));
        // Remote files absent locally are left alone
        assert_eq!(store.file("root/keep.txt"), Some(&b"untouched"[..]));
    }

    #[tokio::test]
    async fn test_lookup_failure_queues_nothing() {
        let dir = scenario_tree();
        let mut store =
            MemoryStore::new().fail_lookups("System.UnauthorizedAccessException", "Access denied.");
        let mut handles = OpenHandles::new();

        let err = deploy_with_handles(
            &mut store,
            "root",
            dir.path(),
            DeployOptions::default(),
            &mut handles,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "ServerError");
        assert!(store.commits().is_empty());
        assert!(!store.has_folder("root"));
        assert_eq!(handles.opened(), 0);
    }

    #[tokio::test]
    async fn test_handles_released_when_commit_fails() {
        let dir = scenario_tree();
        let mut store = MemoryStore::new().fail_commits("System.Net.WebException", "connection reset");
        let mut handles = OpenHandles::new();

        let err = deploy_with_handles(
            &mut store,
            "root",
            dir.path(),
            DeployOptions::default(),
            &mut handles,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "ServerError");
        // Streams were open while the batch was sent, closed exactly once after
        assert_eq!(store.commits()[0].open_handles, 2);
        assert_eq!(handles.opened(), 2);
        assert_eq!(handles.closed(), 2);
        assert_eq!(handles.open_count(), 0);
    }

    #[tokio::test]
    async fn test_handles_released_when_some_operations_fail() {
        let dir = scenario_tree();
        let mut store = MemoryStore::new()
            .with_folder("root")
            .with_folder("root/sub")
            .with_policy(crate::store::ExistingFolderPolicy::Fail);
        let mut handles = OpenHandles::new();

        let err = deploy_with_handles(
            &mut store,
            "root",
            dir.path(),
            DeployOptions::default(),
            &mut handles,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::Commit { failed: 1, total: 3, .. }));
        // Uploads after the failed create still went through
        assert_eq!(store.file("root/sub/b.txt"), Some(&b"bravo!"[..]));
        assert_eq!(handles.closed(), 2);
        assert_eq!(handles.open_count(), 0);
    }

    #[tokio::test]
    async fn test_handles_released_when_walk_fails() {
        let dir = scenario_tree();
        let mut store = MemoryStore::new();
        let mut handles = OpenHandles::new();

        let err = deploy_with_handles(
            &mut store,
            "root",
            &dir.path().join("missing"),
            DeployOptions::default(),
            &mut handles,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "IoError");
        assert!(store.commits().is_empty());
        assert_eq!(handles.open_count(), 0);
    }

    #[tokio::test]
    async fn test_rerun_with_reuse_policy_is_idempotent() {
        let dir = scenario_tree();
        let mut store = MemoryStore::new();

        deploy(&mut store, "root", dir.path(), DeployOptions::default())
            .await
            .unwrap();
        let second = deploy(&mut store, "root", dir.path(), DeployOptions::default())
            .await
            .unwrap();

        assert!(!second.root_created);
        assert_eq!(second.commit.unwrap().folders_created, 0);
        assert_eq!(second.commit.unwrap().files_uploaded, 2);
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let dir = scenario_tree();
        let mut store = MemoryStore::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let options = DeployOptions {
            dry_run: true,
            progress: Some(Box::new(move |event: &DeployEvent<'_>| {
                let label = match event {
                    DeployEvent::RootFound { .. } => "found".to_string(),
                    DeployEvent::RootMissing { .. } => "missing".to_string(),
                    DeployEvent::Walked { files, .. } => format!("walked {}", files),
                    DeployEvent::Committing { .. } => "committing".to_string(),
                    DeployEvent::Committed(_) => "committed".to_string(),
                    DeployEvent::Planned(batch) => format!("planned {}", batch.len()),
                };
                sink.lock().unwrap().push(label);
            })),
        };

        let report = deploy(&mut store, "root", dir.path(), options).await.unwrap();

        assert!(report.commit.is_none());
        assert_eq!(report.handles_released, 2);
        assert!(store.commits().is_empty());
        assert_eq!(
            *events.lock().unwrap(),
            vec!["missing", "walked 2", "planned 4"]
        );
    }
}
