//! Deferred operation batch.

use std::fmt;

use super::{HandleId, RemoteFolder};

/// An uncommitted unit of work against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    /// Create `name` under `parent`, or at the site root when `parent` is `None`.
    CreateFolder {
        parent: Option<RemoteFolder>,
        name: String,
    },
    /// Upload the content behind `handle` as `name` under `parent`.
    UploadFile {
        parent: RemoteFolder,
        name: String,
        handle: HandleId,
        overwrite: bool,
    },
}

impl PendingOperation {
    /// Server-relative path the operation creates or writes.
    pub fn target_path(&self) -> String {
        match self {
            PendingOperation::CreateFolder {
                parent: Some(parent),
                name,
            } => parent.child_path(name),
            PendingOperation::CreateFolder { parent: None, name } => name.clone(),
            PendingOperation::UploadFile { parent, name, .. } => parent.child_path(name),
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, PendingOperation::UploadFile { .. })
    }
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOperation::CreateFolder { .. } => {
                write!(f, "create folder {}", self.target_path())
            }
            PendingOperation::UploadFile { overwrite, .. } => {
                let mode = if *overwrite { "overwrite" } else { "keep" };
                write!(f, "upload file {} ({})", self.target_path(), mode)
            }
        }
    }
}

/// Ordered set of pending operations, submitted together by one commit.
#[derive(Debug, Default)]
pub struct Batch {
    operations: Vec<PendingOperation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue creation of a folder directly below the site root.
    pub fn create_root_folder(&mut self, path: &str) -> RemoteFolder {
        let folder = RemoteFolder::at(path);
        self.operations.push(PendingOperation::CreateFolder {
            parent: None,
            name: folder.path().to_string(),
        });
        folder
    }

    /// Queue creation of a child folder and return its handle.
    pub fn create_folder(&mut self, parent: &RemoteFolder, name: &str) -> RemoteFolder {
        self.operations.push(PendingOperation::CreateFolder {
            parent: Some(parent.clone()),
            name: name.to_string(),
        });
        parent.child(name)
    }

    /// Queue an upload of an opened local file.
    pub fn upload_file(
        &mut self,
        parent: &RemoteFolder,
        name: &str,
        handle: HandleId,
        overwrite: bool,
    ) {
        self.operations.push(PendingOperation::UploadFile {
            parent: parent.clone(),
            name: name.to_string(),
            handle,
            overwrite,
        });
    }

    pub fn operations(&self) -> &[PendingOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of queued folder creations.
    pub fn folder_creations(&self) -> usize {
        self.operations.iter().filter(|op| !op.is_upload()).count()
    }

    /// Number of queued uploads.
    pub fn uploads(&self) -> usize {
        self.operations.iter().filter(|op| op.is_upload()).count()
    }

    pub fn into_operations(self) -> Vec<PendingOperation> {
        self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_keep_enqueue_order() {
        let mut batch = Batch::new();
        let root = batch.create_root_folder("/SiteAssets");
        let sub = batch.create_folder(&root, "css");
        batch.upload_file(&sub, "site.css", HandleId::new(0), true);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.folder_creations(), 2);
        assert_eq!(batch.uploads(), 1);

        let paths: Vec<String> = batch.operations().iter().map(|op| op.target_path()).collect();
        assert_eq!(paths, vec!["SiteAssets", "SiteAssets/css", "SiteAssets/css/site.css"]);
    }

    #[test]
    fn test_display() {
        let mut batch = Batch::new();
        let root = RemoteFolder::at("Docs");
        batch.create_folder(&root, "img");
        batch.upload_file(&root, "a.txt", HandleId::new(3), true);
        batch.upload_file(&root, "b.txt", HandleId::new(4), false);

        let lines: Vec<String> = batch.operations().iter().map(|op| op.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "create folder Docs/img",
                "upload file Docs/a.txt (overwrite)",
                "upload file Docs/b.txt (keep)",
            ]
        );
    }

    #[test]
    fn test_empty_batch() {
        let batch = Batch::new();
        assert!(batch.is_empty());
        assert!(batch.into_operations().is_empty());
    }
}
