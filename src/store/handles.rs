//! Ownership list of local file streams opened during a tree walk.

use std::io::{Error as IoError, ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt as _, AsyncSeekExt as _};
use tracing::debug;

use crate::error::{DeployError, Result};

/// Index of a stream in [`OpenHandles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(usize);

impl HandleId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Slot {
    path: PathBuf,
    size: u64,
    file: Option<File>,
}

/// Every stream opened during a walk, held until the run releases them.
///
/// Streams are closed by [`OpenHandles::close_all`] or on drop, whichever
/// comes first. A slot is closed at most once.
#[derive(Debug, Default)]
pub struct OpenHandles {
    slots: Vec<Slot>,
    closed: usize,
}

impl OpenHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` for reading and take ownership of the stream.
    pub fn open(&mut self, path: &Path) -> Result<HandleId> {
        let file = std::fs::File::open(path).map_err(|e| DeployError::io(path, e))?;
        let size = file.metadata().map_err(|e| DeployError::io(path, e))?.len();

        let id = HandleId::new(self.slots.len());
        self.slots.push(Slot {
            path: path.to_path_buf(),
            size,
            file: Some(File::from_std(file)),
        });
        debug!(handle = id.index(), path = %path.display(), size, "opened local file");
        Ok(id)
    }

    /// Local path behind a handle.
    pub fn path(&self, id: HandleId) -> Option<&Path> {
        self.slots.get(id.0).map(|slot| slot.path.as_path())
    }

    /// Size of the file when it was opened.
    pub fn size(&self, id: HandleId) -> Option<u64> {
        self.slots.get(id.0).map(|slot| slot.size)
    }

    /// Read the whole content of an open stream from its start.
    pub async fn read_all(&mut self, id: HandleId) -> Result<Vec<u8>> {
        let slot = self.slots.get_mut(id.0).ok_or_else(|| {
            DeployError::io(
                format!("<handle {}>", id.0),
                IoError::new(ErrorKind::NotFound, "unknown file handle"),
            )
        })?;
        let path = slot.path.clone();
        let file = slot.file.as_mut().ok_or_else(|| {
            DeployError::io(
                &path,
                IoError::new(ErrorKind::Other, "file handle already released"),
            )
        })?;

        file.seek(SeekFrom::Start(0))
            .await
            .map_err(|e| DeployError::io(&path, e))?;
        let mut buf = Vec::with_capacity(slot.size as usize);
        file.read_to_end(&mut buf)
            .await
            .map_err(|e| DeployError::io(&path, e))?;
        Ok(buf)
    }

    /// Streams opened so far.
    pub fn opened(&self) -> usize {
        self.slots.len()
    }

    /// Streams released so far.
    pub fn closed(&self) -> usize {
        self.closed
    }

    /// Streams still open.
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.file.is_some()).count()
    }

    /// Close every stream still open and return how many were closed.
    pub fn close_all(&mut self) -> usize {
        let mut released = 0;
        for slot in &mut self.slots {
            if let Some(file) = slot.file.take() {
                drop(file);
                released += 1;
            }
        }
        self.closed += released;
        released
    }
}

impl Drop for OpenHandles {
    fn drop(&mut self) {
        self.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_read_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let mut handles = OpenHandles::new();
        let id = handles.open(&path).unwrap();
        assert_eq!(handles.size(id), Some(11));
        assert_eq!(handles.path(id), Some(path.as_path()));

        // Reads always start from the beginning
        assert_eq!(handles.read_all(id).await.unwrap(), b"hello world");
        assert_eq!(handles.read_all(id).await.unwrap(), b"hello world");

        assert_eq!(handles.open_count(), 1);
        assert_eq!(handles.close_all(), 1);
        assert_eq!(handles.open_count(), 0);
        assert_eq!(handles.closed(), 1);
    }

    #[tokio::test]
    async fn test_close_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut handles = OpenHandles::new();
        for name in ["a", "b", "c"] {
            let path = dir.path().join(name);
            std::fs::write(&path, name).unwrap();
            handles.open(&path).unwrap();
        }

        assert_eq!(handles.close_all(), 3);
        assert_eq!(handles.close_all(), 0);
        assert_eq!(handles.opened(), 3);
        assert_eq!(handles.closed(), 3);
    }

    #[tokio::test]
    async fn test_read_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        std::fs::write(&path, b"x").unwrap();

        let mut handles = OpenHandles::new();
        let id = handles.open(&path).unwrap();
        handles.close_all();

        let err = handles.read_all(id).await.unwrap_err();
        assert_eq!(err.kind(), "IoError");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut handles = OpenHandles::new();
        let err = handles.open(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, DeployError::Io { .. }));
        assert_eq!(handles.opened(), 0);
    }
}
