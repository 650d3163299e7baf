//! Recursive local tree walk.

use std::io::{Error as IoError, ErrorKind};
use std::path::Path;

use tracing::debug;

use crate::error::{DeployError, Result};
use crate::store::{Batch, OpenHandles, RemoteFolder};

/// What a walk queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Sub-folders queued for creation, the target folder excluded
    pub folders: usize,
    pub files: usize,
    /// Total size of the opened files
    pub bytes: u64,
}

/// Queue a folder creation for every sub-directory and an overwriting upload
/// for every file below `local_dir`, addressed under `remote`.
///
/// Children are visited in the order the filesystem returns them, folders
/// before their content. The first local I/O error aborts the walk.
pub fn synchronize(
    local_dir: &Path,
    remote: &RemoteFolder,
    batch: &mut Batch,
    handles: &mut OpenHandles,
) -> Result<WalkStats> {
    let mut stats = WalkStats::default();
    walk(local_dir, remote, batch, handles, &mut stats)?;
    Ok(stats)
}

fn walk(
    local_dir: &Path,
    remote: &RemoteFolder,
    batch: &mut Batch,
    handles: &mut OpenHandles,
    stats: &mut WalkStats,
) -> Result<()> {
    let entries = std::fs::read_dir(local_dir).map_err(|e| DeployError::io(local_dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| DeployError::io(local_dir, e))?;
        let path = entry.path();
        let name = entry.file_name().into_string().map_err(|_| {
            DeployError::io(
                &path,
                IoError::new(ErrorKind::InvalidData, "file name is not valid UTF-8"),
            )
        })?;
        // Follows symlinks
        let metadata = std::fs::metadata(&path).map_err(|e| DeployError::io(&path, e))?;

        if metadata.is_dir() {
            let child = batch.create_folder(remote, &name);
            debug!(remote = %child.path(), "queued folder");
            stats.folders += 1;
            walk(&path, &child, batch, handles, stats)?;
        } else {
            let handle = handles.open(&path)?;
            batch.upload_file(remote, &name, handle, true);
            debug!(remote = %remote.child_path(&name), "queued upload");
            stats.files += 1;
            stats.bytes += handles.size(handle).unwrap_or(0);
        }
    }

    Ok(())
}
