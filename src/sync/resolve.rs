//! Target folder resolution.

use tracing::{debug, info};

use crate::error::Result;
use crate::store::{Batch, RemoteFolder, RemoteStore, normalize_path};

/// Whether the target folder was already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    Existing,
    /// Creation is queued in the batch and happens at commit
    Created,
}

/// The target folder every queued operation is addressed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoot {
    pub folder: RemoteFolder,
    pub state: RootState,
}

/// Look up `target` and queue its creation when the store reports it missing.
///
/// Creation is a single level below the site root; missing intermediate
/// segments are not created. Any lookup failure other than "not found"
/// propagates unchanged.
pub async fn resolve_or_create<S>(
    store: &mut S,
    batch: &mut Batch,
    target: &str,
) -> Result<ResolvedRoot>
where
    S: RemoteStore + ?Sized,
{
    let path = normalize_path(target);

    match store.load_folder(path).await {
        Ok(info) => {
            debug!(path = %info.path, items = info.item_count, "target folder exists");
            Ok(ResolvedRoot {
                folder: RemoteFolder::at(path),
                state: RootState::Existing,
            })
        }
        Err(e) if e.is_not_found() => {
            info!(path, "target folder not found, queueing creation");
            Ok(ResolvedRoot {
                folder: batch.create_root_folder(path),
                state: RootState::Created,
            })
        }
        Err(e) => Err(e),
    }
}
