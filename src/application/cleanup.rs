//! Guaranteed release of per-request staging state.
//!
//! Every local path and remote asset created while serving a request is
//! registered with a [`CleanupScope`] the moment it exists. `close()` tears
//! all of them down. If the scope is dropped without being closed (the
//! request future was cancelled or a panic unwound through it), the
//! outstanding resources are handed to a detached task that performs the
//! same release.

use crate::error::{CleanupTarget, CleanupWarning};
use crate::ports::assets::AssetStore;
use crate::ports::staging::LocalStager;
use futures::future::join_all;
use std::future::Future;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;

pub struct CleanupScope<S, A>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
{
    stager: Arc<S>,
    store: Arc<A>,
    paths: Vec<PathBuf>,
    assets: Vec<String>,
}

impl<S, A> CleanupScope<S, A>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
{
    pub fn new(stager: Arc<S>, store: Arc<A>) -> Self {
        Self {
            stager,
            store,
            paths: Vec::new(),
            assets: Vec::new(),
        }
    }

    pub fn track_path(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn track_asset(&mut self, asset_id: String) {
        self.assets.push(asset_id);
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.assets.is_empty()
    }

    /// Release everything tracked so far and wait for it to finish.
    ///
    /// The release runs on its own task, so it completes even if the caller
    /// stops waiting for it.
    pub async fn close(mut self) -> Vec<CleanupWarning> {
        if self.is_empty() {
            return Vec::new();
        }
        match tokio::spawn(self.detach()).await {
            Ok(warnings) => warnings,
            Err(e) => {
                tracing::error!(error = %e, "cleanup task failed");
                Vec::new()
            }
        }
    }

    fn detach(&mut self) -> impl Future<Output = Vec<CleanupWarning>> + Send + 'static {
        let stager = self.stager.clone();
        let store = self.store.clone();
        let paths = mem::take(&mut self.paths);
        let assets = mem::take(&mut self.assets);
        async move { release_all(stager.as_ref(), store.as_ref(), assets, paths).await }
    }
}

impl<S, A> Drop for CleanupScope<S, A>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
{
    fn drop(&mut self) {
        if self.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    paths = self.paths.len(),
                    assets = self.assets.len(),
                    "request ended before cleanup, releasing in background"
                );
                handle.spawn(self.detach());
            }
            Err(_) => {
                tracing::error!(
                    paths = ?self.paths,
                    assets = ?self.assets,
                    "no runtime available, staged resources leaked"
                );
            }
        }
    }
}

/// Delete every remote asset and local file, concurrently, and wait for all
/// of them. One failure never stops the others.
pub async fn release_all<S, A>(
    stager: &S,
    store: &A,
    assets: Vec<String>,
    paths: Vec<PathBuf>,
) -> Vec<CleanupWarning>
where
    S: LocalStager + ?Sized,
    A: AssetStore + ?Sized,
{
    let remote = join_all(assets.into_iter().map(|asset_id| async move {
        match store.delete_asset(&asset_id).await {
            Ok(()) => None,
            Err(e) => Some(CleanupWarning {
                target: CleanupTarget::RemoteAsset(asset_id),
                reason: e.to_string(),
            }),
        }
    }));
    let local = join_all(paths.into_iter().map(|path| async move {
        match stager.release(&path).await {
            Ok(()) => None,
            Err(e) => Some(CleanupWarning {
                target: CleanupTarget::LocalFile(path),
                reason: e.to_string(),
            }),
        }
    }));
    let (remote, local) = futures::join!(remote, local);

    let warnings: Vec<CleanupWarning> = remote.into_iter().chain(local).flatten().collect();
    for warning in &warnings {
        tracing::warn!(%warning, "cleanup warning");
    }
    warnings
}
