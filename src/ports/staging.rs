use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalStager: Send + Sync {
    /// Persist bytes under a fresh, collision-resistant name and return its path
    async fn stage(&self, bytes: &[u8], extension: &str) -> io::Result<PathBuf>;

    /// Remove a staged file. Removing a path that is already gone is not an error.
    async fn release(&self, path: &Path) -> io::Result<()>;
}
