use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// The asset service refused the upload request or answered with
    /// something other than an upload target.
    #[error("asset service rejected upload request: {0}")]
    Auth(String),
    #[error("asset transfer failed with status {status}")]
    Upload { status: u16 },
    #[error("failed to delete asset {asset_id}: {reason}")]
    Delete { asset_id: String, reason: String },
    #[error("asset transfer interrupted: {0}")]
    Interrupted(String),
    #[error("asset service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to read staged file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Two-phase upload of a staged file; returns the remote asset id
    async fn create_asset(
        &self,
        path: &Path,
        content_type: &str,
        description: &str,
    ) -> Result<String, AssetError>;

    /// Delete a remote asset
    async fn delete_asset(&self, asset_id: &str) -> Result<(), AssetError>;
}
