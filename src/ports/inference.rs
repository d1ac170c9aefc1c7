use crate::domain::media::AssetHandle;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("inference response is not valid JSON: {0}")]
    Decode(String),
    #[error("inference service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferencePort: Send + Sync {
    /// Run one synchronous inference over the given assets. The provider's
    /// response is returned as-is.
    async fn invoke(&self, assets: &[AssetHandle], query: &str) -> Result<Value, InferenceError>;
}
