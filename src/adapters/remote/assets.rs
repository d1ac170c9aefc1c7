use crate::config::Secret;
use crate::ports::assets::{AssetError, AssetStore};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;

/// Metadata header the upload target expects alongside the bytes.
const DESCRIPTION_HEADER: &str = "x-amz-meta-nvcf-asset-description";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    content_type: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadTarget {
    upload_url: String,
    asset_id: String,
}

/// Client for the provider's asset service.
#[derive(Clone)]
pub struct HttpAssetClient {
    client: Client,
    base_url: String,
    api_key: Secret,
}

impl HttpAssetClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Secret) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn request_upload_target(
        &self,
        content_type: &str,
        description: &str,
    ) -> Result<UploadTarget, AssetError> {
        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(self.api_key.expose())
            .header(ACCEPT, "application/json")
            .json(&UploadRequest {
                content_type,
                description,
            })
            .send()
            .await
            .map_err(|e| AssetError::Auth(format!("upload request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Auth(format!("status {}", status.as_u16())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AssetError::Auth(format!("failed to read upload target: {}", e)))?;
        serde_json::from_str(&body)
            .map_err(|e| AssetError::Auth(format!("unexpected upload target response: {}", e)))
    }

    async fn transfer(
        &self,
        target: &UploadTarget,
        path: &Path,
        content_type: &str,
        description: &str,
    ) -> Result<(), AssetError> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        let resp = self
            .client
            .put(&target.upload_url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, len)
            .header(DESCRIPTION_HEADER, description)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Upload {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Phase (b) plus its rollback. Once phase (a) has allocated an asset id,
    /// exactly one of two things happens: the id reaches the waiting caller,
    /// or the asset is deleted here.
    async fn complete(
        self,
        target: UploadTarget,
        path: PathBuf,
        content_type: String,
        description: String,
        reply: oneshot::Sender<Result<String, AssetError>>,
    ) {
        let result = match self
            .transfer(&target, &path, &content_type, &description)
            .await
        {
            Ok(()) => Ok(target.asset_id),
            Err(e) => {
                self.discard(&target.asset_id).await;
                Err(e)
            }
        };
        if let Err(Ok(asset_id)) = reply.send(result) {
            tracing::warn!(%asset_id, "upload abandoned by caller, deleting asset");
            self.discard(&asset_id).await;
        }
    }

    async fn discard(&self, asset_id: &str) {
        if let Err(e) = self.delete_asset(asset_id).await {
            tracing::warn!(%asset_id, error = %e, "failed to delete unfinished asset");
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetClient {
    async fn create_asset(
        &self,
        path: &Path,
        content_type: &str,
        description: &str,
    ) -> Result<String, AssetError> {
        let target = self.request_upload_target(content_type, description).await?;

        // The transfer runs detached so a cancelled request cannot strand
        // the asset allocated above.
        let (reply, outcome) = oneshot::channel();
        tokio::spawn(self.clone().complete(
            target,
            path.to_path_buf(),
            content_type.to_string(),
            description.to_string(),
            reply,
        ));
        let asset_id = outcome
            .await
            .map_err(|_| AssetError::Interrupted("upload task ended without a result".into()))??;
        tracing::debug!(%asset_id, "asset uploaded");
        Ok(asset_id)
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), AssetError> {
        let resp = self
            .client
            .delete(format!("{}/{}", self.base_url, asset_id))
            .bearer_auth(self.api_key.expose())
            .send()
            .await
            .map_err(|e| AssetError::Delete {
                asset_id: asset_id.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Delete {
                asset_id: asset_id.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }
        Ok(())
    }
}
