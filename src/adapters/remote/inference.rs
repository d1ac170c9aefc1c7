use crate::config::Secret;
use crate::domain::media::AssetHandle;
use crate::domain::prompt;
use crate::ports::inference::{InferenceError, InferencePort};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const ASSET_REFERENCES_HEADER: &str = "NVCF-INPUT-ASSET-REFERENCES";
const FUNCTION_ASSET_IDS_HEADER: &str = "NVCF-FUNCTION-ASSET-IDS";

/// Fixed sampling parameters. The seed is pinned so identical inputs
/// produce identical diagnoses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.2,
            top_p: 0.7,
            seed: 50,
        }
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    messages: [Message<'a>; 1],
    #[serde(flatten)]
    sampling: Sampling,
    stream: bool,
}

#[derive(Clone)]
pub struct HttpInferenceClient {
    client: Client,
    url: String,
    api_key: Secret,
    sampling: Sampling,
}

impl HttpInferenceClient {
    pub fn new(client: Client, url: impl Into<String>, api_key: Secret) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            sampling: Sampling::default(),
        }
    }
}

#[async_trait]
impl InferencePort for HttpInferenceClient {
    async fn invoke(&self, assets: &[AssetHandle], query: &str) -> Result<Value, InferenceError> {
        let content = prompt::compose(assets, query);
        let ids = prompt::joined_ids(assets);
        let request = InferenceRequest {
            messages: [Message {
                role: "user",
                content: &content,
            }],
            sampling: self.sampling,
            stream: false,
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose())
            .header(ACCEPT, "application/json")
            .header(ASSET_REFERENCES_HEADER, &ids)
            .header(FUNCTION_ASSET_IDS_HEADER, &ids)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| InferenceError::Decode(e.to_string()))
    }
}
