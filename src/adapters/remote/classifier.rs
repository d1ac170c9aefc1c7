use crate::domain::leaf::LeafTensor;
use crate::ports::classifier::{ClassifierError, DiseaseClassifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Vec<&'a [[f32; 3]]>; 1],
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// Leaf classifier hosted behind a model-serving REST endpoint.
#[derive(Clone)]
pub struct ServingClassifier {
    client: Client,
    url: String,
}

impl ServingClassifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DiseaseClassifier for ServingClassifier {
    async fn predict(&self, tensor: &LeafTensor) -> Result<Vec<f32>, ClassifierError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&PredictRequest {
                instances: [tensor.rows()],
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body: PredictResponse = resp
            .json()
            .await
            .map_err(|e| ClassifierError::Output(e.to_string()))?;
        body.predictions
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::Output("no predictions returned".to_string()))
    }
}
