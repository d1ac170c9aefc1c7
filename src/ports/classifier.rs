use crate::domain::leaf::{LeafTensor, PredictionError};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model server returned status {0}")]
    Status(u16),
    #[error("model server unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected model output: {0}")]
    Output(String),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

#[async_trait]
pub trait DiseaseClassifier: Send + Sync {
    /// Class probabilities for one preprocessed leaf image
    async fn predict(&self, tensor: &LeafTensor) -> Result<Vec<f32>, ClassifierError>;
}
