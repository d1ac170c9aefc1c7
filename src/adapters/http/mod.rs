//! HTTP inbound adapter.
//!
//! Routes:
//! - `GET /`: upload form
//! - `POST /describe`: multipart batch of media, answered with the provider's diagnosis
//! - `POST /predict`: one leaf image, answered with the classifier's verdict
//! - `GET /health`: liveness and classifier availability

mod describe;
mod error;
mod form;
mod predict;

pub use error::ApiError;

use crate::application::describe::DescribeService;
use crate::domain::leaf::CLASS_LABELS;
use crate::ports::assets::AssetStore;
use crate::ports::classifier::DiseaseClassifier;
use crate::ports::inference::InferencePort;
use crate::ports::staging::LocalStager;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::path::{Component, Path};
use std::sync::Arc;

pub struct AppState<S, A, I>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    pub describe: Arc<DescribeService<S, A, I>>,
    /// Absent when no model is deployed; `/predict` then answers 500.
    pub classifier: Option<Arc<dyn DiseaseClassifier>>,
}

impl<S, A, I> Clone for AppState<S, A, I>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    fn clone(&self) -> Self {
        Self {
            describe: self.describe.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

pub fn router<S, A, I>(state: AppState<S, A, I>, max_upload_bytes: usize) -> Router
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort + 'static,
{
    Router::new()
        .route("/", get(form::index::<S, A, I>))
        .route("/describe", post(describe::handle::<S, A, I>))
        .route("/predict", post(predict::handle::<S, A, I>))
        .route("/health", get(health::<S, A, I>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn health<S, A, I>(State(state): State<AppState<S, A, I>>) -> Json<Value>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    Json(json!({
        "status": "healthy",
        "model_loaded": state.classifier.is_some(),
        "available_classes": CLASS_LABELS,
    }))
}

/// The client-supplied filename reduced to its final component. Directory
/// parts are never trusted.
fn client_filename(raw: &str) -> Option<String> {
    let name = match Path::new(raw).components().last()? {
        Component::Normal(name) => name.to_str()?,
        _ => return None,
    };
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_filename() {
        assert_eq!(client_filename("leaf.png").as_deref(), Some("leaf.png"));
    }

    #[test]
    fn test_filename_with_directories() {
        assert_eq!(client_filename("photos/field/leaf.png").as_deref(), Some("leaf.png"));
        assert_eq!(client_filename("../../etc/leaf.jpg").as_deref(), Some("leaf.jpg"));
    }

    #[test]
    fn test_filename_without_name() {
        assert_eq!(client_filename(""), None);
        assert_eq!(client_filename(".."), None);
        assert_eq!(client_filename("/"), None);
    }
}
