use super::{ApiError, AppState};
use crate::domain::leaf::{LeafTensor, Prediction};
use crate::ports::assets::AssetStore;
use crate::ports::inference::InferencePort;
use crate::ports::staging::LocalStager;
use axum::extract::{Multipart, State};
use axum::Json;

pub async fn handle<S, A, I>(
    State(state): State<AppState<S, A, I>>,
    mut multipart: Multipart,
) -> Result<Json<Prediction>, ApiError>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    let field = loop {
        match multipart.next_field().await? {
            Some(field) if field.file_name().is_some() => break field,
            Some(_) => continue,
            None => return Err(ApiError::bad_request("No file uploaded")),
        }
    };

    let is_image = field
        .content_type()
        .map(|ct| ct.starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(ApiError::bad_request("File must be an image"));
    }
    let bytes = field.bytes().await?;

    let tensor = tokio::task::spawn_blocking(move || LeafTensor::from_image_bytes(&bytes))
        .await
        .map_err(|e| ApiError::internal(format!("Prediction failed: {}", e)))?
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let Some(classifier) = state.classifier.as_ref() else {
        return Err(ApiError::internal("Model not loaded"));
    };

    let probabilities = classifier
        .predict(&tensor)
        .await
        .map_err(|e| ApiError::internal(format!("Prediction failed: {}", e)))?;
    let prediction = Prediction::from_probabilities(&probabilities)
        .map_err(|e| ApiError::internal(format!("Prediction failed: {}", e)))?;

    tracing::info!(
        prediction = %prediction.prediction,
        confidence = prediction.confidence,
        "leaf classified"
    );
    Ok(Json(prediction))
}
