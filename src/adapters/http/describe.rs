use super::{client_filename, ApiError, AppState};
use crate::domain::media::Upload;
use crate::ports::assets::AssetStore;
use crate::ports::inference::InferencePort;
use crate::ports::staging::LocalStager;
use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::Value;

/// Collect every file part of the form, then run the describe workflow
/// over the whole batch.
pub async fn handle<S, A, I>(
    State(state): State<AppState<S, A, I>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        // Browsers send an empty filename when no file was chosen.
        let Some(raw_name) = field.file_name().filter(|name| !name.is_empty()) else {
            continue;
        };
        let Some(filename) = client_filename(raw_name) else {
            return Err(ApiError::bad_request(format!("Invalid filename `{}`", raw_name)));
        };
        let bytes = field.bytes().await?;
        uploads.push(Upload::new(filename, bytes));
    }

    let diagnosis = state.describe.describe(uploads).await?;
    if !diagnosis.cleanup_warnings.is_empty() {
        tracing::warn!(
            warnings = diagnosis.cleanup_warnings.len(),
            "describe finished with cleanup warnings"
        );
    }
    Ok(Json(diagnosis.response))
}
