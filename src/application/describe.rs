//! The describe workflow: validate a batch of uploads, stage them locally
//! and remotely, run one inference over all of them, then release every
//! staged resource no matter how the request ends.

use super::cleanup::CleanupScope;
use crate::domain::formats::FormatRegistry;
use crate::domain::media::{AssetHandle, MediaItem, Upload};
use crate::error::{CleanupWarning, DescribeError};
use crate::ports::assets::AssetStore;
use crate::ports::inference::InferencePort;
use crate::ports::staging::LocalStager;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Staging,
    Uploading,
    Invoking,
    CleaningUp,
    Done,
}

/// Successful outcome: the provider response, untouched, plus anything that
/// could not be cleaned up.
#[derive(Debug)]
pub struct Diagnosis {
    pub response: Value,
    pub cleanup_warnings: Vec<CleanupWarning>,
}

pub struct DescribeService<S, A, I>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    formats: FormatRegistry,
    stager: Arc<S>,
    assets: Arc<A>,
    inference: I,
    query: String,
}

impl<S, A, I> DescribeService<S, A, I>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    pub fn new(
        formats: FormatRegistry,
        stager: Arc<S>,
        assets: Arc<A>,
        inference: I,
        query: impl Into<String>,
    ) -> Self {
        Self {
            formats,
            stager,
            assets,
            inference,
            query: query.into(),
        }
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub async fn describe(&self, uploads: Vec<Upload>) -> Result<Diagnosis, DescribeError> {
        let span = tracing::info_span!(
            "describe",
            request_id = %Uuid::new_v4(),
            files = uploads.len()
        );
        self.run(uploads).instrument(span).await
    }

    async fn run(&self, uploads: Vec<Upload>) -> Result<Diagnosis, DescribeError> {
        enter(Phase::Validating);
        let mut items = match self.validate(uploads) {
            Ok(items) => items,
            Err(e) => {
                enter(Phase::Done);
                tracing::info!(error = %e, "rejected batch");
                return Err(e);
            }
        };

        let mut scope = CleanupScope::new(self.stager.clone(), self.assets.clone());
        let outcome = self.stage_and_invoke(&mut items, &mut scope).await;

        enter(Phase::CleaningUp);
        let cleanup_warnings = scope.close().await;
        for item in &mut items {
            item.staged_path = None;
            item.asset_id = None;
        }

        enter(Phase::Done);
        match outcome {
            Ok(response) => {
                tracing::info!(warnings = cleanup_warnings.len(), "diagnosis complete");
                Ok(Diagnosis {
                    response,
                    cleanup_warnings,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "diagnosis failed");
                Err(e)
            }
        }
    }

    /// Classify every upload before anything is created, so a bad file
    /// never leaves state behind.
    fn validate(&self, uploads: Vec<Upload>) -> Result<Vec<MediaItem>, DescribeError> {
        if uploads.is_empty() {
            return Err(DescribeError::EmptyBatch);
        }
        uploads
            .into_iter()
            .map(|upload| {
                let format = self.formats.classify(&upload.filename)?.clone();
                Ok(MediaItem::new(upload, format))
            })
            .collect()
    }

    async fn stage_and_invoke(
        &self,
        items: &mut [MediaItem],
        scope: &mut CleanupScope<S, A>,
    ) -> Result<Value, DescribeError> {
        enter(Phase::Staging);
        for item in items.iter_mut() {
            let path = self
                .stager
                .stage(&item.bytes, &item.format.extension)
                .await
                .map_err(|e| DescribeError::staging(&item.filename, e))?;
            scope.track_path(path.clone());
            item.staged_path = Some(path);
        }

        enter(Phase::Uploading);
        for item in items.iter_mut() {
            let Some(path) = item.staged_path.as_deref() else {
                continue;
            };
            let asset_id = self
                .assets
                .create_asset(path, &item.format.content_type, &item.filename)
                .await
                .map_err(|e| DescribeError::asset(&item.filename, e))?;
            scope.track_asset(asset_id.clone());
            item.asset_id = Some(asset_id);
        }

        enter(Phase::Invoking);
        let handles: Vec<AssetHandle> = items.iter().filter_map(MediaItem::asset).collect();
        Ok(self.inference.invoke(&handles, &self.query).await?)
    }
}

fn enter(phase: Phase) {
    tracing::debug!(?phase, "entering phase");
}
