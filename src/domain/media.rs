use super::formats::{FormatDescriptor, MediaCategory};
use bytes::Bytes;
use std::path::PathBuf;

/// A file as it arrived in the request, before validation.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// A validated upload, tracked through local staging and remote upload.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub filename: String,
    pub format: FormatDescriptor,
    pub bytes: Bytes,
    pub staged_path: Option<PathBuf>,
    pub asset_id: Option<String>,
}

impl MediaItem {
    pub fn new(upload: Upload, format: FormatDescriptor) -> Self {
        Self {
            filename: upload.filename,
            format,
            bytes: upload.bytes,
            staged_path: None,
            asset_id: None,
        }
    }

    /// The remote reference for this item, once it has been uploaded.
    pub fn asset(&self) -> Option<AssetHandle> {
        self.asset_id.as_ref().map(|id| AssetHandle {
            asset_id: id.clone(),
            content_type: self.format.content_type.clone(),
            category: self.format.category,
        })
    }
}

/// What the inference call needs to know about one uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub asset_id: String,
    pub content_type: String,
    pub category: MediaCategory,
}
