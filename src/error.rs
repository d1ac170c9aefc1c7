//! Request-level error taxonomy for the describe workflow.

use crate::domain::formats::UnsupportedFormat;
use crate::ports::assets::AssetError;
use crate::ports::inference::InferenceError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),
    #[error("no media files in request")]
    EmptyBatch,
    #[error("failed to stage `{filename}`: {source}")]
    Io {
        filename: String,
        #[source]
        source: io::Error,
    },
    #[error("asset service refused `{filename}`: {source}")]
    AssetAuth {
        filename: String,
        #[source]
        source: AssetError,
    },
    #[error("failed to upload `{filename}`: {source}")]
    AssetUpload {
        filename: String,
        #[source]
        source: AssetError,
    },
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl DescribeError {
    pub(crate) fn staging(filename: &str, source: io::Error) -> Self {
        DescribeError::Io {
            filename: filename.to_string(),
            source,
        }
    }

    pub(crate) fn asset(filename: &str, source: AssetError) -> Self {
        let filename = filename.to_string();
        match source {
            AssetError::Auth(_) => DescribeError::AssetAuth { filename, source },
            AssetError::Io(source) => DescribeError::Io { filename, source },
            source => DescribeError::AssetUpload { filename, source },
        }
    }

    /// True when the request itself is at fault (nothing was staged).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DescribeError::UnsupportedFormat(_) | DescribeError::EmptyBatch
        )
    }

    /// True when a remote provider failed rather than this service.
    pub fn is_downstream(&self) -> bool {
        matches!(
            self,
            DescribeError::AssetAuth { .. }
                | DescribeError::AssetUpload { .. }
                | DescribeError::Inference(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupTarget {
    LocalFile(PathBuf),
    RemoteAsset(String),
}

impl fmt::Display for CleanupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupTarget::LocalFile(path) => write!(f, "local file {}", path.display()),
            CleanupTarget::RemoteAsset(id) => write!(f, "remote asset {}", id),
        }
    }
}

/// A release that failed during cleanup. Recorded, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cleanup of {target} failed: {reason}")]
pub struct CleanupWarning {
    pub target: CleanupTarget,
    pub reason: String,
}
