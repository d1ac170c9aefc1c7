//! Supported media formats.
//!
//! The registry is a plain lookup table from file extension to content type
//! and media category. The built-in table covers the formats the inference
//! provider accepts; deployments may replace it through `MEDIA_FORMATS`
//! without touching code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Broad kind of a media file, selects the tag used in the inference prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
}

impl MediaCategory {
    /// Tag name embedded in the composite prompt.
    pub fn tag(&self) -> &'static str {
        match self {
            MediaCategory::Image => "img",
            MediaCategory::Video => "video",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaCategory::Image => write!(f, "image"),
            MediaCategory::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaCategory {
    type Err = FormatTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "img" => Ok(MediaCategory::Image),
            "video" => Ok(MediaCategory::Video),
            other => Err(FormatTableError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub extension: String,
    pub content_type: String,
    pub category: MediaCategory,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatTableError {
    #[error("malformed format entry `{0}` (expected ext=content/type:category)")]
    MalformedEntry(String),
    #[error("unknown media category `{0}`")]
    UnknownCategory(String),
    #[error("format table is empty")]
    Empty,
}

/// Returned by [`FormatRegistry::classify`] when a filename has no
/// registered extension.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported media format for `{filename}`")]
pub struct UnsupportedFormat {
    pub filename: String,
}

const BUILTIN_FORMATS: &[(&str, &str, MediaCategory)] = &[
    ("png", "image/png", MediaCategory::Image),
    ("jpg", "image/jpg", MediaCategory::Image),
    ("jpeg", "image/jpeg", MediaCategory::Image),
    ("mp4", "video/mp4", MediaCategory::Video),
];

#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, FormatDescriptor>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(
            BUILTIN_FORMATS
                .iter()
                .map(|(ext, content_type, category)| FormatDescriptor {
                    extension: ext.to_string(),
                    content_type: content_type.to_string(),
                    category: *category,
                }),
        )
    }
}

impl FormatRegistry {
    pub fn new(formats: impl IntoIterator<Item = FormatDescriptor>) -> Self {
        let formats = formats
            .into_iter()
            .map(|mut f| {
                f.extension = f.extension.to_ascii_lowercase();
                (f.extension.clone(), f)
            })
            .collect();
        Self { formats }
    }

    /// Parse a table of the form `png=image/png:image,mp4=video/mp4:video`.
    pub fn parse(table: &str) -> Result<Self, FormatTableError> {
        let mut formats = Vec::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (ext, rest) = entry
                .split_once('=')
                .ok_or_else(|| FormatTableError::MalformedEntry(entry.to_string()))?;
            let (content_type, category) = rest
                .rsplit_once(':')
                .ok_or_else(|| FormatTableError::MalformedEntry(entry.to_string()))?;
            let ext = ext.trim().trim_start_matches('.');
            if ext.is_empty() || !content_type.contains('/') {
                return Err(FormatTableError::MalformedEntry(entry.to_string()));
            }
            formats.push(FormatDescriptor {
                extension: ext.to_string(),
                content_type: content_type.trim().to_string(),
                category: category.parse()?,
            });
        }
        if formats.is_empty() {
            return Err(FormatTableError::Empty);
        }
        Ok(Self::new(formats))
    }

    /// Look up the descriptor for a filename by its extension (case-insensitive).
    pub fn classify(&self, filename: &str) -> Result<&FormatDescriptor, UnsupportedFormat> {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.formats.get(&ext.to_ascii_lowercase()))
            .ok_or_else(|| UnsupportedFormat {
                filename: filename.to_string(),
            })
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }
}
