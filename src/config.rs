//! Configuration loaded from the environment at startup.

use crate::domain::formats::{FormatRegistry, FormatTableError};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ASSET_BASE_URL: &str = "https://api.nvcf.nvidia.com/v2/nvcf/assets";
pub const DEFAULT_INFERENCE_URL: &str = "https://ai.api.nvidia.com/v1/vlm/nvidia/vila";
pub const DEFAULT_DIAGNOSTIC_QUERY: &str = "Examine the maize plants in the attached media. \
Identify any visible disease or pest damage, describe the symptoms you see, \
and suggest how the farmer should respond.";

/// An externally supplied credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Arc<str>);

impl Secret {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} env var required")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got `{value}`")]
    InvalidNumber { name: &'static str, value: String },
    #[error("MEDIA_FORMATS: {0}")]
    Formats(#[from] FormatTableError),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory for transient copies of uploaded media
    pub staging_dir: PathBuf,
    /// Asset service endpoint
    pub asset_base_url: String,
    /// Vision-language inference endpoint
    pub inference_url: String,
    /// Bearer credential for both provider services
    pub api_key: Secret,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Query appended to the asset references in every diagnosis prompt
    pub diagnostic_query: String,
    pub formats: FormatRegistry,
    /// Model-serving endpoint for the leaf classifier, if one is deployed
    pub classifier_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("INFERENCE_API_KEY")
            .map(Secret::new)
            .ok_or(ConfigError::Missing("INFERENCE_API_KEY"))?;

        let formats = match var("MEDIA_FORMATS") {
            Some(table) => FormatRegistry::parse(&table)?,
            None => FormatRegistry::default(),
        };

        Ok(Self {
            addr: var("ADDR").unwrap_or_else(|| String::from("127.0.0.1")),
            port: var("PORT").unwrap_or_else(|| String::from("3000")),
            staging_dir: var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("verdure-staging")),
            asset_base_url: var("ASSET_BASE_URL")
                .unwrap_or_else(|| String::from(DEFAULT_ASSET_BASE_URL)),
            inference_url: var("INFERENCE_URL")
                .unwrap_or_else(|| String::from(DEFAULT_INFERENCE_URL)),
            api_key,
            request_timeout: Duration::from_secs(parse_positive(
                "REQUEST_TIMEOUT_SECS",
                var("REQUEST_TIMEOUT_SECS"),
                60,
            )? as u64),
            max_upload_bytes: parse_positive(
                "MAX_UPLOAD_BYTES",
                var("MAX_UPLOAD_BYTES"),
                100 * 1024 * 1024,
            )?,
            diagnostic_query: var("DIAGNOSTIC_QUERY")
                .unwrap_or_else(|| String::from(DEFAULT_DIAGNOSTIC_QUERY)),
            formats,
            classifier_url: var("CLASSIFIER_URL"),
        })
    }
}

fn parse_positive(
    name: &'static str,
    value: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { name, value: raw }),
        },
    }
}
