//! Remote adapters: the third-party asset, inference and model-serving APIs.

pub mod assets;
pub mod classifier;
pub mod inference;

pub use assets::HttpAssetClient;
pub use classifier::ServingClassifier;
pub use inference::HttpInferenceClient;

use std::time::Duration;

/// Build the HTTP client shared by every remote adapter.
///
/// The timeout bounds each remote call; a stalled provider fails the request
/// instead of holding it forever.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}
