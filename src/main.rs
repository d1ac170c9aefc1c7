//! Verdure server binary.
//!
//! Wires the local staging directory, the provider clients and the optional
//! leaf classifier into the HTTP router, then serves until Ctrl-C or SIGTERM.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use verdure::adapters::local::FsStager;
use verdure::adapters::remote::{self, HttpAssetClient, HttpInferenceClient, ServingClassifier};
use verdure::ports::classifier::DiseaseClassifier;
use verdure::{router, AppConfig, AppState, DescribeService};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    // 1. Adapters
    let client = match remote::http_client(config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let stager = Arc::new(FsStager::new(&config.staging_dir));
    let assets = Arc::new(HttpAssetClient::new(
        client.clone(),
        &config.asset_base_url,
        config.api_key.clone(),
    ));
    let inference =
        HttpInferenceClient::new(client.clone(), &config.inference_url, config.api_key.clone());

    let classifier = config.classifier_url.as_ref().map(|url| {
        tracing::info!(%url, "leaf classifier enabled");
        Arc::new(ServingClassifier::new(client.clone(), url)) as Arc<dyn DiseaseClassifier>
    });
    if classifier.is_none() {
        tracing::warn!("CLASSIFIER_URL not set, /predict will report the model as not loaded");
    }

    // 2. Application service
    let describe = Arc::new(DescribeService::new(
        config.formats.clone(),
        stager,
        assets,
        inference,
        &config.diagnostic_query,
    ));

    // 3. HTTP layer
    let app = router(
        AppState {
            describe,
            classifier,
        },
        config.max_upload_bytes,
    );

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!(
        "Listening at {}:{} (staging in {})",
        config.addr,
        config.port,
        config.staging_dir.display()
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");
    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
