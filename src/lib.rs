//! Verdure - Crop diagnosis from user-submitted media
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (formats, media items, prompts, leaf classification)
//! - ports/: Trait definitions (local staging, remote assets, inference, classifier)
//! - adapters/: Concrete implementations (filesystem, provider HTTP APIs, axum routes)
//! - application/: Generic services (the describe workflow and its cleanup scope)
//! - config: Environment configuration
//! - error: Request-level error taxonomy

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::http::{router, AppState};
pub use application::describe::{DescribeService, Diagnosis};
pub use config::AppConfig;
pub use error::{CleanupWarning, DescribeError};
