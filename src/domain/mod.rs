//! Domain layer - Pure business logic.

pub mod formats;
pub mod leaf;
pub mod media;
pub mod prompt;
