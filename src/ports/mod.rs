//! Ports - Trait definitions for everything outside the domain.

pub mod assets;
pub mod classifier;
pub mod inference;
pub mod staging;
