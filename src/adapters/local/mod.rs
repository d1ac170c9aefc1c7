//! Local adapters: transient on-disk staging.

pub mod fs;

pub use fs::FsStager;
