//! Application layer - Generic services that use ports.

pub mod cleanup;
pub mod describe;
