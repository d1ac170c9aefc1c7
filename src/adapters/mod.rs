//! Adapters - Concrete implementations of ports.

pub mod http;
pub mod local;
pub mod remote;
