//! Utility modules: log capture sink.
pub mod devlog;
