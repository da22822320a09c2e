//! Core library for the Crowd container entrypoint
//!
//! This crate contains the shared logic for resolving the server's runtime
//! configuration from environment variable namespaces, rendering it into
//! the config files the server consumes, writing those files atomically,
//! and supervising the server process through its log-observable lifecycle.

pub mod errors;
pub mod logging;
pub mod paths;
pub mod render;
pub mod resolver;
pub mod supervisor;
pub mod writer;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let version = version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }
}
