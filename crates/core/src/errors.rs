//! Error types and handling
//!
//! This module provides domain-specific error types for the entrypoint
//! pipeline. The taxonomy is structured with specific error enums for each
//! stage (configuration resolution, config file writing, lifecycle
//! supervision) that are then wrapped in the main EntrypointError enum for
//! unified error handling.

use std::time::Duration;
use thiserror::Error;

/// Configuration resolution errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable's value cannot be parsed as its declared type
    #[error("Invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Config file write errors
///
/// Writes are atomic from the caller's perspective; on any of these errors
/// the destination file is either absent or still at its prior content.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Destination path unwritable (permissions, missing directory)
    #[error("Failed to write config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The rendered temp file could not be moved over the destination
    #[error("Failed to move config file into place at {path}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Lifecycle supervision errors
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The expected log marker did not appear within the allotted wait
    #[error("Timed out after {waited:?} waiting for the {phase} marker")]
    Timeout { phase: &'static str, waited: Duration },

    /// The process log stream ended before the expected marker appeared
    ///
    /// This is a crash, not a clean shutdown: an unexpected termination is
    /// reported as a failure rather than mapped onto the terminated state.
    #[error("Process exited before the {phase} marker appeared")]
    UnexpectedExit { phase: &'static str },

    /// Spawning or signalling the managed process failed
    #[error("Failed to {action} the managed process")]
    Process {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Reading the process log stream failed
    #[error("Failed to read the process log stream")]
    Stream(#[from] std::io::Error),
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum EntrypointError {
    /// Configuration resolution errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Config file write errors
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Lifecycle supervision errors
    #[error("Supervision error: {0}")]
    Supervisor(#[from] SupervisorError),
}

/// Convenience type alias for Results with EntrypointError
pub type Result<T> = std::result::Result<T, EntrypointError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidValue {
            key: "ATL_TOMCAT_SECURE".to_string(),
            value: "yes".to_string(),
            expected: "'true' or 'false'",
        };
        assert_eq!(
            format!("{}", error),
            "Invalid value 'yes' for ATL_TOMCAT_SECURE: expected 'true' or 'false'"
        );
    }

    #[test]
    fn test_supervisor_error_display() {
        let error = SupervisorError::Timeout {
            phase: "startup",
            waited: Duration::from_secs(5),
        };
        assert_eq!(
            format!("{}", error),
            "Timed out after 5s waiting for the startup marker"
        );

        let error = SupervisorError::UnexpectedExit { phase: "shutdown" };
        assert_eq!(
            format!("{}", error),
            "Process exited before the shutdown marker appeared"
        );
    }

    #[test]
    fn test_entrypoint_error_from_domain_errors() {
        let config_error = ConfigError::InvalidValue {
            key: "ATL_TOMCAT_PORT".to_string(),
            value: "abc".to_string(),
            expected: "a base-10 integer",
        };
        let entrypoint_error: EntrypointError = config_error.into();
        assert!(matches!(entrypoint_error, EntrypointError::Config(_)));

        let supervisor_error = SupervisorError::UnexpectedExit { phase: "startup" };
        let entrypoint_error: EntrypointError = supervisor_error.into();
        assert!(matches!(entrypoint_error, EntrypointError::Supervisor(_)));
    }

    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let write_error = WriteError::Io {
            path: "/opt/atlassian/crowd/apache-tomcat/conf/server.xml".to_string(),
            source: io_error,
        };
        let entrypoint_error = EntrypointError::Write(write_error);

        assert!(entrypoint_error.source().is_some());
        if let Some(source) = entrypoint_error.source() {
            assert!(source.source().is_some()); // the underlying io::Error
        }
    }

    #[test]
    fn test_anyhow_conversions() {
        let error = SupervisorError::Timeout {
            phase: "shutdown",
            waited: Duration::from_secs(60),
        };
        let anyhow_error = anyhow::Error::from(error);
        assert!(anyhow_error.to_string().contains("Timed out"));
    }
}
