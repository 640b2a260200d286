//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Unreadable, unparseable or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record type outside the set the provider accepts
    #[error("Invalid record type: {0}")]
    InvalidRecordType(String),

    /// Zone or record name did not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one record matches the lookup key
    #[error("Ambiguous match: {count} records named {name} with type {record_type}")]
    AmbiguousMatch {
        /// Record name used for the lookup
        name: String,
        /// Record type used for the lookup
        record_type: String,
        /// Number of matching records
        count: usize,
    },

    /// Transport, status or decoding failure talking to the DNS API
    #[error("Provider error ({operation}): {message}")]
    Provider {
        /// Provider operation that failed
        operation: String,
        /// Error message
        message: String,
    },

    /// Transport, status or decoding failure talking to the IP service
    #[error("Network error: {0}")]
    Network(String),

    /// Local I/O errors (signal handler setup)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid record type error
    pub fn invalid_record_type(record_type: impl Into<String>) -> Self {
        Self::InvalidRecordType(record_type.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an ambiguous match error
    pub fn ambiguous(name: impl Into<String>, record_type: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousMatch {
            name: name.into(),
            record_type: record_type.into(),
            count,
        }
    }

    /// Create a provider error for the given operation
    pub fn provider(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Whether this error stems from configuration rather than the network
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidRecordType(_))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_record_type_counts_as_config_error() {
        assert!(Error::invalid_record_type("PTR").is_config());
        assert!(Error::config("missing token").is_config());
        assert!(!Error::network("timeout").is_config());
    }

    #[test]
    fn io_errors_are_runtime_errors() {
        let err: Error = std::io::Error::other("signal driver unavailable").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_config());
    }

    #[test]
    fn provider_error_names_operation() {
        let err = Error::provider("resolve_zone", "HTTP 500");
        assert_eq!(err.to_string(), "Provider error (resolve_zone): HTTP 500");
    }

    #[test]
    fn ambiguous_match_message() {
        let err = Error::ambiguous("home", "A", 2);
        assert_eq!(
            err.to_string(),
            "Ambiguous match: 2 records named home with type A"
        );
    }
}
