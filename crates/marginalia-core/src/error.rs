//! Error types for marginalia.

use thiserror::Error;

/// Result type alias using marginalia's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for marginalia operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (unknown field name, malformed id, bad option)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Writing or merging an annotation record failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Regenerating the derived overview artifact failed
    #[error("Regeneration error: {0}")]
    Regeneration(String),

    /// A per-entity capability call was rejected
    #[error("Capability error: {0}")]
    Capability(String),

    /// The entity catalog could not produce a working set
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Job registry error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The underlying message without the category prefix.
    ///
    /// Used where the raw cause is shown to the user, e.g. a failed job's message.
    pub fn detail(&self) -> String {
        match self {
            Error::NotFound(msg)
            | Error::InvalidInput(msg)
            | Error::Persistence(msg)
            | Error::Regeneration(msg)
            | Error::Capability(msg)
            | Error::Catalog(msg)
            | Error::Job(msg)
            | Error::Serialization(msg)
            | Error::Config(msg)
            | Error::Request(msg)
            | Error::Internal(msg) => msg.clone(),
            Error::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("orders".to_string());
        assert_eq!(err.to_string(), "Not found: orders");
    }

    #[test]
    fn test_error_display_persistence() {
        let err = Error::Persistence("disk full".to_string());
        assert_eq!(err.to_string(), "Persistence error: disk full");
    }

    #[test]
    fn test_error_display_regeneration() {
        let err = Error::Regeneration("template missing".to_string());
        assert_eq!(err.to_string(), "Regeneration error: template missing");
    }

    #[test]
    fn test_error_display_capability() {
        let err = Error::Capability("warehouse unreachable".to_string());
        assert_eq!(err.to_string(), "Capability error: warehouse unreachable");
    }

    #[test]
    fn test_error_display_catalog() {
        let err = Error::Catalog("domain missing".to_string());
        assert_eq!(err.to_string(), "Catalog error: domain missing");
    }

    #[test]
    fn test_error_display_job() {
        let err = Error::Job("job is terminal".to_string());
        assert_eq!(err.to_string(), "Job error: job is terminal");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("unknown field: colour".to_string());
        assert_eq!(err.to_string(), "Invalid input: unknown field: colour");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_detail_strips_category() {
        let err = Error::Catalog("domain sales not found".to_string());
        assert_eq!(err.detail(), "domain sales not found");

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(Error::Io(io_err).detail(), "disk full");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>(r#"{"invalid": json}"#);
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
