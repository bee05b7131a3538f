//! Structured error types for expensectl-core.
//!
//! Library callers match on [`StoreError::kind`] rather than on driver types.
//! The binary crate (expensectl-cli) wraps these in `anyhow` for display.

use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by backend primitives.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure while establishing the shared connection.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Client construction or URI parsing failed
    #[error("could not connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    /// Client was built but the liveness check failed
    #[error("{endpoint} did not answer ping: {source}")]
    Ping {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    NotFound,
    Operation,
    Decode,
}

/// Main error type for expense store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The provider could not produce a usable handle.
    /// Shared between every caller that observed the same initialization round.
    #[error("connection failure: {0}")]
    Connection(#[source] Arc<ConnectError>),

    /// A read matched zero documents
    #[error("not found: {resource} matching {filter}")]
    NotFound {
        resource: &'static str,
        filter: String,
    },

    /// An insert/find/delete primitive failed
    #[error("{operation} failed: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// A matched document could not be rebuilt into the requested type
    #[error("could not decode {resource}: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: bson::de::Error,
    },
}

/// Result type alias for expensectl-core operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Operation { .. } => ErrorKind::Operation,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Create a not-found error
    pub fn not_found(resource: &'static str, filter: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            filter: filter.into(),
        }
    }

    /// Create an operation error from any backend failure
    pub fn operation(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Operation {
            operation,
            source: source.into(),
        }
    }

    /// Create a decode error
    pub fn decode(resource: &'static str, source: bson::de::Error) -> Self {
        Self::Decode { resource, source }
    }
}

impl From<Arc<ConnectError>> for StoreError {
    fn from(err: Arc<ConnectError>) -> Self {
        Self::Connection(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("expense", "expenseID = \"1d\"");
        assert_eq!(err.to_string(), "not found: expense matching expenseID = \"1d\"");

        let err = StoreError::operation(
            "insert_one",
            io::Error::new(io::ErrorKind::BrokenPipe, "socket closed"),
        );
        assert!(err.to_string().starts_with("insert_one failed"));
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn test_kind_classification() {
        let connect = Arc::new(ConnectError::Ping {
            endpoint: "mongodb://localhost:27017".into(),
            source: "server selection timeout".into(),
        });
        let err: StoreError = connect.into();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!err.is_not_found());

        assert!(StoreError::not_found("expense", "all").is_not_found());
        assert_eq!(
            StoreError::operation("delete_many", "boom").kind(),
            ErrorKind::Operation
        );
    }

    #[test]
    fn test_connection_error_keeps_source_chain() {
        let connect = Arc::new(ConnectError::Connect {
            endpoint: "mongodb://db:27017".into(),
            source: "invalid scheme".into(),
        });
        let err = StoreError::from(connect);

        let source = err.source().expect("connection error has a source");
        assert!(source.to_string().contains("mongodb://db:27017"));
        assert!(source.source().is_some());
    }
}
