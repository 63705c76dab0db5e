//! Error types for the mutation engine
//!
//! Provides the raw transport failure shape, the closed classification
//! taxonomy, and the classified error surfaced to callers.

use serde::Serialize;
use thiserror::Error;

// == Transport Error Enum ==
/// Raw failure reported by the transport layer performing the real write.
///
/// The engine never inspects these beyond classification; the original
/// payload travels unchanged inside [`MutationError`] so callers can build
/// their own messaging from it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection-level failure (refused, reset, DNS)
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server never responded
    #[error("no response received")]
    NoResponse,

    /// HTTP-style failure with a status code
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// Explicit validation failure without an HTTP status
    #[error("validation failed: {0}")]
    Validation(String),

    /// Anything the transport could not describe further
    #[error("transport failure: {0}")]
    Other(String),
}

// == Error Kind Enum ==
/// Closed classification of a transport failure.
///
/// Derived exactly once per failure by the classifier; downstream code
/// matches on this enum and never re-inspects the raw error shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Connection-level failure or no response
    Network,
    /// The caller is not authenticated (401/403)
    Authentication,
    /// The server rejected the payload (422 or explicit marker)
    Validation,
    /// Server-side fault (status >= 500)
    ServerFault,
    /// Other client-side fault (status in 400..500)
    ClientFault,
    /// Unclassifiable failure
    Unknown,
}

// == Mutation Error ==
/// Classified failure returned from a mutation invocation.
///
/// Produced only after retries are exhausted (or skipped, for kinds that
/// never retry) and after the cache has been rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mutation failed after {attempts} attempt(s) ({kind:?}): {source}")]
pub struct MutationError {
    /// The classification that drove retry and propagation policy
    pub kind: ErrorKind,
    /// Number of write attempts made before giving up
    pub attempts: u32,
    /// The original transport failure, payload intact
    #[source]
    pub source: TransportError,
}

// == Result Type Alias ==
/// Convenience Result type for mutation outcomes.
pub type Result<T> = std::result::Result<T, MutationError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request failed with status 503: unavailable"
        );
    }

    #[test]
    fn test_mutation_error_preserves_source() {
        let source = TransportError::Validation("name required".to_string());
        let err = MutationError {
            kind: ErrorKind::Validation,
            attempts: 1,
            source: source.clone(),
        };

        assert_eq!(err.source, source);
        assert!(err.to_string().contains("name required"));
    }
}
