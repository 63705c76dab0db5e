//! Error Classifier Module
//!
//! Maps raw transport failures into the closed [`ErrorKind`] taxonomy.

use crate::error::{ErrorKind, TransportError};

// == Classify ==
/// Classifies a raw transport failure.
///
/// Pure and total: every input maps to some kind, unclassifiable input maps
/// to [`ErrorKind::Unknown`] rather than failing. Rules apply in priority
/// order:
///
/// 1. Connection-level failures and missing responses are Network
/// 2. Status 401/403 is Authentication
/// 3. Status 422 or an explicit validation marker is Validation
/// 4. Status >= 500 is ServerFault
/// 5. Status in 400..500 is ClientFault
/// 6. Everything else is Unknown
pub fn classify(error: &TransportError) -> ErrorKind {
    match error {
        TransportError::Connection(_) | TransportError::NoResponse => ErrorKind::Network,
        TransportError::Validation(_) => ErrorKind::Validation,
        TransportError::Http { status, .. } => classify_status(*status),
        TransportError::Other(_) => ErrorKind::Unknown,
    }
}

/// Classifies an HTTP-style status code.
fn classify_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Authentication,
        422 => ErrorKind::Validation,
        500.. => ErrorKind::ServerFault,
        400..=499 => ErrorKind::ClientFault,
        _ => ErrorKind::Unknown,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_is_network() {
        let err = TransportError::Connection("refused".to_string());
        assert_eq!(classify(&err), ErrorKind::Network);
    }

    #[test]
    fn test_no_response_is_network() {
        assert_eq!(classify(&TransportError::NoResponse), ErrorKind::Network);
    }

    #[test]
    fn test_401_is_authentication() {
        let err = TransportError::Http {
            status: 401,
            message: "unauthenticated".to_string(),
        };
        assert_eq!(classify(&err), ErrorKind::Authentication);
    }

    #[test]
    fn test_403_is_authentication() {
        let err = TransportError::Http {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(classify(&err), ErrorKind::Authentication);
    }

    #[test]
    fn test_422_is_validation() {
        let err = TransportError::Http {
            status: 422,
            message: "unprocessable".to_string(),
        };
        assert_eq!(classify(&err), ErrorKind::Validation);
    }

    #[test]
    fn test_validation_marker_without_status() {
        let err = TransportError::Validation("name required".to_string());
        assert_eq!(classify(&err), ErrorKind::Validation);
    }

    #[test]
    fn test_5xx_is_server_fault() {
        for status in [500, 502, 503, 599] {
            let err = TransportError::Http {
                status,
                message: String::new(),
            };
            assert_eq!(classify(&err), ErrorKind::ServerFault, "status {}", status);
        }
    }

    #[test]
    fn test_4xx_is_client_fault() {
        for status in [400, 404, 409, 429] {
            let err = TransportError::Http {
                status,
                message: String::new(),
            };
            assert_eq!(classify(&err), ErrorKind::ClientFault, "status {}", status);
        }
    }

    #[test]
    fn test_unexpected_status_is_unknown() {
        let err = TransportError::Http {
            status: 302,
            message: String::new(),
        };
        assert_eq!(classify(&err), ErrorKind::Unknown);
    }

    #[test]
    fn test_other_is_unknown() {
        let err = TransportError::Other("mystery".to_string());
        assert_eq!(classify(&err), ErrorKind::Unknown);
    }
}
