//! Error taxonomy for the QSE client.
//!
//! Every operation in this workspace is terminal on failure: no variant here
//! implies an automatic retry or silent recovery. Callers branch on the
//! variant kind and decide their own retry policy.

use std::path::PathBuf;

/// Convenience alias used across the qse crates.
pub type Result<T> = std::result::Result<T, QseError>;

/// Errors raised by trust-context construction, ticket requests, and the
/// engine channel.
#[derive(Debug, thiserror::Error)]
pub enum QseError {
    /// Certificate container or certificate could not be parsed.
    #[error("certificate format error: {message}")]
    CertificateFormat {
        /// What failed to parse.
        message: String,
    },

    /// PKCS#12 password rejected, or the peer refused the client identity.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Human-readable cause. Never contains the password itself.
        message: String,
    },

    /// A certificate input file does not exist.
    #[error("file not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Key or signature algorithm unsupported by the TLS backend.
    #[error("unsupported algorithm: {message}")]
    UnsupportedAlgorithm {
        /// Backend rejection detail.
        message: String,
    },

    /// Connect or read deadline exceeded.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// The operation that hit the deadline.
        operation: String,
        /// The fixed deadline that was exceeded.
        seconds: u64,
    },

    /// The proxy service answered the ticket request with a non-2xx status.
    #[error("ticket request failed with status {status}: {body}")]
    TicketRequest {
        /// HTTP status code returned by the proxy service.
        status: u16,
        /// Raw response body, passed through verbatim.
        body: String,
    },

    /// Transport-level failure on an established connection.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable summary.
        message: String,
    },

    /// WebSocket open failed before the channel was established.
    #[error("handshake failed: {message}")]
    Handshake {
        /// Human-readable summary.
        message: String,
    },
}

impl QseError {
    /// Wrap a parse failure as [`QseError::CertificateFormat`].
    pub fn certificate_format(message: impl Into<String>) -> Self {
        Self::CertificateFormat {
            message: message.into(),
        }
    }

    /// Wrap a transport failure as [`QseError::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Wrap a WebSocket open failure as [`QseError::Handshake`].
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn ticket_request_error_carries_status_and_body() {
        let err = QseError::TicketRequest {
            status: 403,
            body: "Forbidden".into(),
        };
        assert_eq!(
            err.to_string(),
            "ticket request failed with status 403: Forbidden"
        );
        assert_matches!(err, QseError::TicketRequest { status: 403, .. });
    }

    #[test]
    fn not_found_displays_path() {
        let err = QseError::NotFound {
            path: PathBuf::from("/certs/client.pfx"),
        };
        assert_eq!(err.to_string(), "file not found: /certs/client.pfx");
    }

    #[test]
    fn timeout_names_operation_and_deadline() {
        let err = QseError::Timeout {
            operation: "ticket request".into(),
            seconds: 30,
        };
        assert_eq!(err.to_string(), "ticket request timed out after 30s");
    }

    #[test]
    fn constructors_build_expected_variants() {
        assert_matches!(
            QseError::certificate_format("bad der"),
            QseError::CertificateFormat { .. }
        );
        assert_matches!(QseError::transport("reset"), QseError::Transport { .. });
        assert_matches!(QseError::handshake("refused"), QseError::Handshake { .. });
    }
}
