//! Client error types.

use std::io;

use thiserror::Error;
use xgesture_protocol::{GrabStatus, ProtocolError};

/// Result type for client operations.
pub type GestureResult<T> = Result<T, GestureError>;

/// Result type for transport primitives.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures reported by the underlying connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error on the connection.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Connection is closed.
    #[error("connection closed")]
    Closed,

    /// Any other transport-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Why a synchronous exchange produced no usable reply.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The request could not be sent or the reply could not be read.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply could not be parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Errors that can occur in gesture operations.
#[derive(Debug, Error)]
pub enum GestureError {
    /// The server does not advertise the extension on this connection.
    #[error("extension {extension} is not supported by the server")]
    NotSupported { extension: String },

    /// No reply could be obtained for a request.
    #[error("{operation}: invalid reply: {source}")]
    InvalidReply {
        operation: &'static str,
        #[source]
        source: ReplyError,
    },

    /// Grab rejected locally before sending.
    #[error("grab rejected: event type {event_type} is out of range")]
    GrabAbnormal { event_type: u32 },

    /// Ungrab rejected locally before sending.
    #[error("ungrab rejected: {reason}")]
    UngrabAbnormal { reason: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed input given to the command-line tool.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error outside of a protocol exchange.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl GestureError {
    /// Creates a not supported error.
    pub fn not_supported(extension: impl Into<String>) -> Self {
        Self::NotSupported {
            extension: extension.into(),
        }
    }

    /// Creates an invalid reply error.
    pub fn invalid_reply(operation: &'static str, source: impl Into<ReplyError>) -> Self {
        Self::InvalidReply {
            operation,
            source: source.into(),
        }
    }

    /// Creates an ungrab abnormal error.
    pub fn ungrab_abnormal(reason: impl Into<String>) -> Self {
        Self::UngrabAbnormal {
            reason: reason.into(),
        }
    }

    /// Returns the numeric status this outcome is reported as.
    ///
    /// Errors without a status code of their own map to `None`.
    pub fn status(&self) -> Option<GrabStatus> {
        match self {
            Self::InvalidReply { .. } => Some(GrabStatus::INVALID_REPLY),
            Self::GrabAbnormal { .. } => Some(GrabStatus::GRAB_ABNORMAL),
            Self::UngrabAbnormal { .. } => Some(GrabStatus::UNGRAB_ABNORMAL),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            GestureError::GrabAbnormal { event_type: 9 }.status(),
            Some(GrabStatus::GRAB_ABNORMAL)
        );
        assert_eq!(
            GestureError::ungrab_abnormal("window is 0").status(),
            Some(GrabStatus::UNGRAB_ABNORMAL)
        );
        assert_eq!(
            GestureError::invalid_reply("GrabEvent", TransportError::Closed).status(),
            Some(GrabStatus::INVALID_REPLY)
        );
        assert_eq!(GestureError::not_supported("GESTURE").status(), None);
    }

    #[test]
    fn invalid_reply_display_names_operation_and_cause() {
        let err = GestureError::invalid_reply(
            "GetSelectedEvents",
            ProtocolError::UnexpectedReply { code: 7 },
        );
        let message = err.to_string();
        assert!(message.contains("GetSelectedEvents"));
        assert!(message.contains("unexpected reply code 7"));
    }
}
