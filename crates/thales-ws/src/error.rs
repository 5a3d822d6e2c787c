//! Error types for WebSocket sessions.

use std::fmt;
use thiserror::Error;

/// Result type for WebSocket operations.
pub type WsResult<T> = Result<T, WsError>;

/// Errors that can occur on a WebSocket connection.
#[derive(Debug, Error)]
pub enum WsError {
    /// The connection was closed, locally or by the peer.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Close code, when a close frame was seen.
        code: Option<u16>,
        /// Reason for closing.
        reason: String,
    },

    /// Failed to send a message.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The message payload could not be decoded.
    #[error("failed to decode message: {0}")]
    DecodeFailed(String),

    /// The message payload could not be encoded.
    #[error("failed to encode message: {0}")]
    EncodeFailed(String),

    /// The peer broke the graphql-transport-ws protocol.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The server did not acknowledge `connection_init` in time.
    #[error("connection not acknowledged within {timeout_ms} ms")]
    AckTimeout {
        /// The configured wait, in milliseconds.
        timeout_ms: u64,
    },
}

impl WsError {
    /// Create a new connection closed error.
    pub fn connection_closed(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            code,
            reason: reason.into(),
        }
    }

    /// Create a new send failed error.
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed(reason.into())
    }

    /// Create a new protocol error.
    pub fn protocol_error(reason: impl Into<String>) -> Self {
        Self::ProtocolError(reason.into())
    }

    /// Get the close code if this is a connection closed error.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::ConnectionClosed { code, .. } => *code,
            _ => None,
        }
    }

    /// Check if this error ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed { .. } | Self::ProtocolError(_) | Self::AckTimeout { .. }
        )
    }
}

/// Close code for WebSocket connections.
///
/// The 44xx codes are defined by the graphql-transport-ws protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CloseCode {
    /// Normal closure (1000).
    Normal = 1000,
    /// Going away (1001).
    GoingAway = 1001,
    /// Protocol error (1002).
    Protocol = 1002,
    /// Internal error (1011).
    InternalError = 1011,
    /// Invalid message received (4400).
    BadRequest = 4400,
    /// Subscribe before `connection_ack` (4401).
    Unauthorized = 4401,
    /// Forbidden (4403).
    Forbidden = 4403,
    /// No `connection_init` within the timeout (4408).
    ConnectionInitTimeout = 4408,
    /// Subscription id already in use (4409).
    SubscriberAlreadyExists = 4409,
    /// Repeated `connection_init` (4429).
    TooManyInitRequests = 4429,
}

impl CloseCode {
    /// Convert from a u16 code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1000 => Some(Self::Normal),
            1001 => Some(Self::GoingAway),
            1002 => Some(Self::Protocol),
            1011 => Some(Self::InternalError),
            4400 => Some(Self::BadRequest),
            4401 => Some(Self::Unauthorized),
            4403 => Some(Self::Forbidden),
            4408 => Some(Self::ConnectionInitTimeout),
            4409 => Some(Self::SubscriberAlreadyExists),
            4429 => Some(Self::TooManyInitRequests),
            _ => None,
        }
    }

    /// Get the u16 value of this close code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "Normal",
            Self::GoingAway => "GoingAway",
            Self::Protocol => "Protocol",
            Self::InternalError => "InternalError",
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::ConnectionInitTimeout => "ConnectionInitTimeout",
            Self::SubscriberAlreadyExists => "SubscriberAlreadyExists",
            Self::TooManyInitRequests => "TooManyInitRequests",
        };
        write!(f, "{} ({})", name, self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_error_connection_closed() {
        let err = WsError::connection_closed(Some(4401), "Unauthorized");
        assert_eq!(err.close_code(), Some(4401));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_decode_failure_not_fatal() {
        let err = WsError::DecodeFailed("bad json".to_string());
        assert!(!err.is_fatal());
        assert_eq!(err.close_code(), None);
    }

    #[test]
    fn test_close_code_round_trip() {
        for code in [1000, 1001, 1002, 1011, 4400, 4401, 4403, 4408, 4409, 4429] {
            assert_eq!(CloseCode::from_u16(code).unwrap().as_u16(), code);
        }
        assert_eq!(CloseCode::from_u16(4999), None);
    }

    #[test]
    fn test_close_code_display() {
        assert_eq!(CloseCode::Normal.to_string(), "Normal (1000)");
        assert_eq!(
            CloseCode::ConnectionInitTimeout.to_string(),
            "ConnectionInitTimeout (4408)"
        );
    }
}
