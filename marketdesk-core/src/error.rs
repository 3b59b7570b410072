//! Error taxonomy for console operations

use thiserror::Error;

/// Text surfaced when the server reports a failure without a message.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Text surfaced for connection-level failures.
pub const TRANSPORT_MESSAGE: &str = "Could not reach the server. Check your connection and retry.";

/// Text surfaced when a payload cannot be decoded.
pub const DECODE_MESSAGE: &str = "The server returned an unexpected response.";

/// Failures a controller or adapter can report.
///
/// Every variant is local and recoverable: callers keep running and offer a
/// retry. Stale responses are not errors and never appear here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsoleError {
    /// DNS, connection refused, timeout.
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// `success: false` or a non-2xx status. Displays as the server message.
    #[error("{message}")]
    Application { status: Option<u16>, message: String },

    /// Client-side rejection; the request never reaches the network.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Payload did not match the expected shape.
    #[error("malformed response: {reason}")]
    Decode { reason: String },
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl ConsoleError {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Build an application error, falling back to the generic text when the
    /// server did not supply a usable message.
    pub fn application(status: Option<u16>, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        Self::Application { status, message }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Text shown to the operator. Application messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => TRANSPORT_MESSAGE.to_string(),
            Self::Application { message, .. } => message.clone(),
            Self::Validation { .. } => self.to_string(),
            Self::Decode { .. } => DECODE_MESSAGE.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Application { status: Some(401), .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_message_is_verbatim() {
        let err = ConsoleError::application(Some(409), Some("conflict".to_string()));
        assert_eq!(err.to_string(), "conflict");
        assert_eq!(err.user_message(), "conflict");
    }

    #[test]
    fn blank_message_uses_fallback() {
        let err = ConsoleError::application(None, Some("   ".to_string()));
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
        let err = ConsoleError::application(Some(500), None);
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn transport_detail_is_not_surfaced() {
        let err = ConsoleError::transport("tcp connect error: refused");
        assert_eq!(err.user_message(), TRANSPORT_MESSAGE);
    }
}
