//! Error types for the listkeeper client.

use std::fmt;

/// Errors from the client and its refresh backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The local token store failed.
    Store { operation: &'static str },
    /// The request could not be sent or its response could not be read.
    Http { details: String },
    /// The API answered with an unexpected status.
    Api { status: u16, message: String },
    /// A stored token cannot be used as a header value.
    InvalidHeader,
    /// An in-process refresh failed.
    Refresh,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { operation } => write!(f, "token store failure during {operation}"),
            Self::Http { details } => write!(f, "http error: {details}"),
            Self::Api { status, message } => write!(f, "api error {status}: {message}"),
            Self::InvalidHeader => write!(f, "stored token is not a valid header value"),
            Self::Refresh => write!(f, "token refresh failed"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http {
            details: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "api error 500: boom");
    }
}
