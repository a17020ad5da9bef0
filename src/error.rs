//! Error types for Copper Cloud API operations.

use std::fmt;

use thiserror::Error;

/// A non-200 HTTP response, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResponse {
    /// HTTP method of the request.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// HTTP status code returned by the server.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl fmt::Display for FailedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.url, self.status)?;
        if !self.body.is_empty() {
            write!(f, ": {}", self.body)?;
        }
        Ok(())
    }
}

/// Errors that can occur during Copper Cloud operations.
#[derive(Debug, Error)]
pub enum CopperError {
    /// Configuration is missing or incomplete.
    #[error("Copper configuration required: {0}")]
    ConfigMissing(String),

    /// The server answered 401 or 403.
    #[error("unauthorized: {0}")]
    Unauthorized(FailedResponse),

    /// The server answered 400; the request was malformed.
    #[error("bad request: {0}")]
    ClientError(FailedResponse),

    /// Any other non-200 response.
    #[error("request failed: {0}")]
    RequestError(FailedResponse),

    /// The token endpoint rejected a grant.
    #[error("token exchange ({grant_type}) failed: {reason}")]
    AuthExchange {
        grant_type: &'static str,
        reason: String,
    },

    /// A caller-supplied value could not be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Filesystem error (token cache, CSV output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CopperError {
    /// True for 401/403 responses, the only errors that trigger re-authentication.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// The failed response carried by this error, if any.
    pub fn response(&self) -> Option<&FailedResponse> {
        match self {
            Self::Unauthorized(r) | Self::ClientError(r) | Self::RequestError(r) => Some(r),
            _ => None,
        }
    }
}

/// Result type alias for Copper Cloud operations.
pub type Result<T> = core::result::Result<T, CopperError>;
