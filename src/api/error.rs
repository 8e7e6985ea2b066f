use std::fmt;

/// Errors returned by [`Session`](super::Session) requests and the generic
/// item/collection types.
#[derive(Debug)]
pub enum ApiError {
    /// Transport failure (connect, TLS, timeout).
    Http(reqwest::Error),
    /// The API answered with a non-success status.
    Status { code: u16, body: String },
    /// The operation needs a server-assigned id the model does not have yet.
    MissingId,
    /// The response body is not the expected `{"data": ...}` document.
    Decode(String),
    InvalidUrl(url::ParseError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "request failed: {e}"),
            ApiError::Status { code, body } => write!(f, "API returned {code}: {body}"),
            ApiError::MissingId => f.write_str("operation requires an id"),
            ApiError::Decode(msg) => write!(f, "unexpected response body: {msg}"),
            ApiError::InvalidUrl(e) => write!(f, "invalid url: {e}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Http(e) => Some(e),
            ApiError::InvalidUrl(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Http(e)
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::InvalidUrl(e)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
