use thiserror::Error;

/// Failures surfaced to the caller of a gateway request.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Credential lookup failed: {0}")]
    CredentialLookup(#[source] SessionError),

    #[error("Credential cannot be sent as a header value")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Unauthorized ({status}) - credential missing, invalid or expired")]
    Unauthorized { status: u16, body: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Transport error: {cause}")]
    Transport { status: Option<u16>, cause: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Failures reported by a session provider.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session provider unavailable: {0}")]
    Unavailable(String),

    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
    }

    /// Map a non-success response onto the error taxonomy.
    /// `unauthorized_status` is the configured "unauthorized" code (normally 401).
    pub fn from_status(status: u16, body: &str, unauthorized_status: u16) -> Self {
        let truncated = Self::truncate_body(body);
        if status == unauthorized_status {
            return ApiError::Unauthorized {
                status,
                body: truncated,
            };
        }
        match status {
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError {
                status,
                body: truncated,
            },
            _ => ApiError::UnexpectedStatus {
                status,
                body: truncated,
            },
        }
    }

    /// Status code carried by this failure, if a response (or a status-bearing
    /// transport failure) produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. }
            | ApiError::ServerError { status, .. }
            | ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::Transport { status, .. } => *status,
            ApiError::CredentialLookup(_)
            | ApiError::InvalidCredential(_)
            | ApiError::InvalidResponse(_) => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            status: err.status().map(|s| s.as_u16()),
            cause: err.to_string(),
        }
    }
}
