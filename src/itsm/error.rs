// ABOUTME: Errors from the ITSM REST client.
// ABOUTME: Maps HTTP status codes onto caller-meaningful variants.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ItsmError {
    #[error("invalid ITSM credentials")]
    InvalidCredentials,

    #[error("ITSM record not found: {0}")]
    NotFound(String),

    #[error("ITSM rejected request: {0}")]
    BadRequest(String),

    #[error("ITSM request not successful: {status}. Reason: {body}")]
    Http { status: u16, body: String },

    #[error("ITSM transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid ITSM response: {0}")]
    InvalidResponse(String),

    #[error("invalid ITSM client configuration: {0}")]
    Config(String),
}

impl ItsmError {
    /// Map a non-accepted response status to an error. `subject` names what was requested.
    pub fn from_status(status: StatusCode, subject: &str, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ItsmError::InvalidCredentials,
            StatusCode::NOT_FOUND => ItsmError::NotFound(subject.to_string()),
            StatusCode::BAD_REQUEST => ItsmError::BadRequest(body),
            other => ItsmError::Http {
                status: other.as_u16(),
                body,
            },
        }
    }
}
