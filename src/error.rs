use reqwest::StatusCode;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No usable credential, or the refresh cycle could not recover the session
    #[error("Session expired")]
    SessionExpired,
    /// Server rejected the request for a reason other than authorization
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    /// Network-level failure (connect, timeout, body read)
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Response body could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Refresh endpoint failure (reported to the gate, surfaced as `SessionExpired`)
    #[error("Refresh failed: {0}")]
    Refresh(String),
    /// Credential store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
    /// Caller supplied something the request builder cannot send
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Stable machine-readable name for the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session_expired",
            Self::Http { .. } => "http_error",
            Self::Transport(_) => "transport_error",
            Self::Decode(_) => "decode_error",
            Self::Refresh(_) => "refresh_error",
            Self::Storage(_) => "storage_error",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}
