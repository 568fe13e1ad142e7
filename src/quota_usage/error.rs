use thiserror::Error;

/// Classified outcome of a failed quota fetch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuotaError {
    #[error("Invalid API token (HTTP 401). Set a new token to continue.")]
    Unauthorized,
    #[error("Access denied (HTTP 403). The token lacks permission to read quota usage.")]
    Forbidden,
    #[error("Rate limited (HTTP 429). Try again later.")]
    RateLimited,
    #[error("Quota service unavailable (HTTP {status}). Try again later.")]
    ServiceUnavailable { status: u16 },
    #[error("HTTP error {status}: {reason}")]
    OtherHttp { status: u16, reason: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request error: {0}")]
    RequestSetup(String),
    #[error("Invalid quota data: total quota is zero or missing")]
    DivisionGuard,
    #[error("Invalid quota response: {0}")]
    InvalidResponse(String),
}

impl QuotaError {
    /// Map a non-success HTTP status to its error category
    pub fn from_status(status: u16, reason: Option<&str>) -> Self {
        match status {
            401 => QuotaError::Unauthorized,
            403 => QuotaError::Forbidden,
            429 => QuotaError::RateLimited,
            500 | 502 | 503 | 504 => QuotaError::ServiceUnavailable { status },
            _ => QuotaError::OtherHttp {
                status,
                reason: reason.unwrap_or("Unknown").to_string(),
            },
        }
    }

    /// Short label for the compact status line when nothing is cached
    pub fn label(&self) -> String {
        match self {
            QuotaError::Unauthorized => "Invalid Token".to_string(),
            QuotaError::Forbidden => "Access Denied".to_string(),
            QuotaError::RateLimited => "Rate Limited".to_string(),
            QuotaError::ServiceUnavailable { .. } => "Service Down".to_string(),
            QuotaError::OtherHttp { status, .. } => format!("HTTP {status}"),
            QuotaError::Network(_) => "Network Error".to_string(),
            QuotaError::RequestSetup(_) => "Request Error".to_string(),
            QuotaError::DivisionGuard | QuotaError::InvalidResponse(_) => "Invalid Data".to_string(),
        }
    }
}

impl From<reqwest::Error> for QuotaError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return QuotaError::from_status(status.as_u16(), status.canonical_reason());
        }
        if err.is_builder() {
            return QuotaError::RequestSetup(err.to_string());
        }
        if err.is_decode() {
            return QuotaError::InvalidResponse(err.to_string());
        }
        // Timeouts, connect failures and body read failures all mean no usable response
        QuotaError::Network(err.to_string())
    }
}

/// Rejection of a token entered by the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("API token cannot be empty")]
    Empty,
    #[error("API token looks too short (expected at least {min} characters)")]
    TooShort { min: usize },
}

/// Failure reading or writing the stored token
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to access credential store: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the set-token operation
#[derive(Debug, Error)]
pub enum SetTokenError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] CredentialError),
}
