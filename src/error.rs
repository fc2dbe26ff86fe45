/// Errors surfaced by the session and synchronization layer
///
/// The first group is what components hand back to the UI. Transport and
/// local variants are produced by the remote client and the key-value store
/// and are converted at each component boundary.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to load: {0}")]
    Load(String),

    #[error("Failed to sync: {0}")]
    Sync(String),

    #[error("Exchange failed: {0}")]
    Exchange(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Operation already in flight: {0}")]
    InFlight(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Remote service returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// True when a protected call was rejected for lack of a valid session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }

    /// True for failures the user may reasonably retry by hand
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::HttpClient(_) | AppError::Timeout => true,
            AppError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Human-readable message for display, without the variant prefix
    ///
    /// Remote messages are passed through verbatim so the UI shows what the
    /// service said.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(msg)
            | AppError::Load(msg)
            | AppError::Sync(msg)
            | AppError::Exchange(msg)
            | AppError::Unauthorized(msg) => msg.clone(),
            AppError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_detection() {
        assert!(AppError::Unauthorized("expired".to_string()).is_unauthorized());
        assert!(!AppError::NotAuthenticated.is_unauthorized());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Timeout.is_retryable());
        assert!(AppError::Api {
            status: 502,
            message: "bad gateway".to_string()
        }
        .is_retryable());
        assert!(!AppError::Api {
            status: 400,
            message: "Movie already in watchlist".to_string()
        }
        .is_retryable());
        assert!(!AppError::Auth("Invalid username or password".to_string()).is_retryable());
    }

    #[test]
    fn test_user_message_passes_remote_text_through() {
        let err = AppError::Api {
            status: 404,
            message: "Movie not in watchlist".to_string(),
        };
        assert_eq!(err.user_message(), "Movie not in watchlist");
        assert_eq!(
            AppError::Sync("Failed to update watchlist".to_string()).user_message(),
            "Failed to update watchlist"
        );
        assert_eq!(AppError::NotAuthenticated.user_message(), "Not logged in");
    }
}
