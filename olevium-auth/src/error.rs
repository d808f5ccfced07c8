use thiserror::Error;

/// Errors surfaced by the session layer.
///
/// Every variant carries a readable message rather than the underlying
/// transport or IO error, so the type is `Clone` and one refresh outcome can
/// be handed to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Session expired, sign in again at {redirect_to}")]
    LoginRequired { redirect_to: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl AuthError {
    /// True when the caller has to go back through the login entry point.
    pub fn requires_login(&self) -> bool {
        matches!(self, AuthError::LoginRequired { .. })
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            AuthError::Network("Could not connect to the server".to_string())
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Json(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::TokenStorage(err.to_string())
    }
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
