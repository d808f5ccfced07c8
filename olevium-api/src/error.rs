use olevium_auth::{ApiResponse, AuthError, StatusCode};

#[derive(Debug)]
pub enum ApiError {
    /// Raised by the session layer: authentication, network, login redirect
    Session(AuthError),
    /// Request was well formed but rejected by business rules (400/422)
    Validation(String),
    NotFound(String),
    Server(StatusCode, String),
    Encode(String),
    Decode(String),
}

impl ApiError {
    pub fn from_response(response: &ApiResponse) -> Self {
        let message = response.error_message();
        match response.status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(message)
            }
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            status => ApiError::Server(status, message),
        }
    }

    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Session(e) if e.requires_login())
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        ApiError::Session(value)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Session(e) => e.fmt(f),
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Server(status, msg) => write!(f, "({}) {}", status, msg),
            ApiError::Encode(msg) => write!(f, "Could not encode request: {}", msg),
            ApiError::Decode(msg) => write!(f, "Could not decode response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Session(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let response = ApiResponse::new(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail": "amount must be positive"}"#);
        assert!(matches!(
            ApiError::from_response(&response),
            ApiError::Validation(msg) if msg == "amount must be positive"
        ));

        let response = ApiResponse::new(StatusCode::NOT_FOUND, r#"{"detail": "Account not found"}"#);
        assert_eq!(
            ApiError::from_response(&response).to_string(),
            "Not found: Account not found"
        );

        let response = ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, Vec::new());
        assert_eq!(
            ApiError::from_response(&response).to_string(),
            "(500 Internal Server Error) Internal Server Error"
        );
    }

    #[test]
    fn login_redirect_is_detected() {
        let err = ApiError::from(AuthError::LoginRequired {
            redirect_to: "/login".to_string(),
        });
        assert!(err.requires_login());
        assert!(!ApiError::NotFound(String::new()).requires_login());
    }
}
