mod models;

use crate::client::transport::{ApiRequest, ApiResponse, Transport};
use crate::common::Session;
use crate::error::AuthError;
pub use models::normalize_token_response;
use models::*;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/auth/login";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Raw calls against the backend's `/auth` endpoints. Holds no session state.
pub struct AuthClient<T> {
    transport: Arc<T>,
}

impl<T: Transport> AuthClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, AuthError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json(&LoginRequest {
                email,
                password: password.expose_secret(),
            })?
            .without_refresh();

        let response = self.transport.execute(request).await?;
        match response.status {
            status if status.is_success() => token_body(&response, None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthError::Authentication(response.error_message()))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(AuthError::Validation(response.error_message()))
            }
            _ => Err(api_error(&response)),
        }
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        name: Option<&str>,
    ) -> Result<Session, AuthError> {
        let request = ApiRequest::post(SIGNUP_PATH)
            .json(&SignupRequest {
                email,
                password: password.expose_secret(),
                name,
            })?
            .without_refresh();

        let response = self.transport.execute(request).await?;
        match response.status {
            status if status.is_success() => token_body(&response, None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthError::Authentication(response.error_message()))
            }
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(AuthError::Validation(response.error_message()))
            }
            _ => Err(api_error(&response)),
        }
    }

    /// Exchange a refresh token. Any 4xx means the token is no longer usable.
    pub async fn refresh(
        &self,
        access_token: Option<&str>,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshRequest {
                access_token,
                refresh_token,
            })?
            .without_refresh();

        let response = self.transport.execute(request).await?;
        if response.status.is_success() {
            token_body(&response, Some(refresh_token))
        } else if response.status.is_client_error() {
            Err(AuthError::Authentication(format!(
                "Refresh token rejected: {}",
                response.error_message()
            )))
        } else {
            Err(api_error(&response))
        }
    }

    pub async fn logout(&self, access_token: Option<String>) -> Result<(), AuthError> {
        let request = ApiRequest::post(LOGOUT_PATH)
            .without_refresh()
            .with_bearer(access_token);

        let response = self.transport.execute(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(api_error(&response))
        }
    }
}

fn token_body(response: &ApiResponse, fallback_refresh: Option<&str>) -> Result<Session, AuthError> {
    let body: Value = serde_json::from_slice(&response.body)
        .map_err(|e| AuthError::Authentication(format!("Malformed token response: {}", e)))?;
    normalize_token_response(&body, fallback_refresh)
}

fn api_error(response: &ApiResponse) -> AuthError {
    AuthError::Api {
        status: response.status.as_u16(),
        message: response.error_message(),
    }
}
