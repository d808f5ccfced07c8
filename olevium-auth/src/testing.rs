//! In-process backend for tests.
//!
//! `MockBackend` implements [`Transport`] and behaves like the Olevium auth
//! API: it issues numbered token pairs, validates bearer tokens on every
//! non-auth path, and records every call so tests can count refreshes and
//! inspect which token each request carried.

use crate::client::auth_client::{LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, SIGNUP_PATH};
use crate::client::transport::{ApiRequest, ApiResponse, Transport};
use crate::common::TokenPair;
use crate::error::AuthError;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub const TEST_EMAIL: &str = "ana@example.com";
pub const TEST_PASSWORD: &str = "correct-horse";

const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
    pub retried: bool,
}

struct MockState {
    email: String,
    password: String,
    user_id: i64,
    generation: u32,
    valid_access: Option<String>,
    valid_refresh: Option<String>,
    rotate_refresh: bool,
    reject_refresh: bool,
    refresh_unreachable: bool,
    refresh_status: Option<StatusCode>,
    fail_logout: bool,
    routes: HashMap<String, (StatusCode, Value)>,
}

struct MockShared {
    state: Mutex<MockState>,
    calls: Mutex<Vec<RecordedCall>>,
    refresh_delay: Mutex<Duration>,
}

/// Scripted stand-in for the backend. Clones share state.
#[derive(Clone)]
pub struct MockBackend {
    shared: Arc<MockShared>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(MockShared {
                state: Mutex::new(MockState {
                    email: TEST_EMAIL.to_string(),
                    password: TEST_PASSWORD.to_string(),
                    user_id: 1,
                    generation: 0,
                    valid_access: None,
                    valid_refresh: None,
                    rotate_refresh: true,
                    reject_refresh: false,
                    refresh_unreachable: false,
                    refresh_status: None,
                    fail_logout: false,
                    routes: HashMap::new(),
                }),
                calls: Mutex::new(Vec::new()),
                refresh_delay: Mutex::new(DEFAULT_REFRESH_DELAY),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn calls_guard(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.shared.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stub the response for an authenticated route, e.g. `GET /accounts`.
    pub fn route(&self, method: Method, path: &str, status: StatusCode, body: Value) -> &Self {
        self.state()
            .routes
            .insert(route_key(&method, path), (status, body));
        self
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self
            .shared
            .refresh_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Issue a token pair without going through `/auth/login`
    pub fn issue_tokens(&self) -> TokenPair {
        let mut state = self.state();
        state.issue(true)
    }

    /// Invalidate the current access token; the refresh token stays valid.
    pub fn expire_access_token(&self) {
        self.state().valid_access = None;
    }

    pub fn revoke_refresh_token(&self) {
        self.state().reject_refresh = true;
    }

    /// `/auth/refresh` fails at the connection level
    pub fn make_refresh_unreachable(&self) {
        self.state().refresh_unreachable = true;
    }

    /// `/auth/refresh` answers with `status` instead of a token pair
    pub fn fail_refresh_with(&self, status: StatusCode) {
        self.state().refresh_status = Some(status);
    }

    /// Number of live handles on this backend, including the one held by a session
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.shared)
    }

    /// Refresh responses stop carrying a new refresh token.
    pub fn disable_refresh_rotation(&self) {
        self.state().rotate_refresh = false;
    }

    pub fn fail_logout(&self) {
        self.state().fail_logout = true;
    }

    pub fn valid_access_token(&self) -> Option<String> {
        self.state().valid_access.clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls_guard().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls_guard()
            .iter()
            .filter(|call| call.path == path)
            .cloned()
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls_to(path).len()
    }

    pub fn refresh_count(&self) -> usize {
        self.count(REFRESH_PATH)
    }

    fn record(&self, request: &ApiRequest) {
        self.calls_guard().push(RecordedCall {
            method: request.method.clone(),
            path: request.path.clone(),
            bearer: request.bearer.clone(),
            body: request.body.clone(),
            retried: request.retried,
        });
    }

    fn refresh_delay(&self) -> Duration {
        *self
            .shared
            .refresh_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_login(&self, body: &Value) -> ApiResponse {
        let mut state = self.state();
        let email = body.get("email").and_then(Value::as_str);
        let password = body.get("password").and_then(Value::as_str);

        if email != Some(state.email.as_str()) || password != Some(state.password.as_str()) {
            return error(StatusCode::UNAUTHORIZED, "Incorrect email or password");
        }

        let tokens = state.issue(true);
        ApiResponse::json_body(StatusCode::OK, &state.token_body(&tokens, true))
    }

    fn handle_signup(&self, body: &Value) -> ApiResponse {
        let mut state = self.state();
        let (Some(email), Some(password)) = (
            body.get("email").and_then(Value::as_str),
            body.get("password").and_then(Value::as_str),
        ) else {
            return error(StatusCode::UNPROCESSABLE_ENTITY, "email and password are required");
        };

        if email == state.email {
            return error(StatusCode::CONFLICT, "Email already registered");
        }

        state.email = email.to_string();
        state.password = password.to_string();
        state.user_id += 1;

        let tokens = state.issue(true);
        ApiResponse::json_body(StatusCode::CREATED, &state.token_body(&tokens, true))
    }

    fn handle_refresh(&self, body: &Value) -> ApiResponse {
        let mut state = self.state();
        let presented = body.get("refresh_token").and_then(Value::as_str);

        if let Some(status) = state.refresh_status {
            return error(status, "Service unavailable");
        }

        if state.reject_refresh || presented.is_none() || presented != state.valid_refresh.as_deref()
        {
            return error(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token");
        }

        let rotate = state.rotate_refresh;
        let tokens = state.issue(rotate);
        ApiResponse::json_body(StatusCode::OK, &state.token_body(&tokens, false))
    }

    fn handle_logout(&self) -> Result<ApiResponse, AuthError> {
        let mut state = self.state();
        if state.fail_logout {
            return Err(AuthError::Network("Connection reset by peer".to_string()));
        }
        state.valid_access = None;
        state.valid_refresh = None;
        Ok(ApiResponse::new(StatusCode::NO_CONTENT, Vec::new()))
    }

    fn handle_protected(&self, request: &ApiRequest) -> ApiResponse {
        let state = self.state();
        let authorized =
            state.valid_access.is_some() && request.bearer.as_deref() == state.valid_access.as_deref();
        if !authorized {
            return error(StatusCode::UNAUTHORIZED, "Not authenticated");
        }

        match state.routes.get(&route_key(&request.method, &request.path)) {
            Some((status, body)) => ApiResponse::json_body(*status, body),
            None => ApiResponse::json_body(StatusCode::OK, &json!({"ok": true})),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    fn issue(&mut self, rotate_refresh: bool) -> TokenPair {
        self.generation += 1;
        let access = format!("access-{}", self.generation);
        self.valid_access = Some(access.clone());
        if rotate_refresh || self.valid_refresh.is_none() {
            self.valid_refresh = Some(format!("refresh-{}", self.generation));
        }

        TokenPair {
            access_token: Some(access),
            refresh_token: rotate_refresh.then(|| self.valid_refresh.clone()).flatten(),
            token_type: "bearer".to_string(),
        }
    }

    fn token_body(&self, tokens: &TokenPair, with_user: bool) -> Value {
        let mut body = json!({
            "access_token": tokens.access_token,
            "token_type": tokens.token_type,
        });
        if let Some(refresh) = &tokens.refresh_token {
            body["refresh_token"] = json!(refresh);
        }
        if with_user {
            body["user"] = json!({"id": self.user_id, "email": self.email, "name": "Ana"});
        }
        body
    }
}

impl Transport for MockBackend {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        self.record(&request);
        let body = request.body.clone().unwrap_or(Value::Null);

        if request.method != Method::POST {
            return Ok(self.handle_protected(&request));
        }

        match request.path.as_str() {
            LOGIN_PATH => Ok(self.handle_login(&body)),
            SIGNUP_PATH => Ok(self.handle_signup(&body)),
            REFRESH_PATH => {
                tokio::time::sleep(self.refresh_delay()).await;
                if self.state().refresh_unreachable {
                    return Err(AuthError::Network("Could not connect to the server".to_string()));
                }
                Ok(self.handle_refresh(&body))
            }
            LOGOUT_PATH => self.handle_logout(),
            _ => Ok(self.handle_protected(&request)),
        }
    }
}

fn route_key(method: &Method, path: &str) -> String {
    format!("{} {}", method, path)
}

fn error(status: StatusCode, detail: &str) -> ApiResponse {
    ApiResponse::json_body(status, &json!({ "detail": detail }))
}
