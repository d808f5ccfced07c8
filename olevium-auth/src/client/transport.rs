use crate::error::AuthError;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A request as seen by the session layer, before the bearer token is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
    /// Set once the request has been replayed after a refresh
    pub retried: bool,
    /// Cleared for requests that must never trigger a refresh (the refresh call itself)
    pub refreshable: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
            retried: false,
            refreshable: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, AuthError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: StatusCode, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Human readable message from an error body (`detail`, `message` or `error`),
    /// falling back to the status reason.
    pub fn error_message(&self) -> String {
        let fallback = || {
            self.status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        };

        let Ok(value) = serde_json::from_slice::<Value>(&self.body) else {
            let text = self.text();
            return if text.trim().is_empty() {
                fallback()
            } else {
                text
            };
        };

        ["detail", "message", "error"]
            .iter()
            .find_map(|key| match value.get(key) {
                Some(Value::String(message)) => Some(message.clone()),
                Some(Value::Array(items)) => {
                    let messages: Vec<String> = items
                        .iter()
                        .filter_map(|item| {
                            item.get("msg")
                                .or_else(|| item.get("message"))
                                .and_then(Value::as_str)
                                .map(str::to_string)
                        })
                        .collect();
                    (!messages.is_empty()).then(|| messages.join("; "))
                }
                _ => None,
            })
            .unwrap_or_else(fallback)
    }
}

/// The network seam of the session layer.
pub trait Transport: Send + Sync + 'static {
    fn execute(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse, AuthError>> + Send;
}

/// Production transport backed by reqwest
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AuthError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self.http_client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status = %status, url = %url, "Received response");

        Ok(ApiResponse { status, body })
    }
}
