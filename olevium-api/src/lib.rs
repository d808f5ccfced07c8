pub mod endpoints;
mod error;
mod macros;
pub mod repositories;
mod request;

pub use crate::error::ApiError;
pub use crate::request::{EmptyResponse, Endpoint, RequestData};
use olevium_auth::{ApiRequest, HttpTransport, SessionManager, Transport};
use repositories::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Typed client for the Olevium REST API.
///
/// Every call is routed through the session coordinator, so it carries the
/// current bearer token and survives one expired access token per request.
pub struct Client<T: Transport = HttpTransport> {
    session: SessionManager<T>,
}

impl<T: Transport> Client<T> {
    pub fn new(session: SessionManager<T>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, ApiError>
    where
        R: Endpoint,
    {
        let api_request = build_request(&request)?;
        tracing::debug!(method = %api_request.method, path = %api_request.path, "Calling endpoint");

        let response = self.session.send(api_request).await?;
        if !response.is_success() {
            return Err(ApiError::from_response(&response));
        }

        decode(&response.body)
    }
}

fn build_request<R: Endpoint>(request: &R) -> Result<ApiRequest, ApiError> {
    let mut api_request = ApiRequest::new(R::METHOD, request.endpoint());
    match request.data() {
        RequestData::Empty => {}
        RequestData::Json(data) => {
            let body = serde_json::to_value(data).map_err(|e| ApiError::Encode(e.to_string()))?;
            api_request.body = Some(body);
        }
        RequestData::Query(data) => api_request.query = query_pairs(data)?,
    }
    Ok(api_request)
}

/// Flatten a serializable struct into query pairs; `None` fields are dropped.
fn query_pairs<D: Serialize>(data: &D) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(data).map_err(|e| ApiError::Encode(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ApiError::Encode(
            "query parameters must serialize to an object".to_string(),
        ));
    };

    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                pairs.extend(items.iter().map(|item| (key.clone(), query_value(item))));
            }
            other => pairs.push((key, query_value(&other))),
        }
    }
    Ok(pairs)
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode<D: DeserializeOwned>(body: &[u8]) -> Result<D, ApiError> {
    // 204 and friends: let unit-like responses decode from null
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    };
    result.map_err(|e| ApiError::Decode(e.to_string()))
}

pub struct Request;

impl Request {
    pub fn accounts() -> AccountRepository {
        AccountRepository::new()
    }

    pub fn categories() -> CategoryRepository {
        CategoryRepository::new()
    }

    pub fn transactions() -> TransactionRepository {
        TransactionRepository::new()
    }

    pub fn recurring() -> RecurringRepository {
        RecurringRepository::new()
    }

    pub fn dashboard() -> DashboardRepository {
        DashboardRepository::new()
    }
}
