use crate::common::{Session, TokenPair, UserSummary, DEFAULT_TOKEN_TYPE};
use crate::error::AuthError;
use serde::Serialize;
use serde_json::{Map, Value};

// POST /auth/login
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// POST /auth/signup
#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

// POST /auth/refresh
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<&'a str>,
    pub refresh_token: &'a str,
}

/// Normalize a login/signup/refresh response body.
///
/// Accepts snake_case and camelCase token keys. When the body carries no
/// refresh token, `fallback_refresh` is reused; login and signup pass `None`
/// so a missing refresh token is rejected there.
pub fn normalize_token_response(
    body: &Value,
    fallback_refresh: Option<&str>,
) -> Result<Session, AuthError> {
    let object = body
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object"))?;

    let access_token = string_field(object, "access_token", "accessToken")?
        .ok_or_else(|| malformed("missing access token"))?;

    let refresh_token = match string_field(object, "refresh_token", "refreshToken")? {
        Some(token) => token,
        None => fallback_refresh
            .map(str::to_string)
            .ok_or_else(|| malformed("missing refresh token"))?,
    };

    let token_type = string_field(object, "token_type", "tokenType")?
        .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());

    let user = match object.get("user") {
        None | Some(Value::Null) => None,
        Some(user) => Some(
            serde_json::from_value::<UserSummary>(user.clone())
                .map_err(|e| malformed(&format!("invalid user: {}", e)))?,
        ),
    };

    Ok(Session {
        tokens: TokenPair {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            token_type,
        },
        user,
    })
}

fn string_field(
    object: &Map<String, Value>,
    snake: &str,
    camel: &str,
) -> Result<Option<String>, AuthError> {
    match object.get(snake).or_else(|| object.get(camel)) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => {
            Err(malformed(&format!("empty {}", snake)))
        }
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(malformed(&format!("{} is not a string", snake))),
    }
}

fn malformed(reason: &str) -> AuthError {
    AuthError::Authentication(format!("Malformed token response: {}", reason))
}
