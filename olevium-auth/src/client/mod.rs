pub mod auth_client;
mod config;
pub mod cookie_jar;
mod route_guard;
mod session;
pub mod transport;

pub use self::config::{CookieSettings, RouteSettings, Settings};
pub use auth_client::AuthClient;
pub use cookie_jar::{Cookie, CookieJar, CookiePolicy, SameSite};
pub use route_guard::{RouteDecision, RouteGuard};
pub use session::{SessionManager, SessionOptions};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

use crate::error::AuthError;

/// Restore the persisted session for the configured backend.
///
/// When the access cookie has lapsed but the refresh cookie is still alive the
/// session is refreshed up front. A failed refresh clears the stored cookies.
/// A rejected token leaves an anonymous session behind rather than failing,
/// so the caller can go on to log in. Network and server failures are returned.
pub async fn resume_session(settings: &Settings) -> Result<SessionManager, AuthError> {
    let session = SessionManager::from_settings(settings)?;

    if session.access_token().is_none() && session.has_refresh_token() {
        tracing::info!("Access cookie expired, refreshing session");
        match session.refresh_session().await {
            Ok(_) => tracing::info!("Session refreshed on startup"),
            Err(AuthError::Authentication(e)) => {
                tracing::warn!(error = %e, "Stored refresh token rejected");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(session)
}
