// Token, user and session models
pub mod common;

// Session coordinator and its collaborators
mod client;
mod error;

pub use client::{
    auth_client, cookie_jar, resume_session, transport, ApiRequest, ApiResponse, AuthClient,
    Cookie, CookieJar, CookiePolicy, CookieSettings, HttpTransport, RouteDecision, RouteGuard,
    RouteSettings, SameSite, SessionManager, SessionOptions, Settings, Transport,
};
pub use common::{Session, SessionState, TokenPair, UserId, UserSummary};
pub use error::AuthError;

// Re-exported so downstream crates build requests and passwords with the same types
pub use reqwest::{Method, StatusCode};
pub use secrecy::SecretString;

// Always expose testing module (integration tests of dependent crates need it)
pub mod testing;
