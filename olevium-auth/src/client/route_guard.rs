use crate::client::config::RouteSettings;
use crate::client::cookie_jar::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

const LANDING_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect { location: String },
}

/// Decides page access from token cookie presence alone. Token validity is
/// the API's business; a stale cookie gets a redirect from the session layer
/// on the first rejected call.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_path: String,
    home_path: String,
    auth_paths: Vec<String>,
    protected_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new(routes: &RouteSettings) -> Self {
        Self {
            login_path: routes.login_path.clone(),
            home_path: routes.home_path.clone(),
            auth_paths: routes.auth_paths.clone(),
            protected_prefixes: routes.protected_prefixes.clone(),
        }
    }

    pub fn evaluate(&self, path: &str, cookie_header: Option<&str>) -> RouteDecision {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let signed_in = cookie_header.is_some_and(has_session_cookie);

        if signed_in && (path == LANDING_PATH || self.is_auth_page(path)) {
            tracing::debug!(path, "Signed-in visitor redirected to app");
            return RouteDecision::Redirect {
                location: self.home_path.clone(),
            };
        }

        if !signed_in && self.is_protected(path) {
            tracing::debug!(path, "Anonymous visitor redirected to login");
            return RouteDecision::Redirect {
                location: self.login_path.clone(),
            };
        }

        RouteDecision::Allow
    }

    fn is_auth_page(&self, path: &str) -> bool {
        self.auth_paths.iter().any(|auth| path == auth)
    }

    fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(&RouteSettings::default())
    }
}

fn has_session_cookie(header: &str) -> bool {
    header.split(';').any(|pair| {
        let (name, value) = pair.trim().split_once('=').unwrap_or((pair.trim(), ""));
        (name == ACCESS_TOKEN_COOKIE || name == REFRESH_TOKEN_COOKIE) && !value.is_empty()
    })
}
