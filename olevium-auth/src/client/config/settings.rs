use crate::client::cookie_jar::{CookieJar, CookiePolicy};
use crate::error::AuthError;
use chrono::Duration;
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub cookies: CookieSettings,

    #[serde(default)]
    pub routes: RouteSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieSettings {
    #[serde(default = "default_access_max_age")]
    pub access_max_age_secs: i64,

    #[serde(default = "default_refresh_max_age")]
    pub refresh_max_age_secs: i64,

    /// Where the cookie jar is persisted. Defaults to the user cache directory.
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default = "default_persist")]
    pub persist: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouteSettings {
    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_home_path")]
    pub home_path: String,

    #[serde(default = "default_auth_paths")]
    pub auth_paths: Vec<String>,

    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_access_max_age() -> i64 {
    60 * 60
}

fn default_refresh_max_age() -> i64 {
    7 * 24 * 60 * 60
}

fn default_persist() -> bool {
    true
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_home_path() -> String {
    "/dashboard".to_string()
}

fn default_auth_paths() -> Vec<String> {
    vec!["/login".to_string(), "/signup".to_string()]
}

fn default_protected_prefixes() -> Vec<String> {
    [
        "/dashboard",
        "/accounts",
        "/transactions",
        "/categories",
        "/recurring",
        "/settings",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            access_max_age_secs: default_access_max_age(),
            refresh_max_age_secs: default_refresh_max_age(),
            file: None,
            persist: default_persist(),
        }
    }
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            home_path: default_home_path(),
            auth_paths: default_auth_paths(),
            protected_prefixes: default_protected_prefixes(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("OLEVIUM_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("OLEVIUM").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("api_url is required".to_string());
        }
        if !self.api_url.starts_with("http") {
            return Err("api_url must be a valid HTTP(S) URL".to_string());
        }
        if self.cookies.access_max_age_secs <= 0 || self.cookies.refresh_max_age_secs <= 0 {
            return Err("cookie lifetimes must be positive".to_string());
        }
        if self.cookies.refresh_max_age_secs < self.cookies.access_max_age_secs {
            return Err("refresh cookie must outlive the access cookie".to_string());
        }
        if !self.routes.login_path.starts_with('/') || !self.routes.home_path.starts_with('/') {
            return Err("route paths must start with '/'".to_string());
        }
        Ok(())
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy::for_base_url(
            &self.api_url,
            Duration::seconds(self.cookies.access_max_age_secs),
            Duration::seconds(self.cookies.refresh_max_age_secs),
        )
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Open the cookie jar these settings point at
    pub fn open_cookie_jar(&self) -> Result<CookieJar, AuthError> {
        if !self.cookies.persist {
            return Ok(CookieJar::in_memory());
        }

        let path = match &self.cookies.file {
            Some(path) => path.clone(),
            None => CookieJar::default_path()?,
        };
        CookieJar::open(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let settings = Settings::from_toml("").unwrap();

        assert_eq!(settings.api_url, "http://localhost:8000");
        assert_eq!(settings.cookies.access_max_age_secs, 3600);
        assert_eq!(settings.routes.login_path, "/login");
        assert!(settings.validate().is_ok());
        assert!(!settings.cookie_policy().secure);
    }

    #[test]
    fn nested_sections_override_defaults() {
        let settings = Settings::from_toml(
            r#"
            api_url = "https://api.olevium.app"

            [cookies]
            access_max_age_secs = 900
            persist = false

            [routes]
            home_path = "/overview"
            "#,
        )
        .unwrap();

        let policy = settings.cookie_policy();
        assert!(policy.secure);
        assert_eq!(policy.access_max_age, Duration::minutes(15));
        assert_eq!(settings.cookies.refresh_max_age_secs, 7 * 24 * 60 * 60);
        assert_eq!(settings.routes.home_path, "/overview");
        assert_eq!(settings.routes.login_path, "/login");
        assert!(settings.open_cookie_jar().unwrap().cookie_header().is_none());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let settings = Settings::from_toml(r#"api_url = "ftp://example.com""#).unwrap();
        assert!(settings.validate().is_err());

        let settings = Settings::from_toml(
            r#"
            [cookies]
            access_max_age_secs = 7200
            refresh_max_age_secs = 60
            "#,
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }
}
