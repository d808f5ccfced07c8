use crate::common::{TokenPair, DEFAULT_TOKEN_TYPE};
use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const TOKEN_TYPE_COOKIE: &str = "token_type";

const COOKIE_PATH: &str = "/";
const DEFAULT_ACCESS_MAX_AGE: Duration = Duration::hours(1);
const DEFAULT_REFRESH_MAX_AGE: Duration = Duration::days(7);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => f.write_str("Strict"),
            Self::Lax => f.write_str("Lax"),
            Self::None => f.write_str("None"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age_secs: i64,
    pub expires_at: DateTime<Utc>,
    pub path: String,
    pub same_site: SameSite,
    pub secure: bool,
}

impl Cookie {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Value for a `Set-Cookie` response header
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path={}; SameSite={}",
            self.name, self.value, self.max_age_secs, self.path, self.same_site
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Lifetimes and attributes applied to the token cookies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub access_max_age: Duration,
    pub refresh_max_age: Duration,
    pub secure: bool,
}

impl CookiePolicy {
    /// `Secure` is set only when the API is served over HTTPS.
    pub fn for_base_url(base_url: &str, access_max_age: Duration, refresh_max_age: Duration) -> Self {
        Self {
            access_max_age,
            refresh_max_age,
            secure: base_url.starts_with("https://"),
        }
    }
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            access_max_age: DEFAULT_ACCESS_MAX_AGE,
            refresh_max_age: DEFAULT_REFRESH_MAX_AGE,
            secure: false,
        }
    }
}

/// Cookie storage for the session tokens, optionally mirrored to a JSON file.
pub struct CookieJar {
    path: Option<PathBuf>,
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            cookies: BTreeMap::new(),
        }
    }

    /// Open (or create) a file-backed jar. Cookies already past their max-age
    /// are dropped while loading.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to create cookie directory: {}", e))
                })?;
            }
        }

        let mut cookies = BTreeMap::new();
        if path.exists() {
            let json = fs::read_to_string(&path)
                .map_err(|e| AuthError::TokenStorage(format!("Failed to read cookies: {}", e)))?;
            let stored: Vec<Cookie> = serde_json::from_str(&json)?;
            let now = Utc::now();
            for cookie in stored.into_iter().filter(|c| !c.is_expired_at(now)) {
                cookies.insert(cookie.name.clone(), cookie);
            }
        }

        Ok(Self {
            path: Some(path),
            cookies,
        })
    }

    pub fn default_path() -> Result<PathBuf, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find cache directory".to_string()))?
            .join("olevium");
        Ok(cache_dir.join("cookies.json"))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_at(name, Utc::now())
    }

    pub fn get_at(&self, name: &str, now: DateTime<Utc>) -> Option<&str> {
        self.cookies
            .get(name)
            .filter(|c| !c.is_expired_at(now))
            .map(|c| c.value.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: &str, max_age: Duration, policy: &CookiePolicy) {
        let cookie = Cookie {
            name: name.to_string(),
            value: value.to_string(),
            max_age_secs: max_age.num_seconds(),
            expires_at: Utc::now() + max_age,
            path: COOKIE_PATH.to_string(),
            same_site: SameSite::Lax,
            secure: policy.secure,
        };
        self.cookies.insert(name.to_string(), cookie);
    }

    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        self.cookies.remove(name)
    }

    /// `Cookie` request header carrying every live cookie
    pub fn cookie_header(&self) -> Option<String> {
        let now = Utc::now();
        let pairs: Vec<String> = self
            .cookies
            .values()
            .filter(|c| !c.is_expired_at(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    pub fn set_cookie_headers(&self) -> Vec<String> {
        let now = Utc::now();
        self.cookies
            .values()
            .filter(|c| !c.is_expired_at(now))
            .map(Cookie::to_set_cookie)
            .collect()
    }

    /// Mirror a token pair into the jar. Tokens that are absent remove their cookie.
    pub fn store_tokens(&mut self, tokens: &TokenPair, policy: &CookiePolicy) -> Result<(), AuthError> {
        match &tokens.access_token {
            Some(token) => self.set(ACCESS_TOKEN_COOKIE, token, policy.access_max_age, policy),
            None => {
                self.remove(ACCESS_TOKEN_COOKIE);
            }
        }
        match &tokens.refresh_token {
            Some(token) => self.set(REFRESH_TOKEN_COOKIE, token, policy.refresh_max_age, policy),
            None => {
                self.remove(REFRESH_TOKEN_COOKIE);
            }
        }
        self.set(
            TOKEN_TYPE_COOKIE,
            &tokens.token_type,
            policy.refresh_max_age,
            policy,
        );

        self.save()
    }

    pub fn load_tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.get(ACCESS_TOKEN_COOKIE).map(str::to_string),
            refresh_token: self.get(REFRESH_TOKEN_COOKIE).map(str::to_string),
            token_type: self
                .get(TOKEN_TYPE_COOKIE)
                .unwrap_or(DEFAULT_TOKEN_TYPE)
                .to_string(),
        }
    }

    /// Drop the three token cookies and return the `Set-Cookie` values that
    /// expire them on the other side.
    pub fn clear_tokens(&mut self) -> Result<Vec<String>, AuthError> {
        let removals = [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, TOKEN_TYPE_COOKIE]
            .into_iter()
            .map(|name| {
                let secure = self.remove(name).map(|c| c.secure).unwrap_or(false);
                let mut header = format!(
                    "{}=; Max-Age=0; Path={}; SameSite={}",
                    name,
                    COOKIE_PATH,
                    SameSite::Lax
                );
                if secure {
                    header.push_str("; Secure");
                }
                header
            })
            .collect();

        self.save()?;
        Ok(removals)
    }

    fn save(&self) -> Result<(), AuthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let cookies: Vec<&Cookie> = self.cookies.values().collect();
        let json = serde_json::to_string_pretty(&cookies)?;

        fs::write(path, json)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to save cookies: {}", e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)
                .map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }
}
