use crate::client::auth_client::AuthClient;
use crate::client::config::Settings;
use crate::client::cookie_jar::{CookieJar, CookiePolicy};
use crate::client::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use crate::common::{Session, SessionState, TokenPair, UserSummary};
use crate::error::AuthError;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::StatusCode;
use secrecy::SecretString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How one refresh attempt ended, as seen by every request awaiting it
#[derive(Clone)]
enum RefreshOutcome {
    Refreshed(Session),
    /// The session was cleared or replaced while the call was running
    Superseded,
    Failed(AuthError),
}

type RefreshFuture = Shared<BoxFuture<'static, RefreshOutcome>>;

const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub cookie_policy: CookiePolicy,
    /// Where callers are sent once the session cannot be recovered
    pub login_path: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cookie_policy: CookiePolicy::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

struct InFlightRefresh {
    id: u64,
    future: RefreshFuture,
}

struct SessionCell {
    tokens: TokenPair,
    user: Option<UserSummary>,
    jar: CookieJar,
    /// Bumped whenever the session is cleared or replaced. A refresh started
    /// under an older epoch never commits.
    epoch: u64,
    next_flight_id: u64,
    refresh: Option<InFlightRefresh>,
}

impl SessionCell {
    fn snapshot(&self) -> Session {
        Session {
            tokens: self.tokens.clone(),
            user: self.user.clone(),
        }
    }

    fn replace(&mut self, session: Session, policy: &CookiePolicy) {
        self.epoch += 1;
        self.refresh = None;
        self.tokens = session.tokens;
        self.user = session.user;
        if let Err(e) = self.jar.store_tokens(&self.tokens, policy) {
            warn!(error = %e, "Failed to persist session cookies");
        }
    }

    fn clear(&mut self) -> Vec<String> {
        self.epoch += 1;
        self.refresh = None;
        self.tokens = TokenPair::default();
        self.user = None;
        self.jar.clear_tokens().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to clear session cookies");
            Vec::new()
        })
    }
}

struct SessionInner<T> {
    auth: AuthClient<T>,
    transport: Arc<T>,
    options: SessionOptions,
    cell: Mutex<SessionCell>,
    state: watch::Sender<SessionState>,
}

impl<T: Transport> SessionInner<T> {
    fn cell(&self) -> MutexGuard<'_, SessionCell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Apply a finished refresh to the cell. Any failure ends the session;
    /// a result from an older epoch is dropped untouched.
    fn commit_refresh(
        &self,
        flight_id: u64,
        epoch: u64,
        outcome: Result<Session, AuthError>,
    ) -> RefreshOutcome {
        let mut guard = self.cell();
        let cell = &mut *guard;

        if cell.refresh.as_ref().is_some_and(|flight| flight.id == flight_id) {
            cell.refresh = None;
        }

        if cell.epoch != epoch {
            warn!(flight_id, "Session changed while refreshing, discarding result");
            return RefreshOutcome::Superseded;
        }

        match outcome {
            Ok(session) => {
                cell.tokens = session.tokens;
                if session.user.is_some() {
                    cell.user = session.user;
                }
                if let Err(e) = cell.jar.store_tokens(&cell.tokens, &self.options.cookie_policy) {
                    warn!(error = %e, "Failed to persist refreshed cookies");
                }
                let snapshot = cell.snapshot();
                drop(guard);

                self.set_state(SessionState::Authenticated);
                info!(flight_id, "Session refreshed");
                RefreshOutcome::Refreshed(snapshot)
            }
            Err(err) => {
                cell.clear();
                drop(guard);

                self.set_state(SessionState::Anonymous);
                warn!(flight_id, error = %err, "Session refresh failed, session cleared");
                RefreshOutcome::Failed(err)
            }
        }
    }
}

/// The refresh call itself. Holds only a weak handle on the session so an
/// abandoned flight parked in the cell does not keep the manager alive.
async fn run_refresh<T: Transport>(
    inner: Weak<SessionInner<T>>,
    auth: AuthClient<T>,
    flight_id: u64,
    epoch: u64,
    access_token: Option<String>,
    refresh_token: String,
) -> RefreshOutcome {
    let outcome = auth.refresh(access_token.as_deref(), &refresh_token).await;

    match inner.upgrade() {
        Some(inner) => inner.commit_refresh(flight_id, epoch, outcome),
        None => RefreshOutcome::Superseded,
    }
}

/// Owns the session tokens and coordinates every authenticated request.
///
/// Cloning is cheap and every clone shares the same session. A 401 on an
/// authenticated request triggers at most one refresh at a time: callers that
/// hit a 401 while a refresh is running await the same shared outcome and then
/// replay their request once with the new access token.
pub struct SessionManager<T: Transport = HttpTransport> {
    inner: Arc<SessionInner<T>>,
}

impl<T: Transport> Clone for SessionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SessionManager<HttpTransport> {
    /// Build the production session: reqwest transport plus the persisted cookie jar.
    pub fn from_settings(settings: &Settings) -> Result<Self, AuthError> {
        settings.validate().map_err(AuthError::Configuration)?;

        let transport = HttpTransport::with_timeout(&settings.api_url, settings.request_timeout())?;
        let jar = settings.open_cookie_jar()?;
        let options = SessionOptions {
            cookie_policy: settings.cookie_policy(),
            login_path: settings.routes.login_path.clone(),
        };

        Ok(Self::new(transport, jar, options))
    }
}

impl<T: Transport> SessionManager<T> {
    /// Create a manager, restoring whatever tokens the jar still holds.
    pub fn new(transport: T, jar: CookieJar, options: SessionOptions) -> Self {
        let tokens = jar.load_tokens();
        let initial = if tokens.is_present() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        debug!(state = %initial, "Session restored from cookies");

        let transport = Arc::new(transport);
        let (state, _) = watch::channel(initial);

        Self {
            inner: Arc::new(SessionInner {
                auth: AuthClient::new(Arc::clone(&transport)),
                transport,
                options,
                cell: Mutex::new(SessionCell {
                    tokens,
                    user: None,
                    jar,
                    epoch: 0,
                    next_flight_id: 0,
                    refresh: None,
                }),
                state,
            }),
        }
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, AuthError> {
        info!(email, "Logging in");
        let previous = self.begin_authentication();
        let result = self.inner.auth.login(email, password).await;
        self.finish_authentication(result, previous)
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        name: Option<&str>,
    ) -> Result<Session, AuthError> {
        info!(email, "Signing up");
        let previous = self.begin_authentication();
        let result = self.inner.auth.signup(email, password, name).await;
        self.finish_authentication(result, previous)
    }

    fn begin_authentication(&self) -> SessionState {
        self.inner.state.send_replace(SessionState::Authenticating)
    }

    fn finish_authentication(
        &self,
        result: Result<Session, AuthError>,
        previous: SessionState,
    ) -> Result<Session, AuthError> {
        match result {
            Ok(session) => {
                let snapshot = {
                    let mut cell = self.inner.cell();
                    cell.replace(session, &self.inner.options.cookie_policy);
                    cell.snapshot()
                };
                self.inner.set_state(SessionState::Authenticated);
                info!(
                    user = snapshot.user.as_ref().map(|u| u.email.as_str()),
                    "Authenticated"
                );
                Ok(snapshot)
            }
            Err(err) => {
                let restored = match previous {
                    SessionState::Anonymous | SessionState::Authenticating => {
                        SessionState::Anonymous
                    }
                    _ if self.inner.cell().tokens.is_present() => SessionState::Authenticated,
                    _ => SessionState::Anonymous,
                };
                self.inner.set_state(restored);
                warn!(error = %err, "Authentication failed");
                Err(err)
            }
        }
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// Single-flight: when a refresh is already running the caller awaits that
    /// attempt instead of starting another one. Any failed refresh clears the
    /// session. The error still tells a rejected token (`Authentication`)
    /// apart from `Network` and `Api` failures.
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        match self.join_refresh()?.await {
            RefreshOutcome::Refreshed(session) => Ok(session),
            RefreshOutcome::Failed(err) => Err(err),
            RefreshOutcome::Superseded => self.session().ok_or_else(|| {
                AuthError::Authentication("Session ended while refreshing".to_string())
            }),
        }
    }

    fn join_refresh(&self) -> Result<RefreshFuture, AuthError> {
        let mut guard = self.inner.cell();
        let cell = &mut *guard;

        if let Some(flight) = &cell.refresh {
            debug!(flight_id = flight.id, "Joining in-flight refresh");
            return Ok(flight.future.clone());
        }

        let refresh_token = cell.tokens.refresh_token.clone().ok_or_else(|| {
            AuthError::Authentication("No refresh token available".to_string())
        })?;
        let access_token = cell.tokens.access_token.clone();

        cell.next_flight_id += 1;
        let flight_id = cell.next_flight_id;

        let future = run_refresh(
            Arc::downgrade(&self.inner),
            AuthClient::new(Arc::clone(&self.inner.transport)),
            flight_id,
            cell.epoch,
            access_token,
            refresh_token,
        )
        .boxed()
        .shared();

        cell.refresh = Some(InFlightRefresh {
            id: flight_id,
            future: future.clone(),
        });
        self.inner.set_state(SessionState::Refreshing);
        info!(flight_id, "Starting session refresh");
        Ok(future)
    }

    /// Best-effort server logout. Local tokens and cookies are cleared before
    /// the server is contacted, so they are gone whatever the call returns.
    /// Returns the `Set-Cookie` values that expire the token cookies.
    pub async fn logout(&self) -> Vec<String> {
        let access_token = self.access_token();
        let removals = self.clear_session();

        if let Err(e) = self.inner.auth.logout(access_token).await {
            warn!(error = %e, "Server logout failed, local session already cleared");
        }
        info!("Logged out");

        removals
    }

    /// Drop tokens, cached user and cookies, and return to `Anonymous`.
    pub fn clear_session(&self) -> Vec<String> {
        let removals = self.inner.cell().clear();
        self.inner.set_state(SessionState::Anonymous);
        removals
    }

    /// Send a request with the current bearer token, recovering once from an
    /// expired access token.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, AuthError> {
        loop {
            let token = self.access_token();
            let response = self
                .inner
                .transport
                .execute(request.clone().with_bearer(token.clone()))
                .await?;

            if response.status != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if !request.refreshable {
                return Err(AuthError::Authentication(response.error_message()));
            }

            if request.retried {
                warn!(path = %request.path, "Request still unauthorized after refresh");
                return Err(AuthError::Authentication(format!(
                    "Unauthorized after session refresh: {}",
                    response.error_message()
                )));
            }

            if !self.has_refresh_token() {
                info!(path = %request.path, "Unauthorized without refresh token, clearing session");
                self.clear_session();
                return Err(self.login_required());
            }

            request.retried = true;

            if self.access_token() != token {
                debug!(path = %request.path, "Access token already replaced, retrying");
                continue;
            }

            let outcome = match self.join_refresh() {
                Ok(flight) => flight.await,
                Err(_) => return Err(self.login_required()),
            };
            match outcome {
                RefreshOutcome::Refreshed(_) => debug!(path = %request.path, "Retrying after refresh"),
                RefreshOutcome::Superseded if self.holds_newer_token(&token) => {
                    debug!(path = %request.path, "Session replaced while refreshing, retrying");
                }
                RefreshOutcome::Superseded => return Err(self.login_required()),
                RefreshOutcome::Failed(err) => {
                    info!(path = %request.path, error = %err, "Refresh failed, login required");
                    return Err(self.login_required());
                }
            }
        }
    }

    fn holds_newer_token(&self, used: &Option<String>) -> bool {
        let current = self.access_token();
        current.is_some() && current != *used
    }

    pub fn login_required(&self) -> AuthError {
        AuthError::LoginRequired {
            redirect_to: self.inner.options.login_path.clone(),
        }
    }

    pub fn session(&self) -> Option<Session> {
        let cell = self.inner.cell();
        cell.tokens.is_present().then(|| cell.snapshot())
    }

    /// Cached profile of the signed-in user, reset on every login
    pub fn user(&self) -> Option<UserSummary> {
        self.inner.cell().user.clone()
    }

    pub fn tokens(&self) -> TokenPair {
        self.inner.cell().tokens.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.cell().tokens.access_token.clone()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.inner.cell().tokens.refresh_token.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.cell().tokens.is_present()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.cell().refresh.is_some()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn cookie_header(&self) -> Option<String> {
        self.inner.cell().jar.cookie_header()
    }

    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.inner.cell().jar.set_cookie_headers()
    }

    pub fn login_path(&self) -> &str {
        &self.inner.options.login_path
    }
}
