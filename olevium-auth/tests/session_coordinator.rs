use futures::future::join_all;
use olevium_auth::auth_client::{LOGOUT_PATH, REFRESH_PATH};
use olevium_auth::testing::{MockBackend, TEST_EMAIL, TEST_PASSWORD};
use olevium_auth::{
    ApiRequest, AuthError, CookieJar, CookiePolicy, SecretString, SessionManager, SessionOptions,
    SessionState, StatusCode, TokenPair,
};
use serde_json::json;
use std::time::Duration;

fn password() -> SecretString {
    SecretString::from(TEST_PASSWORD)
}

fn session_for(backend: &MockBackend) -> SessionManager<MockBackend> {
    SessionManager::new(backend.clone(), CookieJar::in_memory(), SessionOptions::default())
}

async fn logged_in(backend: &MockBackend) -> SessionManager<MockBackend> {
    let session = session_for(backend);
    session.login(TEST_EMAIL, &password()).await.unwrap();
    session
}

#[tokio::test]
async fn test_login_populates_tokens_cookies_and_user() {
    let backend = MockBackend::new();
    let session = session_for(&backend);
    assert_eq!(session.state(), SessionState::Anonymous);

    let result = session.login(TEST_EMAIL, &password()).await.unwrap();

    assert_eq!(result.tokens.access_token.as_deref(), Some("access-1"));
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.user().unwrap().email, TEST_EMAIL);

    let cookies = session.cookie_header().unwrap();
    assert!(cookies.contains("access_token=access-1"));
    assert!(cookies.contains("refresh_token=refresh-1"));
    assert!(cookies.contains("token_type=bearer"));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_authentication_error() {
    let backend = MockBackend::new();
    let session = session_for(&backend);

    let err = session
        .login(TEST_EMAIL, &SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        AuthError::Authentication("Incorrect email or password".to_string())
    );
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(session.session().is_none());
    assert!(session.cookie_header().is_none());
}

#[tokio::test]
async fn test_signup_replaces_cached_user() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    assert_eq!(session.user().unwrap().email, TEST_EMAIL);

    session
        .signup("bo@example.com", &SecretString::from("hunter22"), Some("Bo"))
        .await
        .unwrap();

    assert_eq!(session.user().unwrap().email, "bo@example.com");
    assert_eq!(session.access_token().as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_signup_with_taken_email_is_validation_error() {
    let backend = MockBackend::new();
    let session = session_for(&backend);

    let err = session
        .signup(TEST_EMAIL, &password(), None)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        AuthError::Validation("Email already registered".to_string())
    );
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.expire_access_token();

    let requests = (0..8).map(|_| session.send(ApiRequest::get("/accounts")));
    let responses = join_all(requests).await;

    for response in responses {
        assert_eq!(response.unwrap().status, StatusCode::OK);
    }
    assert_eq!(backend.refresh_count(), 1);

    let calls = backend.calls_to("/accounts");
    let retries: Vec<_> = calls.iter().filter(|call| call.retried).collect();
    assert_eq!(calls.len(), 16);
    assert_eq!(retries.len(), 8);
    assert!(retries
        .iter()
        .all(|call| call.bearer.as_deref() == Some("access-2")));
}

#[tokio::test]
async fn test_unauthorized_without_refresh_token_clears_session() {
    let backend = MockBackend::new();
    let mut jar = CookieJar::in_memory();
    jar.store_tokens(
        &TokenPair {
            access_token: Some("stale".to_string()),
            refresh_token: None,
            token_type: "bearer".to_string(),
        },
        &CookiePolicy::default(),
    )
    .unwrap();
    let session = SessionManager::new(backend.clone(), jar, SessionOptions::default());
    assert_eq!(session.state(), SessionState::Authenticated);

    let err = session.send(ApiRequest::get("/accounts")).await.unwrap_err();

    assert_eq!(
        err,
        AuthError::LoginRequired {
            redirect_to: "/login".to_string()
        }
    );
    assert!(err.requires_login());
    assert_eq!(backend.refresh_count(), 0);
    assert!(session.session().is_none());
    assert!(session.cookie_header().is_none());
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_refresh_updates_cookies_and_later_requests() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.expire_access_token();

    session.send(ApiRequest::get("/accounts")).await.unwrap();

    let cookies = session.cookie_header().unwrap();
    assert!(cookies.contains("access_token=access-2"));
    assert!(cookies.contains("refresh_token=refresh-2"));

    session.send(ApiRequest::get("/categories")).await.unwrap();
    let calls = backend.calls_to("/categories");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].bearer.as_deref(), Some("access-2"));
    assert_eq!(backend.refresh_count(), 1);
}

#[tokio::test]
async fn test_rejected_refresh_clears_session_without_retry() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.expire_access_token();
    backend.revoke_refresh_token();

    let err = session.send(ApiRequest::get("/accounts")).await.unwrap_err();

    assert!(err.requires_login());
    assert_eq!(backend.refresh_count(), 1);
    assert_eq!(backend.count("/accounts"), 1);
    assert!(session.session().is_none());
    assert!(session.cookie_header().is_none());
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_logout_clears_local_state_when_server_fails() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.fail_logout();

    let removals = session.logout().await;

    assert_eq!(removals.len(), 3);
    assert!(removals.iter().any(|h| h.starts_with("access_token=; Max-Age=0")));
    assert!(session.session().is_none());
    assert!(session.user().is_none());
    assert!(session.cookie_header().is_none());
    assert_eq!(session.state(), SessionState::Anonymous);

    let logout_calls = backend.calls_to(LOGOUT_PATH);
    assert_eq!(logout_calls.len(), 1);
    assert_eq!(logout_calls[0].bearer.as_deref(), Some("access-1"));
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_refresh_token() {
    let backend = MockBackend::new();
    backend.disable_refresh_rotation();
    let session = logged_in(&backend).await;

    let refreshed = session.refresh_session().await.unwrap();

    assert_eq!(refreshed.tokens.access_token.as_deref(), Some("access-2"));
    assert_eq!(refreshed.tokens.refresh_token.as_deref(), Some("refresh-1"));
    // The user summary from login survives a refresh that carries none
    assert_eq!(refreshed.user.unwrap().email, TEST_EMAIL);
}

#[tokio::test]
async fn test_refresh_without_refresh_token_fails_fast() {
    let backend = MockBackend::new();
    let session = session_for(&backend);

    let err = session.refresh_session().await.unwrap_err();

    assert!(matches!(err, AuthError::Authentication(_)));
    assert_eq!(backend.refresh_count(), 0);
}

#[tokio::test]
async fn test_overlapping_refresh_calls_are_single_flight() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;

    let results = join_all((0..5).map(|_| session.refresh_session())).await;

    assert_eq!(backend.refresh_count(), 1);
    for result in results {
        assert_eq!(
            result.unwrap().tokens.access_token.as_deref(),
            Some("access-2")
        );
    }
    assert!(!session.is_refreshing());
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_non_refreshable_request_never_refreshes() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.expire_access_token();

    let err = session
        .send(ApiRequest::get("/accounts").without_refresh())
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::Authentication("Not authenticated".to_string()));
    assert_eq!(backend.refresh_count(), 0);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_second_unauthorized_response_propagates() {
    let backend = MockBackend::new();
    backend.route(
        olevium_auth::Method::GET,
        "/admin",
        StatusCode::UNAUTHORIZED,
        json!({"detail": "Admins only"}),
    );
    let session = logged_in(&backend).await;

    let err = session.send(ApiRequest::get("/admin")).await.unwrap_err();

    assert!(matches!(err, AuthError::Authentication(msg) if msg.contains("Admins only")));
    assert_eq!(backend.refresh_count(), 1);
    assert_eq!(backend.count("/admin"), 2);
    // One failed replay does not end the session
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_logout_during_refresh_does_not_restore_tokens() {
    let backend = MockBackend::new();
    backend.set_refresh_delay(Duration::from_millis(50));
    let session = logged_in(&backend).await;

    let (refresh, _) = tokio::join!(session.refresh_session(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.logout().await
    });

    assert!(matches!(refresh, Err(AuthError::Authentication(_))));
    assert!(session.session().is_none());
    assert!(session.cookie_header().is_none());
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_unreachable_refresh_clears_session_and_requires_login() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.expire_access_token();
    backend.make_refresh_unreachable();

    let err = session.send(ApiRequest::get("/accounts")).await.unwrap_err();

    assert!(err.requires_login(), "unexpected error: {:?}", err);
    assert_eq!(backend.refresh_count(), 1);
    assert_eq!(backend.count("/accounts"), 1);
    assert!(session.session().is_none());
    assert!(session.cookie_header().is_none());
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_refresh_server_error_clears_session_and_requires_login() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.expire_access_token();
    backend.fail_refresh_with(StatusCode::SERVICE_UNAVAILABLE);

    let results = join_all((0..3).map(|_| session.send(ApiRequest::get("/accounts")))).await;

    assert_eq!(backend.refresh_count(), 1);
    for result in results {
        assert!(result.unwrap_err().requires_login());
    }
    assert!(session.session().is_none());
    assert!(session.cookie_header().is_none());
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_direct_refresh_reports_failure_class() {
    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.fail_refresh_with(StatusCode::BAD_GATEWAY);

    let err = session.refresh_session().await.unwrap_err();

    assert!(matches!(err, AuthError::Api { status: 502, .. }));
    assert!(session.session().is_none());

    let backend = MockBackend::new();
    let session = logged_in(&backend).await;
    backend.make_refresh_unreachable();

    let err = session.refresh_session().await.unwrap_err();

    assert!(matches!(err, AuthError::Network(_)));
    assert!(session.session().is_none());
}

#[tokio::test]
async fn test_login_during_refresh_replays_with_new_session() {
    let backend = MockBackend::new();
    backend.set_refresh_delay(Duration::from_millis(50));
    let session = logged_in(&backend).await;
    backend.expire_access_token();

    let (response, login) = tokio::join!(session.send(ApiRequest::get("/accounts")), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.login(TEST_EMAIL, &password()).await
    });

    login.unwrap();
    assert_eq!(response.unwrap().status, StatusCode::OK);
    let calls = backend.calls_to("/accounts");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].bearer.as_deref(), Some("access-1"));
    assert_eq!(calls[1].bearer.as_deref(), Some("access-2"));
    assert_eq!(session.access_token().as_deref(), Some("access-2"));
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_abandoned_refresh_does_not_keep_session_alive() {
    let backend = MockBackend::new();
    backend.set_refresh_delay(Duration::from_secs(60));
    let session = logged_in(&backend).await;
    backend.expire_access_token();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(20),
        session.send(ApiRequest::get("/accounts")),
    )
    .await;

    assert!(timed_out.is_err());
    assert!(session.is_refreshing());
    assert_eq!(backend.handle_count(), 2);

    drop(session);
    assert_eq!(backend.handle_count(), 1);
}

#[tokio::test]
async fn test_state_changes_are_observable() {
    let backend = MockBackend::new();
    let session = session_for(&backend);
    let mut states = session.subscribe();

    session.login(TEST_EMAIL, &password()).await.unwrap();
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), SessionState::Authenticated);

    backend.revoke_refresh_token();
    let _ = session.refresh_session().await;
    assert_eq!(*states.borrow_and_update(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_session_survives_restart_through_cookie_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookies.json");
    let backend = MockBackend::new();

    {
        let session = SessionManager::new(
            backend.clone(),
            CookieJar::open(&path).unwrap(),
            SessionOptions::default(),
        );
        session.login(TEST_EMAIL, &password()).await.unwrap();
    }

    let restored = SessionManager::new(
        backend.clone(),
        CookieJar::open(&path).unwrap(),
        SessionOptions::default(),
    );
    assert!(restored.is_authenticated());
    assert_eq!(restored.state(), SessionState::Authenticated);

    restored.send(ApiRequest::get("/dashboard/summary")).await.unwrap();
    assert_eq!(
        backend.calls_to("/dashboard/summary")[0].bearer.as_deref(),
        Some("access-1")
    );
    assert_eq!(backend.calls_to(REFRESH_PATH).len(), 0);
}
