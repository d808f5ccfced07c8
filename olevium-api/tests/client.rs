use chrono::NaiveDate;
use olevium_api::endpoints::{Amount, TransactionKind, accounts::AccountType};
use olevium_api::{ApiError, Client, EmptyResponse, Request};
use olevium_auth::testing::{MockBackend, TEST_EMAIL, TEST_PASSWORD};
use olevium_auth::{
    CookieJar, Method, SecretString, SessionManager, SessionOptions, SessionState, StatusCode,
};
use serde_json::json;
use uuid::Uuid;

const ACCOUNT_ID: &str = "8a4c8d0e-4c53-4a0b-9a5e-0b8c7f3d1e21";

async fn client_for(backend: &MockBackend) -> Client<MockBackend> {
    let session = SessionManager::new(backend.clone(), CookieJar::in_memory(), SessionOptions::default());
    session
        .login(TEST_EMAIL, &SecretString::from(TEST_PASSWORD))
        .await
        .unwrap();
    Client::new(session)
}

fn stub_accounts(backend: &MockBackend) {
    backend.route(
        Method::GET,
        "/accounts",
        StatusCode::OK,
        json!([
            {"id": ACCOUNT_ID, "name": "Checking", "type": "checking", "balance": 1520.25},
            {"id": Uuid::nil(), "name": "Visa", "type": "credit_card", "balance": "-310.00", "currency": "EUR"}
        ]),
    );
}

#[tokio::test]
async fn test_list_accounts() {
    let backend = MockBackend::new();
    stub_accounts(&backend);
    let client = client_for(&backend).await;

    let accounts = client.send(Request::accounts().list()).await.unwrap();

    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].name, "Checking");
    assert_eq!(accounts[0].balance, Amount::from_cents(152025));
    assert_eq!(accounts[1].account_type, AccountType::CreditCard);
    assert_eq!(accounts[1].currency, "EUR");
    assert!(accounts[1].balance.is_negative());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_transparently() {
    let backend = MockBackend::new();
    stub_accounts(&backend);
    let client = client_for(&backend).await;
    backend.expire_access_token();

    let accounts = client.send(Request::accounts().list()).await.unwrap();

    assert_eq!(accounts.len(), 2);
    assert_eq!(backend.refresh_count(), 1);
    assert_eq!(client.session().access_token().as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_rejected_refresh_requires_login() {
    let backend = MockBackend::new();
    let client = client_for(&backend).await;
    backend.expire_access_token();
    backend.revoke_refresh_token();

    let err = client.send(Request::categories().list()).await.unwrap_err();

    assert!(err.requires_login());
    assert_eq!(client.session().state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_missing_resource_is_not_found() {
    let backend = MockBackend::new();
    let id: Uuid = ACCOUNT_ID.parse().unwrap();
    backend.route(
        Method::GET,
        &format!("/accounts/{}", id),
        StatusCode::NOT_FOUND,
        json!({"detail": "Account not found"}),
    );
    let client = client_for(&backend).await;

    let err = client.send(Request::accounts().get(id)).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(msg) if msg == "Account not found"));
}

#[tokio::test]
async fn test_validation_errors_are_joined() {
    let backend = MockBackend::new();
    backend.route(
        Method::POST,
        "/transactions",
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({"detail": [
            {"loc": ["body", "amount"], "msg": "Input should be greater than 0"},
            {"loc": ["body", "date"], "msg": "Field required"}
        ]}),
    );
    let client = client_for(&backend).await;

    let request = Request::transactions().create(
        Uuid::nil(),
        TransactionKind::Expense,
        Amount::ZERO,
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
    );
    let err = client.send(request).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Validation error: Input should be greater than 0; Field required"
    );
}

#[tokio::test]
async fn test_create_transaction_sends_json_body() {
    let backend = MockBackend::new();
    let account_id: Uuid = ACCOUNT_ID.parse().unwrap();
    let created = json!({
        "id": Uuid::nil(),
        "account_id": account_id,
        "type": "expense",
        "amount": 18.4,
        "description": "Lunch",
        "date": "2024-07-02"
    });
    backend.route(Method::POST, "/transactions", StatusCode::CREATED, created);
    let client = client_for(&backend).await;

    let request = Request::transactions()
        .create(
            account_id,
            TransactionKind::Expense,
            Amount::from_cents(1840),
            NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
        )
        .description("Lunch");
    let transaction = client.send(request).await.unwrap();

    assert_eq!(transaction.signed_amount(), Amount::from_cents(-1840));
    let calls = backend.calls_to("/transactions");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(calls[0].bearer.as_deref(), Some("access-1"));
    assert_eq!(
        calls[0].body,
        Some(json!({
            "account_id": account_id,
            "type": "expense",
            "amount": 18.4,
            "date": "2024-07-02",
            "description": "Lunch"
        }))
    );
}

#[tokio::test]
async fn test_delete_accepts_empty_response() {
    let backend = MockBackend::new();
    let id = Uuid::nil();
    backend.route(
        Method::DELETE,
        &format!("/recurring-transactions/{}", id),
        StatusCode::NO_CONTENT,
        serde_json::Value::Null,
    );
    let client = client_for(&backend).await;

    let response = client.send(Request::recurring().delete(id)).await.unwrap();

    assert_eq!(response, EmptyResponse);
}

#[tokio::test]
async fn test_dashboard_summary() {
    let backend = MockBackend::new();
    backend.route(
        Method::GET,
        "/dashboard/summary",
        StatusCode::OK,
        json!({
            "total_balance": 2500,
            "income": 3200,
            "expenses": 2400,
            "month": "2024-06",
            "accounts": [{"id": ACCOUNT_ID, "name": "Checking", "balance": 2500}],
            "spending_by_category": [{"name": "Rent", "amount": 1400}]
        }),
    );
    let client = client_for(&backend).await;

    let summary = client
        .send(Request::dashboard().summary(Some("2024-06".parse().unwrap())))
        .await
        .unwrap();

    assert_eq!(summary.net_cash_flow(), Amount::from_cents(80000));
    assert_eq!(summary.savings_rate(), Some(25.0));
    assert_eq!(summary.month.map(|m| m.to_string()).as_deref(), Some("2024-06"));
    assert_eq!(summary.accounts[0].balance, Amount::from_cents(250000));
}

#[tokio::test]
async fn test_server_error_keeps_session() {
    let backend = MockBackend::new();
    backend.route(
        Method::GET,
        "/recurring-transactions",
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"message": "Maintenance window"}),
    );
    let client = client_for(&backend).await;

    let err = client.send(Request::recurring().list()).await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Server(status, ref msg)
            if status == StatusCode::SERVICE_UNAVAILABLE && msg == "Maintenance window"
    ));
    assert!(client.session().is_authenticated());
}
