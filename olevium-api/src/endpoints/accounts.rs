use super::Amount;
use crate::macros::setter;
use crate::request::{EmptyResponse, Endpoint, RequestData};
use chrono::{DateTime, Utc};
use olevium_auth::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type", alias = "account_type")]
    pub account_type: AccountType,
    /// Current balance, including every posted transaction
    pub balance: Amount,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Savings => write!(f, "Savings"),
            Self::CreditCard => write!(f, "Credit card"),
            Self::Cash => write!(f, "Cash"),
            Self::Investment => write!(f, "Investment"),
            Self::Other => write!(f, "Other"),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

// Requests

#[derive(Debug, Clone, Default)]
pub struct ListAccounts;

impl Endpoint for ListAccounts {
    type Data = ();
    type Response = Vec<Account>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/accounts".into()
    }
}

#[derive(Debug, Clone)]
pub struct GetAccount {
    account_id: Uuid,
}

impl GetAccount {
    pub fn new(account_id: Uuid) -> Self {
        Self { account_id }
    }
}

impl Endpoint for GetAccount {
    type Data = ();
    type Response = Account;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/accounts/{}", self.account_id).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAccount {
    name: String,
    #[serde(rename = "type")]
    account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
}

impl CreateAccount {
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            balance: None,
            currency: None,
        }
    }

    setter!(opt balance: Amount);
    setter!(opt currency: String);
}

impl Endpoint for CreateAccount {
    type Data = Self;
    type Response = Account;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/accounts".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateAccount {
    #[serde(skip)]
    account_id: Uuid,
    #[serde(flatten)]
    account: AccountUpdate,
}

impl UpdateAccount {
    pub fn new(account_id: Uuid) -> Self {
        Self {
            account_id,
            account: AccountUpdate::default(),
        }
    }

    setter!(opt account.name: String);
    setter!(opt account.account_type: AccountType);
    setter!(opt account.currency: String);
    setter!(opt account.is_active: bool);
}

impl Endpoint for UpdateAccount {
    type Data = Self;
    type Response = Account;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/accounts/{}", self.account_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteAccount {
    account_id: Uuid,
}

impl DeleteAccount {
    pub fn new(account_id: Uuid) -> Self {
        Self { account_id }
    }
}

impl Endpoint for DeleteAccount {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/accounts/{}", self.account_id).into()
    }
}
