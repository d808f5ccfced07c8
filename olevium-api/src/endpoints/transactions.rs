use super::{Amount, TransactionKind};
use crate::macros::setter;
use crate::request::{EmptyResponse, Endpoint, RequestData};
use chrono::{DateTime, NaiveDate, Utc};
use olevium_auth::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

// Common

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: TransactionKind,
    /// Always positive; the direction comes from `kind`
    pub amount: Amount,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    /// Destination account of a transfer
    #[serde(default)]
    pub to_account_id: Option<Uuid>,
    #[serde(default)]
    pub recurring_transaction_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Amount as it affects the source account balance
    pub fn signed_amount(&self) -> Amount {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense | TransactionKind::Transfer => -self.amount,
        }
    }

    pub fn is_transfer(&self) -> bool {
        self.kind == TransactionKind::Transfer
    }
}

impl PartialOrd for Transaction {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Transaction {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .date
            .cmp(&self.date)
            .then(self.amount.cmp(&other.amount))
            .then(self.id.cmp(&other.id))
    }
}

// Requests

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListTransactions {
    filter: TransactionFilter,
}

impl ListTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt filter.account_id: Uuid);
    setter!(opt filter.category_id: Uuid);
    setter!(opt filter.kind: TransactionKind);
    setter!(opt filter.start_date: NaiveDate);
    setter!(opt filter.end_date: NaiveDate);
    setter!(opt filter.skip: u32);
    setter!(opt filter.limit: u32);

    /// Restrict to transactions dated within `from..=to`
    pub fn between(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.start_date(from).end_date(to)
    }
}

impl Endpoint for ListTransactions {
    type Data = TransactionFilter;
    type Response = Vec<Transaction>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/transactions".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        if self.filter.is_empty() {
            RequestData::Empty
        } else {
            RequestData::Query(&self.filter)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Amount,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTransaction {
    #[serde(flatten)]
    transaction: NewTransaction,
}

impl CreateTransaction {
    pub fn new<T>(account_id: Uuid, kind: TransactionKind, amount: T, date: NaiveDate) -> Self
    where
        T: Into<Amount>,
    {
        Self {
            transaction: NewTransaction {
                account_id,
                kind,
                amount: amount.into(),
                date,
                category_id: None,
                description: None,
                notes: None,
                to_account_id: None,
            },
        }
    }

    setter!(opt transaction.category_id: Uuid);
    setter!(opt transaction.description: String);
    setter!(opt transaction.notes: String);
    setter!(opt transaction.to_account_id: Uuid);
}

impl Endpoint for CreateTransaction {
    type Data = Self;
    type Response = Transaction;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/transactions".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTransaction {
    #[serde(skip)]
    transaction_id: Uuid,
    #[serde(flatten)]
    transaction: TransactionUpdate,
}

impl UpdateTransaction {
    pub fn new(transaction_id: Uuid) -> Self {
        Self {
            transaction_id,
            transaction: TransactionUpdate::default(),
        }
    }

    setter!(opt transaction.account_id: Uuid);
    setter!(opt transaction.category_id: Uuid);
    setter!(opt transaction.kind: TransactionKind);
    setter!(opt transaction.amount: Amount);
    setter!(opt transaction.date: NaiveDate);
    setter!(opt transaction.description: String);
    setter!(opt transaction.notes: String);
}

impl Endpoint for UpdateTransaction {
    type Data = Self;
    type Response = Transaction;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/transactions/{}", self.transaction_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteTransaction {
    transaction_id: Uuid,
}

impl DeleteTransaction {
    pub fn new(transaction_id: Uuid) -> Self {
        Self { transaction_id }
    }
}

impl Endpoint for DeleteTransaction {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/transactions/{}", self.transaction_id).into()
    }
}
