use super::{Amount, TransactionKind};
use crate::macros::setter;
use crate::request::{EmptyResponse, Endpoint, RequestData};
use chrono::{Days, Months, NaiveDate};
use olevium_auth::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

// Common

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: TransactionKind,
    pub amount: Amount,
    #[serde(default)]
    pub description: Option<String>,
    pub frequency: Frequency,
    /// Every `interval` periods, e.g. 2 with `Weekly` means fortnightly
    #[serde(default = "default_interval")]
    pub interval: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_interval() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl RecurringTransaction {
    /// Date of the `n`th occurrence counted from `start_date`.
    ///
    /// Offsets are always applied to the start date, so a schedule starting on
    /// the 31st lands on the last day of shorter months and returns to the 31st
    /// afterwards.
    fn nth_occurrence(&self, n: u32) -> Option<NaiveDate> {
        let steps = n.checked_mul(self.interval.max(1))?;
        let date = match self.frequency {
            Frequency::Daily => self.start_date.checked_add_days(Days::new(steps.into())),
            Frequency::Weekly => self
                .start_date
                .checked_add_days(Days::new(u64::from(steps) * 7)),
            Frequency::Monthly => self.start_date.checked_add_months(Months::new(steps)),
            Frequency::Yearly => self
                .start_date
                .checked_add_months(Months::new(steps.checked_mul(12)?)),
        }?;

        match self.end_date {
            Some(end) if date > end => None,
            _ => Some(date),
        }
    }

    /// Every scheduled date within `from..=to`, in order
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        if !self.is_active || from > to {
            return Vec::new();
        }

        (0..)
            .map_while(|n| self.nth_occurrence(n))
            .take_while(|date| *date <= to)
            .filter(|date| *date >= from)
            .collect()
    }

    /// First scheduled date strictly after `after`
    pub fn next_occurrence(&self, after: NaiveDate) -> Option<NaiveDate> {
        if !self.is_active {
            return None;
        }

        (0..)
            .map_while(|n| self.nth_occurrence(n))
            .find(|date| *date > after)
    }
}

// Requests

#[derive(Debug, Clone, Default)]
pub struct ListRecurringTransactions;

impl Endpoint for ListRecurringTransactions {
    type Data = ();
    type Response = Vec<RecurringTransaction>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/recurring-transactions".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRecurringTransaction {
    account_id: Uuid,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Amount,
    frequency: Frequency,
    interval: u32,
    start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl CreateRecurringTransaction {
    pub fn new<T>(
        account_id: Uuid,
        kind: TransactionKind,
        amount: T,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self
    where
        T: Into<Amount>,
    {
        Self {
            account_id,
            kind,
            amount: amount.into(),
            frequency,
            interval: 1,
            start_date,
            end_date: None,
            category_id: None,
            description: None,
        }
    }

    setter!(interval: u32);
    setter!(opt end_date: NaiveDate);
    setter!(opt category_id: Uuid);
    setter!(opt description: String);
}

impl Endpoint for CreateRecurringTransaction {
    type Data = Self;
    type Response = RecurringTransaction;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/recurring-transactions".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecurringUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRecurringTransaction {
    #[serde(skip)]
    recurring_id: Uuid,
    #[serde(flatten)]
    recurring: RecurringUpdate,
}

impl UpdateRecurringTransaction {
    pub fn new(recurring_id: Uuid) -> Self {
        Self {
            recurring_id,
            recurring: RecurringUpdate::default(),
        }
    }

    setter!(opt recurring.amount: Amount);
    setter!(opt recurring.frequency: Frequency);
    setter!(opt recurring.interval: u32);
    setter!(opt recurring.end_date: NaiveDate);
    setter!(opt recurring.description: String);
    setter!(opt recurring.is_active: bool);
}

impl Endpoint for UpdateRecurringTransaction {
    type Data = Self;
    type Response = RecurringTransaction;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/recurring-transactions/{}", self.recurring_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteRecurringTransaction {
    recurring_id: Uuid,
}

impl DeleteRecurringTransaction {
    pub fn new(recurring_id: Uuid) -> Self {
        Self { recurring_id }
    }
}

impl Endpoint for DeleteRecurringTransaction {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/recurring-transactions/{}", self.recurring_id).into()
    }
}
