use super::{Amount, Month, transactions::Transaction};
use crate::macros::setter;
use crate::request::{Endpoint, RequestData};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Sum of all active account balances
    pub total_balance: Amount,
    #[serde(alias = "monthly_income")]
    pub income: Amount,
    #[serde(alias = "monthly_expenses")]
    pub expenses: Amount,
    #[serde(default)]
    pub month: Option<Month>,
    #[serde(default)]
    pub accounts: Vec<AccountBalance>,
    #[serde(default)]
    pub spending_by_category: Vec<CategorySpending>,
    #[serde(default)]
    pub recent_transactions: Vec<Transaction>,
}

impl DashboardSummary {
    pub fn net_cash_flow(&self) -> Amount {
        self.income - self.expenses
    }

    /// Share of income kept this month, in percent. `None` without income.
    pub fn savings_rate(&self) -> Option<f64> {
        if !self.income.is_positive() {
            return None;
        }
        Some(self.net_cash_flow().cents() as f64 * 100.0 / self.income.cents() as f64)
    }

    /// Categories ordered by amount spent, largest first
    pub fn top_categories(&self, n: usize) -> Vec<&CategorySpending> {
        let mut categories: Vec<&CategorySpending> = self.spending_by_category.iter().collect();
        categories.sort_by(|a, b| b.amount.cmp(&a.amount));
        categories.truncate(n);
        categories
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub id: Uuid,
    pub name: String,
    pub balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(alias = "category_name")]
    pub name: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetDashboardSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<Month>,
}

impl GetDashboardSummary {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt month: Month);
}

impl Endpoint for GetDashboardSummary {
    type Data = Self;
    type Response = DashboardSummary;

    fn endpoint(&self) -> Cow<'_, str> {
        "/dashboard/summary".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        match self.month {
            Some(_) => RequestData::Query(self),
            None => RequestData::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary() -> DashboardSummary {
        serde_json::from_value(json!({
            "total_balance": 5230.10,
            "monthly_income": 4000,
            "monthly_expenses": "3100.00",
            "spending_by_category": [
                {"category_name": "Rent", "amount": 1800},
                {"category_name": "Dining", "amount": 240.5},
                {"category_name": "Groceries", "amount": 610}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn derived_figures() {
        let summary = summary();
        assert_eq!(summary.net_cash_flow(), Amount::from_cents(90000));
        assert_eq!(summary.savings_rate(), Some(22.5));
        assert!(summary.recent_transactions.is_empty());
    }

    #[test]
    fn top_categories_by_amount() {
        let summary = summary();
        let names: Vec<&str> = summary
            .top_categories(2)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["Rent", "Groceries"]);
    }

    #[test]
    fn savings_rate_without_income() {
        let mut summary = summary();
        summary.income = Amount::ZERO;
        assert_eq!(summary.savings_rate(), None);
    }

    #[test]
    fn month_query() {
        let request = GetDashboardSummary::new().month("2024-06".parse::<Month>().unwrap());
        let RequestData::Query(query) = request.data() else {
            panic!("expected query data");
        };
        assert_eq!(serde_json::to_value(query).unwrap(), json!({"month": "2024-06"}));
    }
}
