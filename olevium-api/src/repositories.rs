use crate::endpoints::{
    Amount, Month, TransactionKind,
    accounts::{AccountType, CreateAccount, DeleteAccount, GetAccount, ListAccounts, UpdateAccount},
    categories::{CreateCategory, DeleteCategory, ListCategories, UpdateCategory},
    dashboard::GetDashboardSummary,
    recurring::{
        CreateRecurringTransaction, DeleteRecurringTransaction, Frequency,
        ListRecurringTransactions, UpdateRecurringTransaction,
    },
    transactions::{CreateTransaction, DeleteTransaction, ListTransactions, UpdateTransaction},
};
use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Default)]
pub struct AccountRepository;

impl AccountRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self) -> ListAccounts {
        ListAccounts
    }

    pub fn get(&self, account_id: Uuid) -> GetAccount {
        GetAccount::new(account_id)
    }

    pub fn create(&self, name: impl Into<String>, account_type: AccountType) -> CreateAccount {
        CreateAccount::new(name, account_type)
    }

    pub fn update(&self, account_id: Uuid) -> UpdateAccount {
        UpdateAccount::new(account_id)
    }

    pub fn delete(&self, account_id: Uuid) -> DeleteAccount {
        DeleteAccount::new(account_id)
    }
}

#[derive(Default)]
pub struct CategoryRepository {
    kind: Option<TransactionKind>,
}

impl CategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn list(&self) -> ListCategories {
        match self.kind {
            Some(kind) => ListCategories::new().kind(kind),
            None => ListCategories::new(),
        }
    }

    pub fn create(&self, name: impl Into<String>, kind: TransactionKind) -> CreateCategory {
        CreateCategory::new(name, kind)
    }

    pub fn update(&self, category_id: Uuid) -> UpdateCategory {
        UpdateCategory::new(category_id)
    }

    pub fn delete(&self, category_id: Uuid) -> DeleteCategory {
        DeleteCategory::new(category_id)
    }
}

#[derive(Default)]
pub struct TransactionRepository {
    account_id: Option<Uuid>,
}

impl TransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn list(&self) -> ListTransactions {
        match self.account_id {
            Some(account_id) => ListTransactions::new().account_id(account_id),
            None => ListTransactions::new(),
        }
    }

    pub fn create(
        &self,
        account_id: Uuid,
        kind: TransactionKind,
        amount: Amount,
        date: NaiveDate,
    ) -> CreateTransaction {
        CreateTransaction::new(account_id, kind, amount, date)
    }

    pub fn update(&self, transaction_id: Uuid) -> UpdateTransaction {
        UpdateTransaction::new(transaction_id)
    }

    pub fn delete(&self, transaction_id: Uuid) -> DeleteTransaction {
        DeleteTransaction::new(transaction_id)
    }
}

#[derive(Default)]
pub struct RecurringRepository;

impl RecurringRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self) -> ListRecurringTransactions {
        ListRecurringTransactions
    }

    pub fn create(
        &self,
        account_id: Uuid,
        kind: TransactionKind,
        amount: Amount,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> CreateRecurringTransaction {
        CreateRecurringTransaction::new(account_id, kind, amount, frequency, start_date)
    }

    pub fn update(&self, recurring_id: Uuid) -> UpdateRecurringTransaction {
        UpdateRecurringTransaction::new(recurring_id)
    }

    pub fn delete(&self, recurring_id: Uuid) -> DeleteRecurringTransaction {
        DeleteRecurringTransaction::new(recurring_id)
    }
}

#[derive(Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn summary(&self, month: Option<Month>) -> GetDashboardSummary {
        match month {
            Some(month) => GetDashboardSummary::new().month(month),
            None => GetDashboardSummary::new(),
        }
    }
}
