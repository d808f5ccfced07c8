//! Plain-text reports for each command.

use chrono::NaiveDate;
use olevium_api::endpoints::{
    Amount, accounts::Account, categories::Category, dashboard::DashboardSummary,
    recurring::RecurringTransaction, transactions::Transaction,
};
use olevium_auth::{SessionManager, Transport};
use std::io::{self, Write};

const TOP_CATEGORIES: usize = 5;

pub fn write_status<W: Write, T: Transport>(out: &mut W, session: &SessionManager<T>) -> io::Result<()> {
    let Some(current) = session.session() else {
        return writeln!(out, "Not signed in");
    };

    match &current.user {
        Some(user) => writeln!(out, "Signed in as {} <{}>", user.display_name(), user.email)?,
        None => writeln!(out, "Signed in")?,
    }
    writeln!(out, "Session: {}", session.state())?;
    if current.tokens.access_token.is_none() {
        writeln!(out, "Access token expired, it will be renewed on the next request")?;
    }
    Ok(())
}

pub fn write_accounts<W: Write>(out: &mut W, accounts: &[Account]) -> io::Result<()> {
    if accounts.is_empty() {
        return writeln!(out, "No accounts yet");
    }

    writeln!(out, "{:<28} {:<12} {:>14}", "Account", "Type", "Balance")?;
    for account in accounts {
        let name = if account.is_active {
            account.name.clone()
        } else {
            format!("{} (closed)", account.name)
        };
        writeln!(
            out,
            "{:<28} {:<12} {:>10} {}",
            truncate(&name, 28),
            account.account_type.to_string(),
            account.balance.to_string(),
            account.currency
        )?;
    }

    let total: Amount = accounts
        .iter()
        .filter(|account| account.is_active)
        .map(|account| account.balance)
        .sum();
    writeln!(out, "{:<41} {:>10}", "Total", total.to_string())
}

pub fn write_categories<W: Write>(out: &mut W, categories: &[Category]) -> io::Result<()> {
    if categories.is_empty() {
        return writeln!(out, "No categories");
    }

    for category in categories {
        let indent = if category.is_subcategory() { "  " } else { "" };
        writeln!(out, "{}{:<30} {}", indent, category.name, category.kind)?;
    }
    Ok(())
}

pub fn write_transactions<W: Write>(out: &mut W, transactions: &[Transaction]) -> io::Result<()> {
    if transactions.is_empty() {
        return writeln!(out, "No transactions");
    }

    writeln!(out, "{:<10}  {:<32} {:>12}", "Date", "Description", "Amount")?;
    for transaction in transactions {
        let description = transaction
            .description
            .as_deref()
            .unwrap_or(if transaction.is_transfer() { "Transfer" } else { "-" });
        writeln!(
            out,
            "{:<10}  {:<32} {:>12}",
            transaction.date.to_string(),
            truncate(description, 32),
            transaction.signed_amount().to_string()
        )?;
    }
    Ok(())
}

pub fn write_recurring<W: Write>(
    out: &mut W,
    recurring: &[RecurringTransaction],
    today: NaiveDate,
) -> io::Result<()> {
    if recurring.is_empty() {
        return writeln!(out, "No recurring transactions");
    }

    writeln!(
        out,
        "{:<28} {:>10}  {:<14} {}",
        "Description", "Amount", "Repeats", "Next"
    )?;
    for item in recurring {
        let repeats = match item.interval {
            0 | 1 => item.frequency.to_string(),
            n => format!("every {} ({})", n, item.frequency),
        };
        // Occurrences due today are still upcoming
        let next = match today.pred_opt().and_then(|day| item.next_occurrence(day)) {
            Some(date) => date.to_string(),
            None if !item.is_active => "paused".to_string(),
            None => "ended".to_string(),
        };
        writeln!(
            out,
            "{:<28} {:>10}  {:<14} {}",
            truncate(item.description.as_deref().unwrap_or("-"), 28),
            item.amount.to_string(),
            repeats,
            next
        )?;
    }
    Ok(())
}

pub fn write_dashboard<W: Write>(out: &mut W, summary: &DashboardSummary) -> io::Result<()> {
    if let Some(month) = summary.month {
        writeln!(out, "Summary for {}", month)?;
    }
    writeln!(out, "Total balance: {:>12}", summary.total_balance.to_string())?;
    writeln!(out, "Income:        {:>12}", summary.income.to_string())?;
    writeln!(out, "Expenses:      {:>12}", summary.expenses.to_string())?;
    writeln!(out, "Net:           {:>12}", summary.net_cash_flow().to_string())?;
    if let Some(rate) = summary.savings_rate() {
        writeln!(out, "Savings rate:  {:>11.1}%", rate)?;
    }

    let top = summary.top_categories(TOP_CATEGORIES);
    if !top.is_empty() {
        writeln!(out)?;
        writeln!(out, "Top spending")?;
        for category in top {
            writeln!(out, "  {:<26} {:>12}", truncate(&category.name, 26), category.amount.to_string())?;
        }
    }

    if !summary.recent_transactions.is_empty() {
        writeln!(out)?;
        writeln!(out, "Recent transactions")?;
        let mut recent = summary.recent_transactions.clone();
        recent.sort();
        write_transactions(out, &recent)?;
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use olevium_api::endpoints::{TransactionKind, accounts::AccountType, recurring::Frequency};
    use uuid::Uuid;

    fn render(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn account(name: &str, cents: i64, is_active: bool) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            account_type: AccountType::Checking,
            balance: Amount::from_cents(cents),
            currency: "USD".to_string(),
            is_active,
            created_at: None,
        }
    }

    #[test]
    fn accounts_total_skips_closed_accounts() {
        let accounts = [account("Checking", 120050, true), account("Old savings", 999, false)];
        let text = render(|out| write_accounts(out, &accounts));

        assert!(text.contains("Old savings (closed)"));
        let total = text.lines().last().unwrap();
        assert!(total.starts_with("Total"));
        assert!(total.ends_with("1200.50"));
    }

    #[test]
    fn empty_lists() {
        assert_eq!(render(|out| write_accounts(out, &[])), "No accounts yet\n");
        assert_eq!(render(|out| write_transactions(out, &[])), "No transactions\n");
    }

    #[test]
    fn recurring_shows_next_date() {
        let rent = RecurringTransaction {
            id: Uuid::nil(),
            account_id: Uuid::nil(),
            category_id: None,
            kind: TransactionKind::Expense,
            amount: Amount::from_cents(150000),
            description: Some("Rent".to_string()),
            frequency: Frequency::Monthly,
            interval: 1,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            end_date: None,
            is_active: true,
        };
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let text = render(|out| write_recurring(out, std::slice::from_ref(&rent), today));
        assert!(text.contains("2024-02-29"));

        let due_today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let text = render(|out| write_recurring(out, std::slice::from_ref(&rent), due_today));
        assert!(text.contains("2024-02-29"));
    }

    #[test]
    fn truncates_long_text() {
        assert_eq!(truncate("Groceries", 5), "Groc…");
        assert_eq!(truncate("Rent", 5), "Rent");
    }
}
