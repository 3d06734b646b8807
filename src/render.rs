//! Turns the ledger into display-ready strings.
//!
//! `render` is a pure function: the same summary, transactions and `now` always produce the same
//! `View`. How the view is drawn is up to the caller; `Display` gives a plain text table.

use crate::format::{format_balance, format_currency, format_signed_amount, relative_date_label};
use crate::ledger::Summary;
use crate::model::{Transaction, TransactionType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// Shown in place of the list when there are no transactions.
pub const EMPTY_MESSAGE: &str = "No transactions yet";

/// One transaction, formatted.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: i64,
    pub description: String,
    pub category: String,
    /// e.g. `-$42.50`
    pub amount: String,
    /// e.g. `Today at 2:05 PM`
    pub date: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

/// The formatted summary and rows, in ledger order.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub balance: String,
    pub income: String,
    pub expenses: String,
    pub rows: Vec<Row>,
    /// `Some` exactly when `rows` is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

/// Builds the view of `transactions` with dates labelled relative to `now`.
pub fn render(summary: &Summary, transactions: &[Transaction], now: NaiveDateTime) -> View {
    let rows: Vec<Row> = transactions
        .iter()
        .map(|t| Row {
            id: t.id(),
            description: t.description().to_string(),
            category: t.category().to_string(),
            amount: format_signed_amount(t),
            date: relative_date_label(t.date(), now),
            transaction_type: t.transaction_type(),
        })
        .collect();
    let empty_message = rows.is_empty().then(|| EMPTY_MESSAGE.to_string());
    View {
        balance: format_balance(summary.balance),
        income: format_currency(summary.income),
        expenses: format_currency(summary.expenses),
        rows,
        empty_message,
    }
}

impl Display for View {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Balance:  {}", self.balance)?;
        writeln!(f, "Income:   {}", self.income)?;
        writeln!(f, "Expenses: {}", self.expenses)?;
        writeln!(f)?;
        if let Some(message) = &self.empty_message {
            return writeln!(f, "{message}");
        }

        let cells: Vec<(Cow<'_, str>, Cow<'_, str>)> = self
            .rows
            .iter()
            .map(|r| (printable(&r.description), printable(&r.category)))
            .collect();
        let description_width = cells
            .iter()
            .map(|(description, _)| description.chars().count())
            .max()
            .unwrap_or(0)
            .max("Description".len());
        let category_width = cells
            .iter()
            .map(|(_, category)| category.chars().count())
            .max()
            .unwrap_or(0)
            .max("Category".len());

        writeln!(
            f,
            "{:<15} {:<description_width$} {:<category_width$} {:>14}  Date",
            "ID", "Description", "Category", "Amount"
        )?;
        for (row, (description, category)) in self.rows.iter().zip(&cells) {
            writeln!(
                f,
                "{:<15} {:<description_width$} {:<category_width$} {:>14}  {}",
                row.id, description, category, row.amount, row.date
            )?;
        }
        Ok(())
    }
}

/// Escapes control characters so that user text cannot break the table or drive the terminal.
fn printable(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTransaction;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn transaction(
        id: i64,
        description: &str,
        amount: &str,
        kind: TransactionType,
        date: &str,
    ) -> Transaction {
        let details = NewTransaction::parse(description, amount, "Food", kind, at(date)).unwrap();
        Transaction::new(id, details)
    }

    #[test]
    fn test_render_empty() {
        let view = render(&Summary::default(), &[], at("2026-10-17T12:00:00"));
        assert_eq!(view.balance, "$0.00");
        assert!(view.rows.is_empty());
        assert_eq!(view.empty_message.as_deref(), Some(EMPTY_MESSAGE));
        assert!(view.to_string().ends_with("No transactions yet\n"));
    }

    #[test]
    fn test_render_rows_in_order() {
        let transactions = vec![
            transaction(2, "Groceries", "42.50", TransactionType::Expense, "2026-10-17T10:15:00"),
            transaction(
                1,
                "Initial Balance",
                "18957.40",
                TransactionType::Income,
                "2026-01-06T00:00:00",
            ),
        ];
        let summary = Summary::of(&transactions);
        let view = render(&summary, &transactions, at("2026-10-17T12:00:00"));

        assert_eq!(view.balance, "$18,914.90");
        assert_eq!(view.income, "$18,957.40");
        assert_eq!(view.expenses, "$42.50");
        assert_eq!(view.empty_message, None);

        assert_eq!(view.rows[0].id, 2);
        assert_eq!(view.rows[0].amount, "-$42.50");
        assert_eq!(view.rows[0].date, "Today at 10:15 AM");
        assert_eq!(view.rows[1].amount, "+$18,957.40");
        assert_eq!(view.rows[1].date, "Jan 6 at 12:00 AM");

        let text = view.to_string();
        assert!(text.contains("Groceries"));
        assert!(text.find("Groceries").unwrap() < text.find("Initial Balance").unwrap());
    }

    #[test]
    fn test_render_negative_balance() {
        let summary = Summary {
            income: Decimal::ZERO,
            expenses: Decimal::from_str("12.5").unwrap(),
            balance: Decimal::from_str("-12.5").unwrap(),
        };
        let view = render(&summary, &[], at("2026-10-17T12:00:00"));
        assert_eq!(view.balance, "-$12.50");
        assert_eq!(view.expenses, "$12.50");
    }

    #[test]
    fn test_view_serializes_type_field() {
        let transactions = vec![transaction(
            7,
            "Bus",
            "2.75",
            TransactionType::Expense,
            "2026-10-16T08:00:00",
        )];
        let summary = Summary::of(&transactions);
        let view = render(&summary, &transactions, at("2026-10-17T12:00:00"));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["rows"][0]["type"], "expense");
        assert_eq!(json["rows"][0]["date"], "Yesterday at 8:00 AM");
        assert!(json.get("empty_message").is_none());
    }

    #[test]
    fn test_table_escapes_control_characters() {
        let details = NewTransaction::parse(
            "Rent\nPAID",
            "1200",
            "\u{1b}[31mHousing",
            TransactionType::Expense,
            at("2026-10-01T09:00:00"),
        )
        .unwrap();
        let transactions = vec![Transaction::new(3, details)];
        let summary = Summary::of(&transactions);
        let view = render(&summary, &transactions, at("2026-10-17T12:00:00"));

        // the structured view keeps the text as entered
        assert_eq!(view.rows[0].description, "Rent\nPAID");

        let text = view.to_string();
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("Rent\\nPAID"));
        assert!(text.contains("\\u{1b}[31mHousing"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[4].find("Date"), lines[5].find("Oct 1 at 9:00 AM"));
    }

    #[test]
    fn test_printable_leaves_plain_text_alone() {
        assert!(matches!(printable("Café ☕"), Cow::Borrowed("Café ☕")));
        assert_eq!(printable("a\tb\r"), "a\\tb\\r");
    }
}
