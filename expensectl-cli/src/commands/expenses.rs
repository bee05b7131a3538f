//! Expense commands - thin wrappers over `ExpenseRepo`
//!
//! Import files are JSON arrays:
//!   [{ "expenseID": "1d", "title": "First expense", "amount": 3.5, "date": "2024-03-09T18:30:00Z" }]

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use expensectl_core::{Backend, ConnectionProvider, Expense, ExpenseRepo};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// External identifier used for lookups and deletes
    #[arg(long = "id", value_name = "EXPENSE_ID")]
    pub expense_id: String,

    #[arg(long)]
    pub title: String,

    #[arg(long, allow_negative_numbers = true)]
    pub amount: f64,

    /// RFC 3339 timestamp (default: now)
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// JSON file containing an array of expenses
    #[arg(value_name = "PATH")]
    pub input: PathBuf,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    #[arg(value_name = "EXPENSE_ID")]
    pub expense_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    #[arg(value_name = "EXPENSE_ID")]
    pub expense_id: String,
}

#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Confirm deletion of every stored expense
    #[arg(long)]
    pub yes: bool,
}

/// One entry of an import file.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    #[serde(rename = "expenseID")]
    expense_id: String,
    title: String,
    amount: f64,
    date: DateTime<Utc>,
}

impl From<ImportRecord> for Expense {
    fn from(record: ImportRecord) -> Self {
        Expense::new(record.expense_id, record.title, record.amount, record.date)
    }
}

/// JSON rendering of a stored expense.
#[derive(Debug, Serialize)]
struct ExpenseView<'a> {
    id: Option<String>,
    #[serde(rename = "expenseID")]
    expense_id: &'a str,
    title: &'a str,
    amount: f64,
    date: String,
}

impl<'a> From<&'a Expense> for ExpenseView<'a> {
    fn from(expense: &'a Expense) -> Self {
        Self {
            id: expense.id.map(|oid| oid.to_hex()),
            expense_id: &expense.expense_id,
            title: &expense.title,
            amount: expense.amount,
            date: expense.date.to_rfc3339(),
        }
    }
}

fn parse_import(content: &str) -> Result<Vec<Expense>> {
    let records: Vec<ImportRecord> =
        serde_json::from_str(content).context("Import file must be a JSON array of expenses")?;
    Ok(records.into_iter().map(Expense::from).collect())
}

fn format_line(expense: &Expense) -> String {
    format!(
        "{:<12} {:>10.2}  {}  {}",
        expense.expense_id,
        expense.amount,
        expense.date.format("%Y-%m-%d %H:%M"),
        expense.title
    )
}

pub async fn run_ping<B: Backend>(provider: &ConnectionProvider<B>) -> Result<()> {
    provider
        .acquire()
        .await
        .with_context(|| format!("Could not reach {}", provider.endpoint()))?;
    println!("ok: {}", provider.endpoint());
    Ok(())
}

pub async fn run_add<B: Backend>(provider: &ConnectionProvider<B>, args: AddArgs) -> Result<()> {
    let expense = Expense::new(
        args.expense_id,
        args.title,
        args.amount,
        args.date.unwrap_or_else(Utc::now),
    );

    ExpenseRepo::new(provider)
        .create(&expense)
        .await
        .context("Failed to store expense")?;

    println!("Stored {}", expense.expense_id);
    Ok(())
}

pub async fn run_import<B: Backend>(provider: &ConnectionProvider<B>, args: ImportArgs) -> Result<()> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let expenses = parse_import(&content)?;

    ExpenseRepo::new(provider)
        .create_many(&expenses)
        .await
        .context("Bulk insert failed")?;

    info!(count = expenses.len(), file = %args.input.display(), "import complete");
    println!("Imported {} expenses", expenses.len());
    Ok(())
}

pub async fn run_get<B: Backend>(provider: &ConnectionProvider<B>, args: GetArgs) -> Result<()> {
    let expense = ExpenseRepo::new(provider)
        .find_by_expense_id(&args.expense_id)
        .await
        .with_context(|| format!("Failed to load expense {}", args.expense_id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ExpenseView::from(&expense))?);
    } else {
        println!("{}", format_line(&expense));
    }
    Ok(())
}

pub async fn run_list<B: Backend>(provider: &ConnectionProvider<B>, args: ListArgs) -> Result<()> {
    let expenses = match ExpenseRepo::new(provider).find_all().await {
        Ok(expenses) => expenses,
        Err(err) if err.is_not_found() => Vec::new(),
        Err(err) => return Err(err).context("Failed to list expenses"),
    };

    if args.json {
        let views: Vec<ExpenseView> = expenses.iter().map(ExpenseView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else if expenses.is_empty() {
        println!("No expenses stored");
    } else {
        for expense in &expenses {
            println!("{}", format_line(expense));
        }
    }
    Ok(())
}

pub async fn run_delete<B: Backend>(provider: &ConnectionProvider<B>, args: DeleteArgs) -> Result<()> {
    ExpenseRepo::new(provider)
        .delete_by_expense_id(&args.expense_id)
        .await
        .with_context(|| format!("Failed to delete expense {}", args.expense_id))?;

    println!("Deleted {} (if present)", args.expense_id);
    Ok(())
}

pub async fn run_clear<B: Backend>(provider: &ConnectionProvider<B>, args: ClearArgs) -> Result<()> {
    if !args.yes {
        bail!("Refusing to delete every expense without --yes");
    }

    ExpenseRepo::new(provider)
        .delete_all()
        .await
        .context("Failed to delete expenses")?;

    println!("All expenses deleted");
    Ok(())
}
