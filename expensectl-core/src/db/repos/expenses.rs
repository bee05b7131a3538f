//! Expense repository
//!
//! CRUD over `expenses.expense`:
//! - lookups and deletes by exact `expenseID` match
//! - bulk insert is a single ordered insert_many
//! - find_all drains the cursor and reports an empty collection as NotFound

use bson::Document;
use futures::TryStreamExt;
use tracing::debug;

use crate::backend::{Backend, DocumentStore, Namespace};
use crate::db::ConnectionProvider;
use crate::error::{Result, StoreError};
use crate::filter::Filter;
use crate::model::{Expense, EXPENSE_ID_FIELD};

pub const EXPENSES_DATABASE: &str = "expenses";
pub const EXPENSES_COLLECTION: &str = "expense";

/// Where expense documents live.
pub const EXPENSES: Namespace = Namespace::new(EXPENSES_DATABASE, EXPENSES_COLLECTION);

const RESOURCE: &str = "expense";

/// Expense repository
pub struct ExpenseRepo<'a, B: Backend> {
    provider: &'a ConnectionProvider<B>,
}

impl<'a, B: Backend> ExpenseRepo<'a, B> {
    pub fn new(provider: &'a ConnectionProvider<B>) -> Self {
        Self { provider }
    }

    /// Insert one transient expense. The store assigns its `_id`.
    pub async fn create(&self, expense: &Expense) -> Result<()> {
        let handle = self.provider.acquire().await?;
        let doc = encode(expense)?;

        handle
            .insert_one(EXPENSES, doc)
            .await
            .map_err(|e| StoreError::operation("insert_one", e))?;

        debug!(expense_id = %expense.expense_id, "expense created");
        Ok(())
    }

    /// Insert all expenses in one ordered bulk write.
    ///
    /// Partial failure follows the driver: documents before the failing one
    /// stay inserted. An empty slice succeeds without a round trip.
    pub async fn create_many(&self, expenses: &[Expense]) -> Result<()> {
        let handle = self.provider.acquire().await?;
        if expenses.is_empty() {
            debug!("create_many called with no expenses");
            return Ok(());
        }

        let docs = expenses.iter().map(encode).collect::<Result<Vec<_>>>()?;

        handle
            .insert_many(EXPENSES, docs)
            .await
            .map_err(|e| StoreError::operation("insert_many", e))?;

        debug!(count = expenses.len(), "expenses created");
        Ok(())
    }

    /// Fetch the first expense whose `expenseID` equals `expense_id`.
    pub async fn find_by_expense_id(&self, expense_id: &str) -> Result<Expense> {
        let handle = self.provider.acquire().await?;
        let filter = by_expense_id(expense_id);

        let doc = handle
            .find_one(EXPENSES, &filter)
            .await
            .map_err(|e| StoreError::operation("find_one", e))?
            .ok_or_else(|| StoreError::not_found(RESOURCE, filter.to_string()))?;

        decode(doc)
    }

    /// Fetch every stored expense.
    ///
    /// An empty collection is reported as `NotFound`, not as an empty list.
    pub async fn find_all(&self) -> Result<Vec<Expense>> {
        let handle = self.provider.acquire().await?;
        let filter = Filter::MatchAll;

        let mut cursor = handle
            .find(EXPENSES, &filter)
            .await
            .map_err(|e| StoreError::operation("find", e))?;

        let mut expenses = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| StoreError::operation("cursor iteration", e))?
        {
            expenses.push(decode(doc)?);
        }
        // Exhausted: release the server-side cursor now rather than at scope end.
        drop(cursor);

        if expenses.is_empty() {
            return Err(StoreError::not_found(RESOURCE, filter.to_string()));
        }

        debug!(count = expenses.len(), "expenses loaded");
        Ok(expenses)
    }

    /// Delete at most one expense with this `expenseID`.
    ///
    /// Succeeds when nothing matched. With duplicate ids the first match is
    /// removed; keeping ids unique is the caller's job.
    pub async fn delete_by_expense_id(&self, expense_id: &str) -> Result<()> {
        let handle = self.provider.acquire().await?;

        let deleted = handle
            .delete_one(EXPENSES, &by_expense_id(expense_id))
            .await
            .map_err(|e| StoreError::operation("delete_one", e))?;

        debug!(%expense_id, deleted, "delete by expense id");
        Ok(())
    }

    /// Delete every stored expense.
    pub async fn delete_all(&self) -> Result<()> {
        let handle = self.provider.acquire().await?;

        let deleted = handle
            .delete_many(EXPENSES, &Filter::MatchAll)
            .await
            .map_err(|e| StoreError::operation("delete_many", e))?;

        debug!(deleted, "all expenses deleted");
        Ok(())
    }
}

fn by_expense_id(expense_id: &str) -> Filter {
    Filter::field_eq(EXPENSE_ID_FIELD, expense_id)
}

fn encode(expense: &Expense) -> Result<Document> {
    bson::to_document(expense).map_err(|e| StoreError::operation("encode expense", e))
}

fn decode(doc: Document) -> Result<Expense> {
    bson::from_document(doc).map_err(|e| StoreError::decode(RESOURCE, e))
}
