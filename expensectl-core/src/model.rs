//! Expense record as stored in the `expense` collection.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire name of the caller-supplied lookup key.
pub const EXPENSE_ID_FIELD: &str = "expenseID";

/// A single expense.
///
/// `id` is `None` until the store has assigned one (transient), and is never
/// changed by the application afterwards (persisted). Field values are not
/// validated here: negative amounts and arbitrary dates are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "expenseID")]
    pub expense_id: String,

    pub title: String,

    pub amount: f64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

impl Expense {
    /// Build a transient expense.
    ///
    /// `date` is truncated to millisecond precision, the resolution of a BSON
    /// datetime, so a stored value reads back equal.
    pub fn new(
        expense_id: impl Into<String>,
        title: impl Into<String>,
        amount: f64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            expense_id: expense_id.into(),
            title: title.into(),
            amount,
            date: bson::DateTime::from_chrono(date).to_chrono(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Compare everything except the store-assigned identifier.
    pub fn same_content(&self, other: &Expense) -> bool {
        self.expense_id == other.expense_id
            && self.title == other.title
            && self.amount == other.amount
            && self.date == other.date
    }
}
