//! Repository implementations for document access
//!
//! Repositories borrow the shared [`ConnectionProvider`](super::ConnectionProvider)
//! and resolve the handle at the start of every call.

pub mod expenses;

pub use expenses::{ExpenseRepo, EXPENSES, EXPENSES_COLLECTION, EXPENSES_DATABASE};
