//! expensectl-core: expense persistence on a document store
//!
//! A [`ConnectionProvider`] lazily establishes one shared handle; an
//! [`ExpenseRepo`] borrows the provider and runs CRUD operations against
//! `expenses.expense`.

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod model;

pub use backend::{Backend, DocumentStore, MongoBackend, Namespace};
#[cfg(any(test, feature = "test-util"))]
pub use backend::MemoryBackend;
pub use config::{load_dotenv, ConnectionConfig, StoreConfig};
pub use db::{ConnectionProvider, ExpenseRepo, InitPolicy, EXPENSES};
pub use error::{ConnectError, ErrorKind, Result, StoreError};
pub use filter::Filter;
pub use model::Expense;
