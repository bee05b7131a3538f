//! Document-store primitives the repositories are written against.
//!
//! [`Backend`] establishes and checks a connection; the resulting handle
//! implements [`DocumentStore`]. `MongoBackend` talks to a real server,
//! `MemoryBackend` (feature `test-util`) keeps documents in process for
//! tests.

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;

use crate::error::BoxError;
use crate::filter::Filter;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod mongo;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryBackend, MemoryHandle};
pub use mongo::{MongoBackend, MongoHandle};

/// Cursor over matching documents. Dropping it releases the server-side cursor.
pub type DocumentStream = BoxStream<'static, Result<Document, BoxError>>;

/// Database/collection pair an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: &'static str,
    pub collection: &'static str,
}

impl Namespace {
    pub const fn new(database: &'static str, collection: &'static str) -> Self {
        Self {
            database,
            collection,
        }
    }
}

/// Connects to a store and verifies it is reachable.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    type Handle: DocumentStore + Clone + Send + Sync + 'static;

    async fn connect(&self, endpoint: &str) -> Result<Self::Handle, BoxError>;

    async fn ping(&self, handle: &Self::Handle) -> Result<(), BoxError>;
}

/// Single-request document operations. Each call is independent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, ns: Namespace, doc: Document) -> Result<(), BoxError>;

    /// Ordered bulk insert. Stops at the first failing document.
    async fn insert_many(&self, ns: Namespace, docs: Vec<Document>) -> Result<(), BoxError>;

    async fn find_one(&self, ns: Namespace, filter: &Filter) -> Result<Option<Document>, BoxError>;

    async fn find(&self, ns: Namespace, filter: &Filter) -> Result<DocumentStream, BoxError>;

    /// Removes at most one matching document. Returns how many were removed.
    async fn delete_one(&self, ns: Namespace, filter: &Filter) -> Result<u64, BoxError>;

    async fn delete_many(&self, ns: Namespace, filter: &Filter) -> Result<u64, BoxError>;
}
