//! In-process document store.
//!
//! Mirrors the driver behavior the repositories depend on: `_id` assignment,
//! ordered bulk inserts, first-match deletes. Connection attempts are counted
//! and can be made to fail so initialization races are observable in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;
use futures::stream::{self, StreamExt};

use super::{Backend, DocumentStore, DocumentStream, Namespace};
use crate::error::BoxError;
use crate::filter::Filter;

/// Backend whose "server" lives in memory.
///
/// Clones share counters, fault settings and data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<BackendInner>,
}

#[derive(Debug, Default)]
struct BackendInner {
    connect_attempts: AtomicUsize,
    ping_attempts: AtomicUsize,
    failing_connects: AtomicUsize,
    failing_pings: AtomicUsize,
    connect_delay: Mutex<Duration>,
    handle: MemoryHandle,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside `connect` to widen race windows.
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        *lock(&self.inner.connect_delay) = delay;
        self
    }

    /// Make the next `times` connect attempts fail.
    pub fn fail_connects(self, times: usize) -> Self {
        self.inner.failing_connects.store(times, Ordering::SeqCst);
        self
    }

    /// Make the next `times` liveness checks fail.
    pub fn fail_pings(self, times: usize) -> Self {
        self.inner.failing_pings.store(times, Ordering::SeqCst);
        self
    }

    pub fn connect_attempts(&self) -> usize {
        self.inner.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn ping_attempts(&self) -> usize {
        self.inner.ping_attempts.load(Ordering::SeqCst)
    }

    /// Direct access to the stored data, bypassing the provider.
    pub fn handle(&self) -> MemoryHandle {
        self.inner.handle.clone()
    }
}

/// Decrement `counter` if positive; true when a failure was consumed.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl Backend for MemoryBackend {
    type Handle = MemoryHandle;

    async fn connect(&self, endpoint: &str) -> Result<MemoryHandle, BoxError> {
        self.inner.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.inner.connect_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if take_failure(&self.inner.failing_connects) {
            return Err(format!("connection refused: {}", endpoint).into());
        }
        Ok(self.inner.handle.clone())
    }

    async fn ping(&self, _handle: &MemoryHandle) -> Result<(), BoxError> {
        self.inner.ping_attempts.fetch_add(1, Ordering::SeqCst);

        if take_failure(&self.inner.failing_pings) {
            return Err("server selection timed out".into());
        }
        Ok(())
    }
}

/// Shared collections keyed by namespace.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandle {
    collections: Arc<Mutex<HashMap<Namespace, Vec<Document>>>>,
    fail_operations: Arc<AtomicBool>,
    cursor_failure: Arc<Mutex<Option<usize>>>,
}

impl MemoryHandle {
    /// Make every document operation fail until switched back off.
    pub fn set_fail_operations(&self, fail: bool) {
        self.fail_operations.store(fail, Ordering::SeqCst);
    }

    /// Make `find` cursors fail after yielding `after` documents. `None`
    /// restores normal cursors.
    pub fn set_cursor_failure(&self, after: Option<usize>) {
        *lock(&self.cursor_failure) = after;
    }

    /// Store a document verbatim, without `_id` assignment.
    pub fn insert_raw(&self, ns: Namespace, doc: Document) {
        lock(&self.collections).entry(ns).or_default().push(doc);
    }

    pub fn count(&self, ns: Namespace) -> usize {
        lock(&self.collections).get(&ns).map_or(0, Vec::len)
    }

    fn check_available(&self) -> Result<(), BoxError> {
        if self.fail_operations.load(Ordering::SeqCst) {
            return Err("connection reset by peer".into());
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Assign an `_id` if absent, reject duplicates.
fn prepare(collection: &[Document], mut doc: Document) -> Result<Document, BoxError> {
    if !doc.contains_key("_id") {
        doc.insert("_id", ObjectId::new());
        return Ok(doc);
    }

    let id = doc.get("_id");
    if collection.iter().any(|existing| existing.get("_id") == id) {
        return Err(format!("E11000 duplicate key error: _id {:?}", id).into());
    }
    Ok(doc)
}

#[async_trait]
impl DocumentStore for MemoryHandle {
    async fn insert_one(&self, ns: Namespace, doc: Document) -> Result<(), BoxError> {
        self.check_available()?;
        let mut collections = lock(&self.collections);
        let collection = collections.entry(ns).or_default();
        let doc = prepare(collection, doc)?;
        collection.push(doc);
        Ok(())
    }

    async fn insert_many(&self, ns: Namespace, docs: Vec<Document>) -> Result<(), BoxError> {
        self.check_available()?;
        if docs.is_empty() {
            return Err("insert_many requires at least one document".into());
        }

        let mut collections = lock(&self.collections);
        let collection = collections.entry(ns).or_default();
        for (index, doc) in docs.into_iter().enumerate() {
            let doc = prepare(collection, doc)
                .map_err(|err| format!("bulk write stopped at index {}: {}", index, err))?;
            collection.push(doc);
        }
        Ok(())
    }

    async fn find_one(&self, ns: Namespace, filter: &Filter) -> Result<Option<Document>, BoxError> {
        self.check_available()?;
        let collections = lock(&self.collections);
        Ok(collections
            .get(&ns)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn find(&self, ns: Namespace, filter: &Filter) -> Result<DocumentStream, BoxError> {
        self.check_available()?;
        let matched: Vec<Result<Document, BoxError>> = lock(&self.collections)
            .get(&ns)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .map(Ok)
                    .collect()
            })
            .unwrap_or_default();

        let matched = match *lock(&self.cursor_failure) {
            Some(after) => {
                let mut truncated = matched;
                truncated.truncate(after);
                truncated.push(Err("cursor killed: connection reset by peer".into()));
                truncated
            }
            None => matched,
        };
        Ok(stream::iter(matched).boxed())
    }

    async fn delete_one(&self, ns: Namespace, filter: &Filter) -> Result<u64, BoxError> {
        self.check_available()?;
        let mut collections = lock(&self.collections);
        let Some(docs) = collections.get_mut(&ns) else {
            return Ok(0);
        };
        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, ns: Namespace, filter: &Filter) -> Result<u64, BoxError> {
        self.check_available()?;
        let mut collections = lock(&self.collections);
        let Some(docs) = collections.get_mut(&ns) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }
}
