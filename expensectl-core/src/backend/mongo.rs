//! MongoDB backend built on the official driver.

use async_trait::async_trait;
use bson::{doc, Document};
use futures::{StreamExt, TryStreamExt};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use super::{Backend, DocumentStore, DocumentStream, Namespace};
use crate::error::BoxError;
use crate::filter::Filter;

/// Builds driver clients from a connection string.
#[derive(Debug, Clone, Default)]
pub struct MongoBackend {
    app_name: Option<String>,
}

impl MongoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported to the server in the connection handshake.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

/// Pooled driver client. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct MongoHandle {
    client: Client,
}

impl MongoHandle {
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, ns: Namespace) -> Collection<Document> {
        self.client.database(ns.database).collection(ns.collection)
    }
}

#[async_trait]
impl Backend for MongoBackend {
    type Handle = MongoHandle;

    async fn connect(&self, endpoint: &str) -> Result<MongoHandle, BoxError> {
        let mut options = ClientOptions::parse(endpoint).await?;
        if self.app_name.is_some() {
            options.app_name = self.app_name.clone();
        }
        let client = Client::with_options(options)?;
        Ok(MongoHandle { client })
    }

    async fn ping(&self, handle: &MongoHandle) -> Result<(), BoxError> {
        handle
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MongoHandle {
    async fn insert_one(&self, ns: Namespace, doc: Document) -> Result<(), BoxError> {
        self.collection(ns).insert_one(doc, None).await?;
        Ok(())
    }

    async fn insert_many(&self, ns: Namespace, docs: Vec<Document>) -> Result<(), BoxError> {
        self.collection(ns).insert_many(docs, None).await?;
        Ok(())
    }

    async fn find_one(&self, ns: Namespace, filter: &Filter) -> Result<Option<Document>, BoxError> {
        Ok(self.collection(ns).find_one(filter.to_document(), None).await?)
    }

    async fn find(&self, ns: Namespace, filter: &Filter) -> Result<DocumentStream, BoxError> {
        let cursor = self.collection(ns).find(filter.to_document(), None).await?;
        Ok(cursor.map_err(|err| Box::new(err) as BoxError).boxed())
    }

    async fn delete_one(&self, ns: Namespace, filter: &Filter) -> Result<u64, BoxError> {
        let result = self.collection(ns).delete_one(filter.to_document(), None).await?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, ns: Namespace, filter: &Filter) -> Result<u64, BoxError> {
        let result = self
            .collection(ns)
            .delete_many(filter.to_document(), None)
            .await?;
        Ok(result.deleted_count)
    }
}
