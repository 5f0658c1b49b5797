//! Backend abstraction for document storage.
//!
//! A [`DataBackend`] exposes the raw operations a store composes into its
//! public API. Backends speak plain BSON filters and documents; match
//! classification, schema validation, and identity normalization all live
//! above this trait.

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;

use crate::config::StoreConfig;
use crate::error::DataResult;

/// A lazily evaluated stream of documents produced by a read operation.
pub type DocumentStream = BoxStream<'static, DataResult<Document>>;

/// Counts reported by a bulk update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateOutcome {
    /// Documents matched by the filter.
    pub matched: u64,
    /// Documents actually changed.
    pub modified: u64,
    /// Identity of the document inserted by an upsert, if one happened.
    pub upserted_id: Option<Bson>,
}

/// Storage operations a backend must provide.
///
/// All operations are scoped to a named collection; backends create
/// collections implicitly on first write.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Inserts one document, returning its identity value.
    async fn insert_one(&self, collection: &str, document: Document) -> DataResult<Bson>;

    /// Inserts a batch of documents, returning identities in input order.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DataResult<Vec<Bson>>;

    /// Finds documents matching a filter.
    async fn find(&self, collection: &str, filter: Document) -> DataResult<DocumentStream>;

    /// Collects the distinct values of a field across the collection.
    async fn distinct(&self, collection: &str, field: &str) -> DataResult<Vec<Bson>>;

    /// Applies a `$set` update to every matching document, upserting when
    /// nothing matches.
    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> DataResult<UpdateOutcome>;

    /// Deletes every matching document, returning the deleted count.
    async fn delete_many(&self, collection: &str, filter: Document) -> DataResult<u64>;

    /// Runs an aggregation pipeline against the collection.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> DataResult<DocumentStream>;

    /// Releases backend resources. The default implementation does nothing.
    async fn shutdown(&self) -> DataResult<()> {
        Ok(())
    }
}

/// Constructs a backend from a resolved [`StoreConfig`].
#[async_trait]
pub trait DataBackendBuilder {
    /// The backend type this builder produces.
    type Backend: DataBackend;

    /// Builds the backend. Implementations may defer I/O to first use.
    async fn build(self, config: &StoreConfig) -> DataResult<Self::Backend>;
}
