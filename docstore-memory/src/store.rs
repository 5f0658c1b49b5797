//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that stores documents
//! as BSON in HashMaps behind an async-safe read-write lock.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use futures::StreamExt;
use mea::rwlock::RwLock;

use docstore_core::{
    backend::{DataBackend, DataBackendBuilder, DocumentStream, UpdateOutcome},
    config::StoreConfig,
    error::{DataError, DataResult},
};

use crate::evaluator::FilterEvaluator;
use crate::pipeline::run_pipeline;

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document storage backend.
///
/// Documents live in insertion order inside per-collection vectors; reads
/// scan the whole collection (no indexing). `InMemoryBackend` is cloneable
/// and clones share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use docstore_memory::InMemoryBackend;
/// use docstore_core::backend::DataBackend;
/// use bson::doc;
///
/// let backend = InMemoryBackend::new();
/// let id = backend.insert_one("users", doc! { "name": "Alice" }).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryBackend {
    /// The main storage map: collection_name -> documents
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self { store: Arc::new(RwLock::new(StoreMap::new())) }
    }

    /// Creates a builder for constructing an `InMemoryBackend`.
    pub fn builder() -> InMemoryBackendBuilder {
        InMemoryBackendBuilder::default()
    }

    fn prepare_insert(collection: &mut Vec<Document>, mut document: Document) -> DataResult<Bson> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let oid = ObjectId::new();
                document.insert("_id", oid);
                Bson::ObjectId(oid)
            }
        };

        if collection.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(DataError::Driver(format!("duplicate key: _id {id}")));
        }

        collection.push(document);
        Ok(id)
    }
}

#[async_trait]
impl DataBackend for InMemoryBackend {
    async fn insert_one(&self, collection: &str, document: Document) -> DataResult<Bson> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();
        Self::prepare_insert(docs, document)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DataResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(Self::prepare_insert(docs, document)?);
        }
        Ok(ids)
    }

    async fn find(&self, collection: &str, filter: Document) -> DataResult<DocumentStream> {
        let store = self.store.read().await;
        let found = match store.get(collection) {
            Some(docs) => FilterEvaluator::filter_documents(docs.iter(), &filter)?,
            None => Vec::new(),
        };
        Ok(futures::stream::iter(found.into_iter().map(Ok)).boxed())
    }

    async fn distinct(&self, collection: &str, field: &str) -> DataResult<Vec<Bson>> {
        let store = self.store.read().await;
        let mut values: Vec<Bson> = Vec::new();

        for doc in store.get(collection).into_iter().flatten() {
            match doc.get(field) {
                // Array fields contribute their elements, not the array.
                Some(Bson::Array(items)) => {
                    for item in items {
                        if !values.contains(item) {
                            values.push(item.clone());
                        }
                    }
                }
                Some(value) => {
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }
                None => {}
            }
        }

        Ok(values)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> DataResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        let mut outcome = UpdateOutcome::default();
        for doc in docs.iter_mut() {
            if !FilterEvaluator::new(doc).matches(&filter)? {
                continue;
            }
            outcome.matched += 1;

            let mut changed = false;
            for (key, value) in &set {
                if doc.get(key) != Some(value) {
                    doc.insert(key.clone(), value.clone());
                    changed = true;
                }
            }
            if changed {
                outcome.modified += 1;
            }
        }

        if outcome.matched == 0 {
            let id = Self::prepare_insert(docs, upsert_document(&filter, &set))?;
            outcome.upserted_id = Some(id);
        }

        Ok(outcome)
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> DataResult<u64> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        let keep: Vec<bool> = docs
            .iter()
            .map(|doc| FilterEvaluator::new(doc).matches(&filter).map(|m| !m))
            .collect::<DataResult<_>>()?;

        let before = docs.len();
        let mut keep = keep.into_iter();
        docs.retain(|_| keep.next().unwrap_or(true));
        Ok((before - docs.len()) as u64)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> DataResult<DocumentStream> {
        let store = self.store.read().await;
        let snapshot = store.get(collection).cloned().unwrap_or_default();
        drop(store);

        let result = run_pipeline(snapshot, &pipeline)?;
        Ok(futures::stream::iter(result.into_iter().map(Ok)).boxed())
    }
}

/// Seeds the document an upsert inserts: the filter's top-level equality
/// pairs overlaid with the `$set` values.
fn upsert_document(filter: &Document, set: &Document) -> Document {
    let mut document = Document::new();
    for (key, value) in filter {
        let is_operator = key.starts_with('$')
            || matches!(value, Bson::Document(doc) if doc.keys().any(|k| k.starts_with('$')));
        if !is_operator {
            document.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in set {
        document.insert(key.clone(), value.clone());
    }
    document
}

/// Builder for constructing [`InMemoryBackend`] instances.
///
/// The connection parameters in the config are ignored; the backend holds
/// no external resources.
#[derive(Default)]
pub struct InMemoryBackendBuilder;

#[async_trait]
impl DataBackendBuilder for InMemoryBackendBuilder {
    type Backend = InMemoryBackend;

    async fn build(self, _config: &StoreConfig) -> DataResult<Self::Backend> {
        Ok(InMemoryBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn insert_generates_object_ids() {
        let backend = InMemoryBackend::new();
        let id = backend.insert_one("data", doc! { "name": "John" }).await.unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));

        let supplied = backend
            .insert_one("data", doc! { "_id": "custom", "name": "Jane" })
            .await
            .unwrap();
        assert_eq!(supplied, Bson::String("custom".to_string()));
    }

    #[tokio::test]
    async fn duplicate_identities_are_rejected() {
        let backend = InMemoryBackend::new();
        backend.insert_one("data", doc! { "_id": "x" }).await.unwrap();
        let err = backend.insert_one("data", doc! { "_id": "x" }).await.unwrap_err();
        assert!(matches!(err, DataError::Driver(_)));
    }

    #[tokio::test]
    async fn find_filters_documents() {
        let backend = InMemoryBackend::new();
        backend
            .insert_many(
                "data",
                vec![
                    doc! { "name": "John", "age": 25 },
                    doc! { "name": "Jane", "age": 30 },
                ],
            )
            .await
            .unwrap();

        let found: Vec<Document> = backend
            .find("data", doc! { "age": { "$gt": 26 } })
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("name").unwrap(), "Jane");
    }

    #[tokio::test]
    async fn distinct_flattens_arrays_and_deduplicates() {
        let backend = InMemoryBackend::new();
        backend
            .insert_many(
                "data",
                vec![
                    doc! { "files": ["f1", "f2"] },
                    doc! { "files": ["f2", "f3"] },
                    doc! { "tag": "x" },
                ],
            )
            .await
            .unwrap();

        let values = backend.distinct("data", "files").await.unwrap();
        assert_eq!(values, vec![Bson::from("f1"), Bson::from("f2"), Bson::from("f3")]);
    }

    #[tokio::test]
    async fn update_counts_only_changed_documents() {
        let backend = InMemoryBackend::new();
        backend
            .insert_many(
                "data",
                vec![
                    doc! { "name": "John", "seen": false },
                    doc! { "name": "John", "seen": true },
                ],
            )
            .await
            .unwrap();

        let outcome = backend
            .update_many("data", doc! { "name": "John" }, doc! { "seen": true })
            .await
            .unwrap();
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.modified, 1);
        assert!(outcome.upserted_id.is_none());
    }

    #[tokio::test]
    async fn update_upserts_when_nothing_matches() {
        let backend = InMemoryBackend::new();
        let outcome = backend
            .update_many("data", doc! { "name": "Ghost" }, doc! { "age": 99 })
            .await
            .unwrap();
        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.modified, 0);
        assert!(outcome.upserted_id.is_some());

        let found: Vec<Document> = backend
            .find("data", doc! { "name": "Ghost" })
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_i32("age").unwrap(), 99);
    }

    #[tokio::test]
    async fn delete_returns_removed_count() {
        let backend = InMemoryBackend::new();
        backend
            .insert_many(
                "data",
                vec![
                    doc! { "name": "John" },
                    doc! { "name": "Jane" },
                    doc! { "name": "John" },
                ],
            )
            .await
            .unwrap();

        let deleted = backend.delete_many("data", doc! { "name": "John" }).await.unwrap();
        assert_eq!(deleted, 2);
        let rest = backend.delete_many("data", doc! {}).await.unwrap();
        assert_eq!(rest, 1);
    }

    #[tokio::test]
    async fn aggregate_runs_the_pipeline() {
        let backend = InMemoryBackend::new();
        backend
            .insert_many(
                "data",
                vec![
                    doc! { "name": "John", "age": 25 },
                    doc! { "name": "Jane", "age": 30 },
                ],
            )
            .await
            .unwrap();

        let result: Vec<Document> = backend
            .aggregate(
                "data",
                vec![doc! { "$match": { "age": { "$gte": 30 } } }],
            )
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get_str("name").unwrap(), "Jane");
    }
}
