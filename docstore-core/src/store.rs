//! The data store and its collection handles.
//!
//! [`DataStore`] owns a backend and a default collection name resolved from
//! [`StoreConfig`]. A [`Collection`] handle borrows the backend and exposes
//! the operation surface: validated inserts, classified fetches, `$set`
//! updates with upsert, bulk deletes, and aggregation pipelines.

use bson::{Bson, Document};
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, error};

use crate::backend::{DataBackend, DataBackendBuilder, DocumentStream, UpdateOutcome};
use crate::codec::{id_to_string, normalize_document};
use crate::config::StoreConfig;
use crate::error::{DataError, DataResult};
use crate::match_spec::MatchSpec;
use crate::schema::{Payload, Schema};

/// A document store bound to one backend.
pub struct DataStore<B> {
    backend: B,
    default_collection: String,
}

impl<B: DataBackend> DataStore<B> {
    /// Wraps an already-built backend.
    pub fn new(backend: B, default_collection: impl Into<String>) -> Self {
        Self { backend, default_collection: default_collection.into() }
    }

    /// Builds a backend from a resolved config and wraps it.
    pub async fn open<Builder>(builder: Builder, config: &StoreConfig) -> DataResult<Self>
    where
        Builder: DataBackendBuilder<Backend = B>,
    {
        let backend = builder.build(config).await?;
        Ok(Self::new(backend, config.collection.clone()))
    }

    /// Returns a handle to a named collection.
    pub fn collection(&self, name: &str) -> Collection<'_, B> {
        Collection { backend: &self.backend, name: name.to_string() }
    }

    /// Returns a handle to the configured default collection.
    pub fn default_collection(&self) -> Collection<'_, B> {
        self.collection(&self.default_collection)
    }

    /// Shuts down the underlying backend.
    pub async fn shutdown(&self) -> DataResult<()> {
        self.backend.shutdown().await
    }
}

/// The result of a fetch, shaped by how the match was classified.
pub enum Fetched {
    /// The single document an identity match resolved to.
    Document(Document),
    /// The distinct values of the field a key match named.
    Values(Vec<Bson>),
    /// A lazy stream of the documents a filter matched.
    Documents(DocumentStream),
}

impl std::fmt::Debug for Fetched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fetched::Document(document) => f.debug_tuple("Document").field(document).finish(),
            Fetched::Values(values) => f.debug_tuple("Values").field(values).finish(),
            Fetched::Documents(_) => f.write_str("Documents(..)"),
        }
    }
}

impl Fetched {
    /// Returns the single document, if this was an identity fetch.
    pub fn into_document(self) -> Option<Document> {
        match self {
            Fetched::Document(document) => Some(document),
            _ => None,
        }
    }

    /// Returns the distinct values, if this was a key fetch.
    pub fn into_values(self) -> Option<Vec<Bson>> {
        match self {
            Fetched::Values(values) => Some(values),
            _ => None,
        }
    }

    /// Drains the result into a list of documents.
    ///
    /// An identity fetch yields a one-element list; a key fetch has no
    /// document form and is a payload error.
    pub async fn collect(self) -> DataResult<Vec<Document>> {
        match self {
            Fetched::Document(document) => Ok(vec![document]),
            Fetched::Documents(stream) => stream.try_collect().await,
            Fetched::Values(_) => Err(DataError::Payload(
                "distinct values have no document form".to_string(),
            )),
        }
    }
}

/// A handle to one collection of a [`DataStore`].
pub struct Collection<'a, B> {
    backend: &'a B,
    name: String,
}

impl<B: DataBackend> Collection<'_, B> {
    /// The collection's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates a payload against a schema and inserts it.
    ///
    /// Returns the inserted identities as canonical strings, in input
    /// order. A one-document payload yields a one-element list.
    pub async fn insert<S>(
        &self,
        payload: impl Into<Payload>,
        schema: &S,
    ) -> DataResult<Vec<String>>
    where
        S: Schema + ?Sized,
    {
        debug!(collection = %self.name, "insert");
        let payload: Payload = payload.into();
        let result = match payload.validate(schema)? {
            Payload::One(document) => {
                let id = self.backend.insert_one(&self.name, document).await?;
                Ok(vec![id_to_string(&id)])
            }
            Payload::Many(documents) => {
                let ids = self.backend.insert_many(&self.name, documents).await?;
                Ok(ids.iter().map(id_to_string).collect())
            }
        };
        result.inspect_err(|err| error!(collection = %self.name, %err, "insert failed"))
    }

    /// Fetches documents by a classified match value.
    ///
    /// An identity match resolves to exactly one normalized document or a
    /// not-found error. A key match resolves to the field's distinct values.
    /// A filter match resolves to a lazy stream of normalized documents.
    pub async fn fetch(&self, spec: impl Into<MatchSpec>) -> DataResult<Fetched> {
        let spec = spec.into();
        debug!(collection = %self.name, ?spec, "fetch");
        let result = match &spec {
            MatchSpec::UniqueId(_) | MatchSpec::ObjectId(_) => {
                let mut stream = self.backend.find(&self.name, spec.filter_document()).await?;
                match stream.next().await {
                    Some(document) => Ok(Fetched::Document(normalize_document(document?))),
                    None => {
                        let id = match &spec {
                            MatchSpec::UniqueId(id) => id.clone(),
                            MatchSpec::ObjectId(oid) => oid.to_hex(),
                            _ => unreachable!(),
                        };
                        Err(DataError::NotFound(id, self.name.clone()))
                    }
                }
            }
            MatchSpec::Key(field) => {
                let values = self.backend.distinct(&self.name, field).await?;
                Ok(Fetched::Values(values))
            }
            MatchSpec::Filter(filter) => {
                let stream = self.backend.find(&self.name, filter.clone()).await?;
                Ok(Fetched::Documents(normalize_stream(stream)))
            }
        };
        result.inspect_err(|err| error!(collection = %self.name, %err, "fetch failed"))
    }

    /// Validates new field values and applies them to every matching
    /// document as a `$set` update, upserting when nothing matches.
    ///
    /// The match must be an id or a filter. A plain string that parses as
    /// neither id form is rejected: lowering it to a match-all filter would
    /// let one mistyped id rewrite the whole collection.
    pub async fn update<S>(
        &self,
        spec: impl Into<MatchSpec>,
        new_data: Document,
        schema: &S,
    ) -> DataResult<UpdateOutcome>
    where
        S: Schema + ?Sized,
    {
        let spec = spec.into();
        debug!(collection = %self.name, ?spec, "update");
        let result = async {
            if let MatchSpec::Key(key) = &spec {
                return Err(DataError::Payload(format!(
                    "cannot update by plain string match '{key}'; pass an id or a filter"
                )));
            }
            let new_data = schema.load(new_data)?;
            self.backend
                .update_many(&self.name, spec.filter_document(), new_data)
                .await
        }
        .await;
        result.inspect_err(|err| error!(collection = %self.name, %err, "update failed"))
    }

    /// Deletes every matching document, returning the deleted count.
    pub async fn delete(&self, spec: impl Into<MatchSpec>) -> DataResult<u64> {
        let spec = spec.into();
        debug!(collection = %self.name, ?spec, "delete");
        self.backend
            .delete_many(&self.name, spec.filter_document())
            .await
            .inspect_err(|err| error!(collection = %self.name, %err, "delete failed"))
    }

    /// Runs an aggregation pipeline, returning a lazy stream of normalized
    /// documents.
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> DataResult<DocumentStream> {
        debug!(collection = %self.name, stages = pipeline.len(), "aggregate");
        let stream = self
            .backend
            .aggregate(&self.name, pipeline)
            .await
            .inspect_err(|err| error!(collection = %self.name, %err, "aggregate failed"))?;
        Ok(normalize_stream(stream))
    }
}

fn normalize_stream(stream: DocumentStream) -> DocumentStream {
    stream
        .map(|item| item.map(normalize_document))
        .boxed()
}
