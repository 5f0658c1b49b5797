use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{AggregateOptions, ClientOptions},
};

use docstore_core::{
    backend::{DataBackend, DataBackendBuilder, DocumentStream, UpdateOutcome},
    config::StoreConfig,
    error::{DataError, DataResult},
};

fn driver_err(err: mongodb::error::Error) -> DataError {
    DataError::Driver(err.to_string())
}

/// MongoDB-backed document storage.
#[derive(Debug, Clone)]
pub struct MongoBackend {
    client: Client,
    database: String,
}

impl MongoBackend {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoBackendBuilder {
        MongoBackendBuilder::new(dsn, database)
    }

    /// Connects using a resolved [`StoreConfig`].
    pub async fn connect(config: &StoreConfig) -> DataResult<Self> {
        MongoBackendBuilder::new(&config.connection_string, &config.database)
            .build(config)
            .await
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

#[async_trait]
impl DataBackend for MongoBackend {
    async fn insert_one(&self, collection: &str, document: Document) -> DataResult<Bson> {
        Ok(
            self.get_collection(collection)
                .insert_one(document)
                .await
                .map_err(driver_err)?
                .inserted_id
        )
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DataResult<Vec<Bson>> {
        let count = documents.len();
        let result = self
            .get_collection(collection)
            .insert_many(documents)
            .await
            .map_err(driver_err)?;

        // The driver reports ids keyed by input index.
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let id = result.inserted_ids.get(&index).ok_or_else(|| {
                DataError::Driver(format!("missing inserted id for document {index}"))
            })?;
            ids.push(id.clone());
        }
        Ok(ids)
    }

    async fn find(&self, collection: &str, filter: Document) -> DataResult<DocumentStream> {
        let cursor = self
            .get_collection(collection)
            .find(filter)
            .await
            .map_err(driver_err)?;

        Ok(cursor.map_err(driver_err).boxed())
    }

    async fn distinct(&self, collection: &str, field: &str) -> DataResult<Vec<Bson>> {
        self.get_collection(collection)
            .distinct(field, doc! {})
            .await
            .map_err(driver_err)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> DataResult<UpdateOutcome> {
        let result = self
            .get_collection(collection)
            .update_many(filter, doc! { "$set": set })
            .upsert(true)
            .await
            .map_err(driver_err)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> DataResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_many(filter)
                .await
                .map_err(driver_err)?
                .deleted_count
        )
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> DataResult<DocumentStream> {
        let cursor = self
            .get_collection(collection)
            .aggregate(pipeline)
            .with_options(
                AggregateOptions::builder()
                    .allow_disk_use(true)
                    .build(),
            )
            .await
            .map_err(driver_err)?;

        Ok(cursor.map_err(driver_err).boxed())
    }

    async fn shutdown(&self) -> DataResult<()> {
        self.client.clone().shutdown().await;

        Ok(())
    }
}

pub struct MongoBackendBuilder {
    dsn: String,
    database: String,
}

impl MongoBackendBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl DataBackendBuilder for MongoBackendBuilder {
    type Backend = MongoBackend;

    async fn build(self, _config: &StoreConfig) -> DataResult<Self::Backend> {
        Ok(MongoBackend::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DataError::Configuration(e.to_string()))?,
            )
            .map_err(|e| DataError::Configuration(e.to_string()))?,
            self.database,
        ))
    }
}
