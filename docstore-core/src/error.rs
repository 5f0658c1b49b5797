//! Error types and result types for data store operations.
//!
//! Every fallible operation in this workspace returns [`DataResult<T>`].
//! Errors are logged at the store boundary and returned as values; nothing
//! in this layer panics across the public API.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors surfaced by the data store layer.
#[derive(Error, Debug)]
pub enum DataError {
    /// Missing or inconsistent connection parameters (connection string,
    /// database name).
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A write payload did not satisfy its schema definition.
    #[error("Validation error: {0}")]
    Validation(String),
    /// An identity lookup matched zero documents.
    /// The first argument is the identifier, the second the collection name.
    #[error("Document {0} not found in collection {1}")]
    NotFound(String, String),
    /// A payload had a shape the operation cannot interpret (neither a
    /// single document nor a sequence of documents).
    #[error("Cannot interpret payload: {0}")]
    Payload(String),
    /// Serialization/deserialization error when converting document formats.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Any failure raised by the underlying database driver (connectivity,
    /// duplicate key, malformed pipeline, ...).
    #[error("Driver error: {0}")]
    Driver(String),
}

/// A specialized `Result` type for data store operations.
pub type DataResult<T> = Result<T, DataError>;

impl From<BsonError> for DataError {
    fn from(err: BsonError) -> Self {
        DataError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DataError {
    fn from(err: SerdeJsonError) -> Self {
        DataError::Serialization(err.to_string())
    }
}
