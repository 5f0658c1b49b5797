//! Main docstore crate providing a schema-validating layer over document
//! databases.
//!
//! This crate is the primary entry point for users of the docstore project.
//! It re-exports the core modules from the sub-crates and provides access
//! to the available storage backends.
//!
//! # Features
//!
//! - **Schema-validated writes** - Payloads are validated and coerced before they reach the database
//! - **Classified fetches** - One fetch entry point handling ids, field names, and structured filters
//! - **Multiple backends** - In-memory storage for testing and MongoDB for persistence
//! - **Explicit configuration** - Connection parameters resolved once, with environment fallback
//!
//! # Quick Start
//!
//! ```ignore
//! use docstore::{prelude::*, memory::InMemoryBackend};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = DocumentSchema::builder()
//!         .required("name", FieldType::String)
//!         .required("age", FieldType::Integer)
//!         .build();
//!
//!     let store = DataStore::new(InMemoryBackend::new(), "data");
//!     let collection = store.default_collection();
//!
//!     // Insert a validated document; ids come back as strings
//!     let ids = collection.insert(doc! { "name": "Alice", "age": 30 }, &schema).await?;
//!
//!     // Fetch it back by id
//!     let fetched = collection.fetch(ids[0].as_str()).await?;
//!     println!("{:?}", fetched.into_document());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docstore_core::{backend, codec, config, error, match_spec, schema, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docstore_memory::{InMemoryBackend, InMemoryBackendBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docstore_mongodb::{MongoBackend, MongoBackendBuilder};
}
