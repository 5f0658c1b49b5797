//! MongoDB backend implementation for docstore.
//!
//! This crate provides a MongoDB-based implementation of the `DataBackend`
//! trait, enabling persistent document storage with the database's own
//! filtering, distinct, and aggregation capabilities.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docstore = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The backend needs a MongoDB connection string and database name. Both
//! come from a resolved `StoreConfig`, either passed explicitly or read
//! from the environment.
//!
//! # Example
//!
//! ```ignore
//! use docstore_core::config::StoreConfig;
//! use docstore_mongodb::MongoBackend;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::from_env()?;
//!     let backend = MongoBackend::connect(&config).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_mongodb;

pub mod store;

pub use store::{MongoBackend, MongoBackendBuilder};
