//! A thin schema-validating convenience layer over document databases.
//!
//! This crate is the core of the docstore project and provides:
//!
//! - **Match classification** ([`match_spec`]) - Tagged classification of id strings, field names, and filters
//! - **Schema validation** ([`schema`]) - Payload validation and type coercion for writes
//! - **Backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Store and collections** ([`store`]) - The operation surface: insert, fetch, update, delete, aggregate
//! - **Configuration** ([`config`]) - Explicit connection parameters with environment fallback
//! - **Identity normalization** ([`codec`]) - Canonical string form for document identities
//! - **Error handling** ([`error`]) - Error and result types shared across the workspace
//!
//! # Example
//!
//! ```ignore
//! use docstore_core::config::StoreConfig;
//! use docstore_core::schema::{DocumentSchema, FieldType};
//! use docstore_core::store::DataStore;
//!
//! let schema = DocumentSchema::builder()
//!     .required("name", FieldType::String)
//!     .required("age", FieldType::Integer)
//!     .build();
//!
//! let config = StoreConfig::from_env()?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_core;

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod match_spec;
pub mod schema;
pub mod store;
