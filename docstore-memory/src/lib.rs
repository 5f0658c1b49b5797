//! In-memory document storage backend for docstore.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `DataBackend` trait. It uses async-aware read-write locks for concurrent
//! access and is ideal for development and testing.
//!
//! # Quick Start
//!
//! ```ignore
//! use docstore_core::store::DataStore;
//! use docstore_memory::InMemoryBackend;
//!
//! let store = DataStore::new(InMemoryBackend::new(), "data");
//! let collection = store.default_collection();
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstore_memory;

pub mod evaluator;
pub mod pipeline;
pub mod store;

pub use store::{InMemoryBackend, InMemoryBackendBuilder};
