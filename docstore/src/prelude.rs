//! Convenient re-exports of commonly used types from docstore.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docstore::prelude::*;
//! ```

pub use docstore_core::{
    backend::{DataBackend, DataBackendBuilder, DocumentStream, UpdateOutcome},
    codec::{id_to_string, normalize_document},
    config::StoreConfig,
    error::{DataError, DataResult},
    match_spec::MatchSpec,
    schema::{DocumentSchema, FieldType, Payload, Schema},
    store::{Collection, DataStore, Fetched},
};
