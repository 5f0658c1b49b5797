//! Normalization of documents crossing the store boundary.
//!
//! Callers never see a raw ObjectId on a document's identity field: every
//! outward-facing document carries its `_id` in canonical string form.

use bson::{Bson, Document};

/// Renders an identifier value in its canonical string encoding.
///
/// ObjectIds become their 24-character hex form; strings pass through;
/// anything else falls back to its BSON display form.
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replaces an ObjectId-valued identity field with its hex string.
///
/// Documents without an `_id` field, or with a non-ObjectId `_id`, are
/// returned unchanged. Never mutates database state.
pub fn normalize_document(mut document: Document) -> Document {
    if let Some(Bson::ObjectId(oid)) = document.get("_id") {
        let hex = oid.to_hex();
        document.insert("_id", Bson::String(hex));
    }
    document
}
