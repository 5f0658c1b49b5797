//! Classification of match values into a tagged union.
//!
//! Callers identify documents by a UUID string, a native ObjectId string, a
//! plain field name (for distinct-value lookups), or a structured BSON
//! filter. [`MatchSpec`] classifies the input once; downstream code branches
//! on the variant and never re-inspects the raw value.

use bson::{Document, doc, oid::ObjectId};
use uuid::Uuid;

/// A classified match value.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchSpec {
    /// A caller-generated random unique identifier in UUID textual form,
    /// kept as the string it was supplied as (documents store it verbatim).
    UniqueId(String),
    /// The database's native object identifier (24 hex characters).
    ObjectId(ObjectId),
    /// Any other string: a field name for a distinct-values lookup.
    Key(String),
    /// A structured filter, passed through to the driver unchanged.
    Filter(Document),
}

impl MatchSpec {
    /// Classifies a string match value.
    ///
    /// UUID textual forms win over ObjectId forms, which win over the plain
    /// key fallback. This is a pure function with no error conditions.
    pub fn classify(value: &str) -> Self {
        if Uuid::parse_str(value).is_ok() {
            MatchSpec::UniqueId(value.to_string())
        } else if let Ok(oid) = ObjectId::parse_str(value) {
            MatchSpec::ObjectId(oid)
        } else {
            MatchSpec::Key(value.to_string())
        }
    }

    /// Whether this match identifies exactly one document by its `_id`.
    pub fn is_identity(&self) -> bool {
        matches!(self, MatchSpec::UniqueId(_) | MatchSpec::ObjectId(_))
    }

    /// Lowers this match to a BSON filter document.
    ///
    /// Identity variants become an `_id` equality filter. `Key` lowers to
    /// the empty filter: in delete position callers pass a plain string
    /// (conventionally the collection's own name) to address every
    /// document. Updates refuse `Key` matches before lowering.
    pub fn filter_document(&self) -> Document {
        match self {
            MatchSpec::UniqueId(id) => doc! { "_id": id.as_str() },
            MatchSpec::ObjectId(oid) => doc! { "_id": *oid },
            MatchSpec::Key(_) => doc! {},
            MatchSpec::Filter(filter) => filter.clone(),
        }
    }
}

impl From<&str> for MatchSpec {
    fn from(value: &str) -> Self {
        MatchSpec::classify(value)
    }
}

impl From<String> for MatchSpec {
    fn from(value: String) -> Self {
        MatchSpec::classify(&value)
    }
}

impl From<Document> for MatchSpec {
    fn from(filter: Document) -> Self {
        MatchSpec::Filter(filter)
    }
}

impl From<Uuid> for MatchSpec {
    fn from(id: Uuid) -> Self {
        MatchSpec::UniqueId(id.to_string())
    }
}

impl From<ObjectId> for MatchSpec {
    fn from(oid: ObjectId) -> Self {
        MatchSpec::ObjectId(oid)
    }
}
