//! Filter evaluation for in-memory document matching.
//!
//! This module evaluates MongoDB-style filter documents against BSON
//! documents, covering the operator subset the store's fetch, update, and
//! delete paths produce.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docstore_core::error::{DataError, DataResult};

/// Type-erased, comparable representation of BSON values.
///
/// Wraps BSON values for filter comparisons, normalizing all numeric types
/// to f64. Values of incomparable types order as `None` and the calling
/// operator treats that as a non-match.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// ObjectId value
    ObjectId(ObjectId),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Looks up a possibly dotted field path in a document.
pub(crate) fn resolve_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

/// Evaluates one filter document against one BSON document.
pub(crate) struct FilterEvaluator<'a> {
    document: &'a Document,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Whether the document satisfies the filter. The empty filter matches
    /// everything.
    pub fn matches(&self, filter: &Document) -> DataResult<bool> {
        for (key, condition) in filter {
            let satisfied = match key.as_str() {
                "$and" => self.all_match(key, condition)?,
                "$or" => self.any_match(key, condition)?,
                _ => self.field_matches(key, condition)?,
            };
            if !satisfied {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Filters an iterator of documents, keeping the matching ones.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> DataResult<Vec<Document>> {
        let mut matched = Vec::new();
        for document in documents {
            if FilterEvaluator::new(document).matches(filter)? {
                matched.push(document.clone());
            }
        }
        Ok(matched)
    }

    fn all_match(&self, key: &str, condition: &Bson) -> DataResult<bool> {
        for filter in clause_filters(key, condition)? {
            if !self.matches(filter)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn any_match(&self, key: &str, condition: &Bson) -> DataResult<bool> {
        for filter in clause_filters(key, condition)? {
            if self.matches(filter)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn field_matches(&self, path: &str, condition: &Bson) -> DataResult<bool> {
        let field_value = resolve_path(self.document, path);

        // An operator document applies each operator; anything else is a
        // plain equality match.
        if let Bson::Document(operators) = condition {
            if operators.keys().any(|op| op.starts_with('$')) {
                for (op, operand) in operators {
                    if !apply_operator(op, field_value, operand)? {
                        return Ok(false);
                    }
                }
                return Ok(true);
            }
        }

        Ok(match field_value {
            Some(value) => values_equal(value, condition),
            None => false,
        })
    }
}

fn clause_filters<'b>(key: &str, condition: &'b Bson) -> DataResult<Vec<&'b Document>> {
    let Bson::Array(clauses) = condition else {
        return Err(DataError::Driver(format!("{key} expects an array of filters")));
    };
    clauses
        .iter()
        .map(|clause| {
            clause
                .as_document()
                .ok_or_else(|| DataError::Driver(format!("{key} clauses must be documents")))
        })
        .collect()
}

fn values_equal(left: &Bson, right: &Bson) -> bool {
    // Matching a scalar against an array field also matches any element,
    // mirroring the database's equality semantics.
    if let (Bson::Array(items), scalar) = (left, right) {
        if !matches!(scalar, Bson::Array(_))
            && items.iter().any(|item| Comparable::from(item) == Comparable::from(scalar))
        {
            return true;
        }
    }
    Comparable::from(left) == Comparable::from(right)
}

fn apply_operator(op: &str, field_value: Option<&Bson>, operand: &Bson) -> DataResult<bool> {
    if op == "$exists" {
        let should_exist = operand.as_bool().unwrap_or(true);
        return Ok(field_value.is_some() == should_exist);
    }

    let Some(value) = field_value else {
        // A missing field only satisfies inequality and exclusion.
        return Ok(matches!(op, "$ne" | "$nin"));
    };

    match op {
        "$eq" => Ok(values_equal(value, operand)),
        "$ne" => Ok(!values_equal(value, operand)),
        "$gt" | "$gte" | "$lt" | "$lte" => {
            match Comparable::from(value).partial_cmp(&Comparable::from(operand)) {
                Some(ordering) => Ok(match op {
                    "$gt" => ordering == Ordering::Greater,
                    "$gte" => ordering != Ordering::Less,
                    "$lt" => ordering == Ordering::Less,
                    "$lte" => ordering != Ordering::Greater,
                    _ => unreachable!(),
                }),
                None => Ok(false),
            }
        }
        "$in" => match operand {
            Bson::Array(candidates) => {
                Ok(candidates.iter().any(|candidate| values_equal(value, candidate)))
            }
            _ => Err(DataError::Driver("$in expects an array".to_string())),
        },
        "$nin" => match operand {
            Bson::Array(candidates) => {
                Ok(!candidates.iter().any(|candidate| values_equal(value, candidate)))
            }
            _ => Err(DataError::Driver("$nin expects an array".to_string())),
        },
        other => Err(DataError::Driver(format!("unsupported filter operator: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn matches(document: Document, filter: Document) -> bool {
        FilterEvaluator::new(&document).matches(&filter).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(doc! { "name": "John" }, doc! {}));
    }

    #[test]
    fn plain_equality() {
        assert!(matches(doc! { "name": "John" }, doc! { "name": "John" }));
        assert!(!matches(doc! { "name": "Jane" }, doc! { "name": "John" }));
        assert!(!matches(doc! {}, doc! { "name": "John" }));
    }

    #[test]
    fn numeric_equality_ignores_width() {
        assert!(matches(doc! { "age": 20_i32 }, doc! { "age": 20_i64 }));
        assert!(matches(doc! { "age": 20_i64 }, doc! { "age": 20.0 }));
    }

    #[test]
    fn comparison_operators() {
        let document = doc! { "age": 25 };
        assert!(matches(document.clone(), doc! { "age": { "$gt": 20 } }));
        assert!(matches(document.clone(), doc! { "age": { "$gte": 25 } }));
        assert!(matches(document.clone(), doc! { "age": { "$lt": 30 } }));
        assert!(!matches(document.clone(), doc! { "age": { "$lt": 25 } }));
        assert!(matches(document, doc! { "age": { "$gt": 20, "$lt": 30 } }));
    }

    #[test]
    fn membership_operators() {
        let document = doc! { "name": "John" };
        assert!(matches(document.clone(), doc! { "name": { "$in": ["John", "Jane"] } }));
        assert!(matches(document.clone(), doc! { "name": { "$nin": ["Jane"] } }));
        assert!(!matches(document, doc! { "name": { "$in": ["Jane"] } }));
    }

    #[test]
    fn exists_operator() {
        let document = doc! { "name": "John" };
        assert!(matches(document.clone(), doc! { "name": { "$exists": true } }));
        assert!(matches(document.clone(), doc! { "age": { "$exists": false } }));
        assert!(!matches(document, doc! { "age": { "$exists": true } }));
    }

    #[test]
    fn logical_clauses() {
        let document = doc! { "name": "John", "age": 25 };
        assert!(matches(
            document.clone(),
            doc! { "$and": [ { "name": "John" }, { "age": { "$gt": 20 } } ] }
        ));
        assert!(matches(
            document.clone(),
            doc! { "$or": [ { "name": "Jane" }, { "age": 25 } ] }
        ));
        assert!(!matches(
            document,
            doc! { "$or": [ { "name": "Jane" }, { "age": 99 } ] }
        ));
    }

    #[test]
    fn dotted_paths_descend_into_documents() {
        let document = doc! { "address": { "city": "Cluj" } };
        assert!(matches(document, doc! { "address.city": "Cluj" }));
    }

    #[test]
    fn scalar_matches_array_element() {
        let document = doc! { "files": ["f1", "f2"] };
        assert!(matches(document, doc! { "files": "f1" }));
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let document = doc! { "age": 25 };
        let err = FilterEvaluator::new(&document)
            .matches(&doc! { "age": { "$regex": "x" } })
            .unwrap_err();
        assert!(matches!(err, DataError::Driver(_)));
    }
}
