//! Aggregation pipeline interpretation for the in-memory backend.
//!
//! Supports the stage subset the store's aggregate path needs: `$match`,
//! `$sort`, `$skip`, `$limit`, and `$count`. Unknown stages are driver
//! errors rather than silent no-ops.

use std::cmp::Ordering;

use bson::{Bson, Document};

use docstore_core::error::{DataError, DataResult};

use crate::evaluator::{Comparable, FilterEvaluator, resolve_path};

/// Runs a pipeline over a snapshot of a collection's documents.
pub(crate) fn run_pipeline(
    mut documents: Vec<Document>,
    pipeline: &[Document],
) -> DataResult<Vec<Document>> {
    for stage in pipeline {
        let mut entries = stage.iter();
        let (name, spec) = entries
            .next()
            .ok_or_else(|| DataError::Driver("empty pipeline stage".to_string()))?;
        if entries.next().is_some() {
            return Err(DataError::Driver(format!(
                "pipeline stage {name} must be the only key in its document"
            )));
        }

        documents = match name.as_str() {
            "$match" => apply_match(documents, spec)?,
            "$sort" => apply_sort(documents, spec)?,
            "$skip" => apply_skip(documents, spec)?,
            "$limit" => apply_limit(documents, spec)?,
            "$count" => apply_count(documents, spec)?,
            other => {
                return Err(DataError::Driver(format!(
                    "unsupported pipeline stage: {other}"
                )));
            }
        };
    }

    Ok(documents)
}

fn apply_match(documents: Vec<Document>, spec: &Bson) -> DataResult<Vec<Document>> {
    let filter = spec
        .as_document()
        .ok_or_else(|| DataError::Driver("$match expects a filter document".to_string()))?;
    FilterEvaluator::filter_documents(documents.iter(), filter)
}

fn apply_sort(mut documents: Vec<Document>, spec: &Bson) -> DataResult<Vec<Document>> {
    let keys = spec
        .as_document()
        .ok_or_else(|| DataError::Driver("$sort expects a document of sort keys".to_string()))?;

    // Later keys break ties left by earlier ones, so sort stably in
    // reverse key order.
    for (field, direction) in keys.iter().collect::<Vec<_>>().into_iter().rev() {
        let descending = match direction {
            Bson::Int32(-1) | Bson::Int64(-1) => true,
            Bson::Int32(1) | Bson::Int64(1) => false,
            other => {
                return Err(DataError::Driver(format!(
                    "$sort direction for {field} must be 1 or -1, got {other}"
                )));
            }
        };

        documents.sort_by(|a, b| {
            let left = resolve_path(a, field).map(Comparable::from).unwrap_or(Comparable::Null);
            let right = resolve_path(b, field).map(Comparable::from).unwrap_or(Comparable::Null);
            let ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
            if descending { ordering.reverse() } else { ordering }
        });
    }

    Ok(documents)
}

fn apply_skip(documents: Vec<Document>, spec: &Bson) -> DataResult<Vec<Document>> {
    let count = stage_count("$skip", spec)?;
    Ok(documents.into_iter().skip(count).collect())
}

fn apply_limit(documents: Vec<Document>, spec: &Bson) -> DataResult<Vec<Document>> {
    let count = stage_count("$limit", spec)?;
    Ok(documents.into_iter().take(count).collect())
}

fn apply_count(documents: Vec<Document>, spec: &Bson) -> DataResult<Vec<Document>> {
    let field = spec
        .as_str()
        .ok_or_else(|| DataError::Driver("$count expects a field name".to_string()))?;
    let mut counted = Document::new();
    counted.insert(field, documents.len() as i64);
    Ok(vec![counted])
}

fn stage_count(stage: &str, spec: &Bson) -> DataResult<usize> {
    match spec {
        Bson::Int32(n) if *n >= 0 => Ok(*n as usize),
        Bson::Int64(n) if *n >= 0 => Ok(*n as usize),
        other => Err(DataError::Driver(format!(
            "{stage} expects a non-negative integer, got {other}"
        ))),
    }
}
