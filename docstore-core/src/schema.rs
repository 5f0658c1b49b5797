//! Schema validation of write payloads.
//!
//! Every mutation runs its payload through an externally supplied
//! [`Schema`] before touching the database. A payload is either one
//! document or a sequence of documents; a batch validates as a whole and
//! surfaces the first structural error.

use bson::{Bson, Document};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{DataError, DataResult};

/// An externally supplied schema definition.
///
/// Implementations validate and normalize a single document; the
/// many-document variant is derived and stops at the first failure.
pub trait Schema: Send + Sync {
    /// Validates one document, returning its typed/normalized form.
    fn load(&self, document: Document) -> DataResult<Document>;

    /// Validates a sequence of documents, preserving order.
    fn load_many(&self, documents: Vec<Document>) -> DataResult<Vec<Document>> {
        documents.into_iter().map(|doc| self.load(doc)).collect()
    }
}

/// A write payload: one document or many.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A single document.
    One(Document),
    /// An ordered sequence of documents.
    Many(Vec<Document>),
}

impl From<Document> for Payload {
    fn from(document: Document) -> Self {
        Payload::One(document)
    }
}

impl From<Vec<Document>> for Payload {
    fn from(documents: Vec<Document>) -> Self {
        Payload::Many(documents)
    }
}

impl Payload {
    /// Runs this payload through a schema, preserving its shape.
    pub fn validate<S: Schema + ?Sized>(self, schema: &S) -> DataResult<Payload> {
        match self {
            Payload::One(document) => Ok(Payload::One(schema.load(document)?)),
            Payload::Many(documents) => Ok(Payload::Many(schema.load_many(documents)?)),
        }
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// 64-bit integer; accepts integer BSON values, whole doubles, and
    /// parseable strings.
    Integer,
    /// Double; accepts integer BSON values and parseable strings.
    Float,
    /// Boolean; accepts `"true"`/`"false"` strings.
    Boolean,
    /// BSON datetime; accepts RFC 3339 and `%Y-%m-%d %H:%M:%S` strings.
    DateTime,
    /// Array with elements of a given type.
    List(Box<FieldType>),
    /// Embedded document.
    Document,
    /// Any value, no coercion.
    Any,
}

#[derive(Debug, Clone)]
struct FieldSpec {
    name: String,
    field_type: FieldType,
    required: bool,
}

/// A concrete [`Schema`] built from ordered field declarations.
///
/// # Example
///
/// ```ignore
/// use docstore_core::schema::{DocumentSchema, FieldType};
///
/// let schema = DocumentSchema::builder()
///     .optional("_id", FieldType::String)
///     .required("name", FieldType::String)
///     .required("age", FieldType::Integer)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct DocumentSchema {
    fields: Vec<FieldSpec>,
}

impl DocumentSchema {
    /// Creates a new schema builder.
    pub fn builder() -> DocumentSchemaBuilder {
        DocumentSchemaBuilder { fields: Vec::new() }
    }
}

/// Builder for [`DocumentSchema`].
#[derive(Debug, Default)]
pub struct DocumentSchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl DocumentSchemaBuilder {
    /// Declares a required field.
    pub fn required(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec { name: name.into(), field_type, required: true });
        self
    }

    /// Declares an optional field.
    pub fn optional(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec { name: name.into(), field_type, required: false });
        self
    }

    /// Builds the schema.
    pub fn build(self) -> DocumentSchema {
        DocumentSchema { fields: self.fields }
    }
}

impl Schema for DocumentSchema {
    fn load(&self, mut document: Document) -> DataResult<Document> {
        for spec in &self.fields {
            match document.get(&spec.name) {
                Some(value) => {
                    let coerced = coerce(&spec.name, value.clone(), &spec.field_type)?;
                    document.insert(spec.name.clone(), coerced);
                }
                None if spec.required => {
                    return Err(DataError::Validation(format!(
                        "field '{}' is required",
                        spec.name
                    )));
                }
                None => {}
            }
        }
        // Undeclared fields pass through unvalidated.
        Ok(document)
    }
}

fn coerce(field: &str, value: Bson, expected: &FieldType) -> DataResult<Bson> {
    match expected {
        FieldType::Any => Ok(value),

        FieldType::String => match value {
            Bson::String(_) => Ok(value),
            other => Err(type_error(field, "string", &other)),
        },

        FieldType::Integer => match value {
            Bson::Int32(n) => Ok(Bson::Int64(n as i64)),
            Bson::Int64(_) => Ok(value),
            Bson::Double(d) if d.fract() == 0.0 => Ok(Bson::Int64(d as i64)),
            Bson::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Bson::Int64)
                .map_err(|_| type_error(field, "integer", &Bson::String(s))),
            other => Err(type_error(field, "integer", &other)),
        },

        FieldType::Float => match value {
            Bson::Double(_) => Ok(value),
            Bson::Int32(n) => Ok(Bson::Double(n as f64)),
            Bson::Int64(n) => Ok(Bson::Double(n as f64)),
            Bson::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Bson::Double)
                .map_err(|_| type_error(field, "float", &Bson::String(s))),
            other => Err(type_error(field, "float", &other)),
        },

        FieldType::Boolean => match value {
            Bson::Boolean(_) => Ok(value),
            Bson::String(s) => match s.as_str() {
                "true" => Ok(Bson::Boolean(true)),
                "false" => Ok(Bson::Boolean(false)),
                _ => Err(type_error(field, "boolean", &Bson::String(s))),
            },
            other => Err(type_error(field, "boolean", &other)),
        },

        FieldType::DateTime => match value {
            Bson::DateTime(_) => Ok(value),
            Bson::String(s) => parse_datetime(&s)
                .map(bson::DateTime::from_chrono)
                .map(Bson::DateTime)
                .ok_or_else(|| type_error(field, "datetime", &Bson::String(s))),
            other => Err(type_error(field, "datetime", &other)),
        },

        FieldType::List(inner) => match value {
            Bson::Array(items) => Ok(Bson::Array(
                items
                    .into_iter()
                    .map(|item| coerce(field, item, inner))
                    .collect::<DataResult<Vec<Bson>>>()?,
            )),
            other => Err(type_error(field, "list", &other)),
        },

        FieldType::Document => match value {
            Bson::Document(_) => Ok(value),
            other => Err(type_error(field, "document", &other)),
        },
    }
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn type_error(field: &str, expected: &str, got: &Bson) -> DataError {
    DataError::Validation(format!(
        "field '{field}' expected type '{expected}', got '{got}'"
    ))
}
