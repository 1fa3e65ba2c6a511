use std::collections::BTreeMap;

use crate::model::Timestamp;
use crate::value::MapValue;

/// A single field value in a document, as delivered over the watch stream.
///
/// The full value type in a production client also carries references,
/// geo points, bytes and arrays; query evaluation and wire encoding for those
/// are out of scope here (§1 Non-goals), so only the variants the aggregator
/// and existence-filter reconciliation actually touch are kept.
#[derive(Clone, Debug, PartialEq)]
pub struct FirestoreValue {
    kind: ValueKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Map(MapValue),
}

impl FirestoreValue {
    pub fn null() -> Self {
        Self { kind: ValueKind::Null }
    }

    pub fn from_bool(value: bool) -> Self {
        Self { kind: ValueKind::Boolean(value) }
    }

    pub fn from_integer(value: i64) -> Self {
        Self { kind: ValueKind::Integer(value) }
    }

    pub fn from_double(value: f64) -> Self {
        Self { kind: ValueKind::Double(value) }
    }

    pub fn from_timestamp(value: Timestamp) -> Self {
        Self { kind: ValueKind::Timestamp(value) }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self { kind: ValueKind::String(value.into()) }
    }

    pub fn from_map(map: BTreeMap<String, FirestoreValue>) -> Self {
        Self { kind: ValueKind::Map(MapValue::new(map)) }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }
}
