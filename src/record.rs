//! Accepted annotation records.

use crate::schema::ID_FIELD;

use serde::Serialize;
use serde_json::{Map, Value};

/// One validated annotation in its flat representation: field name to value,
/// in field order, with unset fields left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnnotationRecord {
    values: Map<String, Value>,
}

impl AnnotationRecord {
    pub(crate) fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn id(&self) -> Option<i64> {
        self.values.get(ID_FIELD).and_then(Value::as_i64)
    }

    /// Names of the fields that were set, in field order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn as_flat(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_flat(self) -> Map<String, Value> {
        self.values
    }
}
