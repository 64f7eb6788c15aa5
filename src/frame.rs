//! Tabular view over accumulated annotations.

use crate::record::AnnotationRecord;

use serde::Serialize;
use serde_json::{Map, Value};

/// Columns are the union of field names across records, in order of first
/// appearance; rows follow accumulation order. Cells a record did not set are
/// `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnotationFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl AnnotationFrame {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        let records: Vec<&AnnotationRecord> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for name in record.field_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// One mapping per row, nulls included, keyed by column.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(v: Value) -> AnnotationRecord {
        match v {
            Value::Object(m) => AnnotationRecord::new(m),
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_frame() {
        let frame = AnnotationFrame::from_records(&Vec::<AnnotationRecord>::new());
        assert!(frame.is_empty());
        assert_eq!(frame.shape(), (0, 0));
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let records = vec![
            record(json!({"type": "a"})),
            record(json!({"type": "b", "pt_position": [1, 2, 3]})),
            record(json!({"note": "x", "type": "c"})),
        ];
        let frame = AnnotationFrame::from_records(&records);

        assert_eq!(frame.columns(), ["type", "pt_position", "note"]);
        assert_eq!(frame.shape(), (3, 3));
        assert_eq!(frame.get(0, "pt_position"), Some(&Value::Null));
        assert_eq!(frame.get(1, "pt_position"), Some(&json!([1, 2, 3])));
        assert_eq!(frame.get(3, "type"), None);
        assert_eq!(frame.get(0, "missing"), None);
        assert_eq!(
            frame.column("note"),
            Some(vec![&Value::Null, &Value::Null, &json!("x")])
        );
    }

    #[test]
    fn to_records_fills_nulls() {
        let records = vec![record(json!({"a": 1})), record(json!({"b": 2}))];
        let frame = AnnotationFrame::from_records(&records);
        let out: Vec<Value> = frame.to_records().into_iter().map(Value::Object).collect();
        assert_eq!(out, vec![json!({"a": 1, "b": null}), json!({"a": null, "b": 2})]);
    }
}
