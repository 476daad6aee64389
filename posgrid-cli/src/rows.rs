//! Rows loaded from a JSON file.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use posgrid_lib::CellValue;
use posgrid_lib::TableRow;
use posgrid_lib::column::ColumnDescriptor;
use serde_json::Map;
use serde_json::Value;

use crate::error::CliError;

/// One JSON object bound as a table row.
#[derive(Debug, Clone)]
pub struct JsonRow {
    key: String,
    fields: Arc<Map<String, Value>>,
}

impl JsonRow {
    pub fn new(key: String, fields: Map<String, Value>) -> Self {
        Self {
            key,
            fields: Arc::new(fields),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TableRow for JsonRow {
    type Key = String;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn cell_text(&self, column_id: &str) -> String {
        match self.fields.get(column_id) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    fn cell_value(&self, column_id: &str) -> CellValue {
        match self.fields.get(column_id) {
            None | Some(Value::Null) => CellValue::Empty,
            Some(Value::Bool(b)) => CellValue::Bool(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
            },
            Some(Value::String(s)) => CellValue::Text(s.clone()),
            Some(other) => CellValue::Text(other.to_string()),
        }
    }
}

/// Rows parsed from a file, with the union of their field names.
pub struct RowFile {
    pub rows: Vec<JsonRow>,
    pub fields: Vec<String>,
}

impl RowFile {
    /// Read a JSON array of objects.
    ///
    /// Each row is keyed by `key_field` when present, otherwise by its
    /// position in the file.
    pub fn load(path: &Path, key_field: &str) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, key_field)
    }

    pub fn parse(text: &str, key_field: &str) -> Result<Self, CliError> {
        let Value::Array(items) = serde_json::from_str(text)? else {
            return Err(CliError::NotRows);
        };

        let mut fields = BTreeSet::new();
        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let Value::Object(map) = item else {
                return Err(CliError::NotRows);
            };
            fields.extend(map.keys().cloned());
            let key = match map.get(key_field) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => index.to_string(),
            };
            rows.push(JsonRow::new(key, map));
        }

        Ok(Self {
            rows,
            fields: fields.into_iter().collect(),
        })
    }

    /// One sortable, searchable text column per field.
    pub fn columns(&self, only: &[String]) -> Result<Vec<ColumnDescriptor<JsonRow>>, CliError> {
        let ids: Vec<&String> = if only.is_empty() {
            self.fields.iter().collect()
        } else {
            if let Some(missing) = only.iter().find(|id| !self.fields.contains(id)) {
                return Err(CliError::UnknownColumn(missing.clone()));
            }
            only.iter().collect()
        };
        Ok(ids
            .into_iter()
            .map(|id| ColumnDescriptor::new(id.as_str(), id.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = r#"[
        {"sku": "B-1", "name": "Burger", "price": 8.5, "stock": 12},
        {"sku": "F-2", "name": "Fries", "price": 3, "vegan": true},
        {"name": "Water", "price": null}
    ]"#;

    #[test]
    fn test_parse_keys_and_fields() {
        let file = RowFile::parse(MENU, "sku").unwrap();
        let keys: Vec<String> = file.rows.iter().map(TableRow::key).collect();
        assert_eq!(keys, ["B-1", "F-2", "2"]);
        assert_eq!(file.fields, ["name", "price", "sku", "stock", "vegan"]);
    }

    #[test]
    fn test_cell_values() {
        let file = RowFile::parse(MENU, "sku").unwrap();
        assert_eq!(file.rows[0].cell_value("price"), CellValue::Number(8.5));
        assert_eq!(file.rows[1].cell_value("price"), CellValue::Integer(3));
        assert_eq!(file.rows[1].cell_value("vegan"), CellValue::Bool(true));
        assert_eq!(file.rows[2].cell_value("price"), CellValue::Empty);
        assert_eq!(file.rows[2].cell_text("stock"), "");
        assert_eq!(file.rows[0].cell_text("name"), "Burger");
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(
            RowFile::parse(r#"{"sku": 1}"#, "sku"),
            Err(CliError::NotRows)
        ));
    }

    #[test]
    fn test_unknown_column() {
        let file = RowFile::parse(MENU, "sku").unwrap();
        assert!(file.columns(&["name".into()]).is_ok());
        assert!(matches!(
            file.columns(&["ghost".into()]),
            Err(CliError::UnknownColumn(_))
        ));
    }
}
