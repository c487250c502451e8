//! Conversion between documents and SQLite values.

use rusqlite::types::{Value, ValueRef};
use serde_json::{Map, Number, Value as JsonValue};

use libdata_core::Document;
use libdata_core::doc::encode_base64;

/// Convert a document field to a SQLite value.
///
/// Arrays and objects are stored as JSON text.
pub fn to_sqlite_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Integer(i64::from(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::Text(value.to_string()),
    }
}

/// Convert a SQLite value to a document field.
///
/// Text that holds a JSON array or object is decoded back into one.
pub fn from_sqlite_value(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) => {
            let s = String::from_utf8_lossy(bytes).into_owned();
            if s.starts_with('{') || s.starts_with('[') {
                serde_json::from_str(&s).unwrap_or(JsonValue::String(s))
            } else {
                JsonValue::String(s)
            }
        }
        ValueRef::Blob(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => JsonValue::String(s.to_string()),
            Err(_) => JsonValue::String(encode_base64(bytes)),
        },
    }
}

/// Read a whole row into an object document.
pub fn row_to_document(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Document> {
    let mut map = Map::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        map.insert(column.clone(), from_sqlite_value(row.get_ref(i)?));
    }
    Ok(JsonValue::Object(map))
}

/// Column type declared for a field when creating a table from a document.
pub fn column_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Bool(_) => "INTEGER",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "INTEGER",
        JsonValue::Number(_) => "REAL",
        JsonValue::Null | JsonValue::String(_) | JsonValue::Array(_) | JsonValue::Object(_) => {
            "TEXT"
        }
    }
}

/// Quote an identifier for use in SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
