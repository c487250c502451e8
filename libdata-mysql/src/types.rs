//! Conversion between documents and MySQL values.

use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::{Column, Params, Row, Value};
use serde_json::{Map, Number, Value as JsonValue};

use libdata_core::Document;
use libdata_core::doc::encode_base64;

/// How the bytes of a column are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteKind {
    /// Character data.
    Text,
    /// A `JSON` column.
    Json,
    /// `BINARY`, `VARBINARY` and `BLOB` columns.
    Binary,
}

impl ByteKind {
    /// Classify a result column.
    pub fn of(column: &Column) -> Self {
        if column.column_type() == ColumnType::MYSQL_TYPE_JSON {
            Self::Json
        } else if column.flags().contains(ColumnFlags::BINARY_FLAG)
            && column.character_set() == BINARY_CHARSET
        {
            Self::Binary
        } else {
            Self::Text
        }
    }
}

/// Collation id of the `binary` character set.
const BINARY_CHARSET: u16 = 63;

/// Convert a document field to a MySQL value.
///
/// Arrays and objects are sent as JSON text.
pub fn to_mysql_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::NULL,
        JsonValue::Bool(b) => Value::Int(i64::from(*b)),
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Value::Int(i),
            (None, Some(u)) => Value::UInt(u),
            _ => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Value::Bytes(s.as_bytes().to_vec()),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::Bytes(value.to_string().into_bytes()),
    }
}

/// Positional statement parameters.
pub fn to_params(values: &[JsonValue]) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.iter().map(to_mysql_value).collect())
    }
}

/// Convert a MySQL value to a document field.
///
/// Dates become ISO 8601 text, times become `[-]HHH:MM:SS.ffffff`.
pub fn from_mysql_value(value: Value, kind: ByteKind) -> JsonValue {
    match value {
        Value::NULL => JsonValue::Null,
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::UInt(u) => JsonValue::Number(u.into()),
        Value::Float(f) => float(f64::from(f)),
        Value::Double(d) => float(d),
        Value::Bytes(bytes) => match kind {
            ByteKind::Json => serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())),
            ByteKind::Text | ByteKind::Binary => match String::from_utf8(bytes) {
                Ok(s) => JsonValue::String(s),
                Err(e) => JsonValue::String(encode_base64(e.as_bytes())),
            },
        },
        Value::Date(year, month, day, hour, minute, second, micro) => {
            let mut text = format!("{year:04}-{month:02}-{day:02}");
            if (hour, minute, second, micro) != (0, 0, 0, 0) {
                text.push_str(&format!("T{hour:02}:{minute:02}:{second:02}"));
                if micro != 0 {
                    text.push_str(&format!(".{micro:06}"));
                }
            }
            JsonValue::String(text)
        }
        Value::Time(negative, days, hours, minutes, seconds, micro) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micro != 0 {
                text.push_str(&format!(".{micro:06}"));
            }
            JsonValue::String(text)
        }
    }
}

fn float(f: f64) -> JsonValue {
    Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

/// Read a whole row into an object document.
pub fn row_to_document(mut row: Row) -> Document {
    let columns = row.columns();
    let mut map = Map::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        let value = row.take::<Value, _>(i).unwrap_or(Value::NULL);
        map.insert(
            column.name_str().into_owned(),
            from_mysql_value(value, ByteKind::of(column)),
        );
    }
    JsonValue::Object(map)
}

/// Quote an identifier for use in SQL.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_to_mysql_value() {
        assert_eq!(to_mysql_value(&json!(null)), Value::NULL);
        assert_eq!(to_mysql_value(&json!(true)), Value::Int(1));
        assert_eq!(to_mysql_value(&json!(-5)), Value::Int(-5));
        assert_eq!(to_mysql_value(&json!(u64::MAX)), Value::UInt(u64::MAX));
        assert_eq!(to_mysql_value(&json!(2.5)), Value::Double(2.5));
        assert_eq!(to_mysql_value(&json!("hi")), Value::Bytes(b"hi".to_vec()));
        assert_eq!(
            to_mysql_value(&json!({"a": [1]})),
            Value::Bytes(br#"{"a":[1]}"#.to_vec())
        );
    }

    #[test]
    fn test_params() {
        assert_eq!(to_params(&[]), Params::Empty);
        assert_eq!(
            to_params(&[json!(1), json!("x")]),
            Params::Positional(vec![Value::Int(1), Value::Bytes(b"x".to_vec())])
        );
    }

    #[test]
    fn test_from_mysql_value() {
        assert_eq!(from_mysql_value(Value::NULL, ByteKind::Text), json!(null));
        assert_eq!(from_mysql_value(Value::UInt(7), ByteKind::Text), json!(7));
        assert_eq!(from_mysql_value(Value::Float(0.5), ByteKind::Text), json!(0.5));
        assert_eq!(
            from_mysql_value(Value::Bytes(b"12.50".to_vec()), ByteKind::Text),
            json!("12.50")
        );
        assert_eq!(
            from_mysql_value(Value::Bytes(br#"{"tags": ["a"]}"#.to_vec()), ByteKind::Json),
            json!({"tags": ["a"]})
        );
        // Text that looks like JSON stays text outside JSON columns.
        assert_eq!(
            from_mysql_value(Value::Bytes(b"[1]".to_vec()), ByteKind::Text),
            json!("[1]")
        );
        assert_eq!(
            from_mysql_value(Value::Bytes(vec![0xff, 0x00, 0x10]), ByteKind::Binary),
            json!("/wAQ")
        );
    }

    #[test]
    fn test_dates_and_times() {
        assert_eq!(
            from_mysql_value(Value::Date(2024, 3, 9, 0, 0, 0, 0), ByteKind::Text),
            json!("2024-03-09")
        );
        assert_eq!(
            from_mysql_value(Value::Date(2024, 3, 9, 14, 5, 0, 120), ByteKind::Text),
            json!("2024-03-09T14:05:00.000120")
        );
        assert_eq!(
            from_mysql_value(Value::Time(true, 1, 2, 3, 4, 0), ByteKind::Text),
            json!("-26:03:04")
        );
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "`users`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }
}
