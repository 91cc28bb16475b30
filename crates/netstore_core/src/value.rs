use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{NetstoreError, NetstoreResult};

/// Declared type of a mapped column, used to type NULL binds and reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Str,
    I64,
    F64,
    Bool,
    Json,
}

/// A single column value moving between an attribute object and a table row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Str(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Json(JsonValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(value) => Some(*value),
            Value::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|value| i32::try_from(value).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(value) => Some(*value),
            Value::I64(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            Value::I64(value) => Some(*value != 0),
            _ => None,
        }
    }

    /// Encodes a structured sub-object for a JSON column.
    pub fn json<T: Serialize>(value: &T) -> NetstoreResult<Self> {
        match serde_json::to_value(value).map_err(NetstoreError::codec)? {
            JsonValue::Null => Ok(Value::Null),
            json => Ok(Value::Json(json)),
        }
    }

    /// Decodes a JSON column; `Null` yields `None`.
    pub fn decode_json<T: DeserializeOwned>(self) -> NetstoreResult<Option<T>> {
        match self {
            Value::Null => Ok(None),
            Value::Json(json) => serde_json::from_value(json)
                .map(Some)
                .map_err(NetstoreError::codec),
            Value::Str(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(NetstoreError::codec),
            other => Err(NetstoreError::storage(format!(
                "expected json column value, got {other:?}"
            ))),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map(Value::F64).unwrap_or(Value::Null)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<Option<i64>> for Value {
    fn from(value: Option<i64>) -> Self {
        value.map(Value::I64).unwrap_or(Value::Null)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I64(i64::from(value))
    }
}

impl From<Option<i32>> for Value {
    fn from(value: Option<i32>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Option<bool>> for Value {
    fn from(value: Option<bool>) -> Self {
        value.map(Value::Bool).unwrap_or(Value::Null)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map(Value::Str).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::NetstoreError;

    use super::Value;

    #[test]
    fn numeric_accessors_widen() {
        assert_eq!(Value::I64(3).as_f64(), Some(3.0));
        assert_eq!(Value::I64(1).as_bool(), Some(true));
        assert_eq!(Value::I64(i64::MAX).as_i32(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn json_columns_decode_from_text_or_json() {
        let mut properties = BTreeMap::new();
        properties.insert("owner".to_string(), "tso".to_string());
        let encoded = Value::json(&properties).expect("encode");
        let decoded: BTreeMap<String, String> =
            encoded.decode_json().expect("decode").expect("present");
        assert_eq!(decoded, properties);

        let text = Value::Str("{\"owner\":\"tso\"}".to_string());
        let decoded: BTreeMap<String, String> =
            text.decode_json().expect("decode").expect("present");
        assert_eq!(decoded, properties);

        let missing: Option<BTreeMap<String, String>> =
            Value::Null.decode_json().expect("decode");
        assert!(missing.is_none());
    }

    #[test]
    fn json_encoding_failures_surface() {
        let keyed_by_pairs = BTreeMap::from([((1, 2), "a")]);
        assert!(matches!(
            Value::json(&keyed_by_pairs),
            Err(NetstoreError::Storage { .. })
        ));
        assert_eq!(Value::json(&None::<String>).expect("encode"), Value::Null);
    }

    #[test]
    fn json_rejects_scalars() {
        let result: Result<Option<Vec<String>>, _> = Value::F64(1.0).decode_json();
        assert!(result.is_err());
    }
}
