// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Helpers shared by the JSON payload decoders.
//!
//! The dashboard server is not consistent about identifier types: the same
//! field is a number in one endpoint and a decimal string in another.

use crate::PerfError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Status value the server uses for successful responses.
pub const STATUS_OK: &str = "OK";

/// Interprets a JSON value as a non-negative integer identifier.
pub fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
                .map(|v| v as u64)
        }),
        Value::String(raw) => raw.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// `deserialize_with` adapter for identifiers sent as numbers or strings.
pub fn flexible_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected an identifier, got {value}")))
}

/// Optional variant of [`flexible_id`]; `null` and a missing field map to `None`.
pub fn flexible_optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    id_from_value(&value)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected an identifier, got {value}")))
}

/// `deserialize_with` adapter for a list of identifiers.
pub fn flexible_id_list<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .iter()
        .map(|value| {
            id_from_value(value)
                .ok_or_else(|| D::Error::custom(format!("expected an identifier, got {value}")))
        })
        .collect()
}

/// Interprets a JSON value as a finite number; decimal strings are accepted.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// `deserialize_with` adapter for numbers sent as numbers or strings.
pub fn flexible_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
}

/// Fails with [`PerfError::Remote`] unless the payload's `status` is `OK`.
pub fn ensure_ok_status(payload: &Value) -> Result<(), PerfError> {
    match payload.get("status").and_then(Value::as_str) {
        Some(STATUS_OK) => Ok(()),
        Some(status) => Err(PerfError::remote(status)),
        None => Err(PerfError::transport("response payload has no status field")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ensure_ok_status, flexible_id, flexible_optional_id, id_from_value, number_from_value,
    };
    use crate::PerfError;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "flexible_id")]
        id: u64,
        #[serde(default, deserialize_with = "flexible_optional_id")]
        parent: Option<u64>,
    }

    #[test]
    fn ids_accept_numbers_and_decimal_strings() {
        assert_eq!(id_from_value(&json!(12)), Some(12));
        assert_eq!(id_from_value(&json!("34")), Some(34));
        assert_eq!(id_from_value(&json!(5.0)), Some(5));
        assert_eq!(id_from_value(&json!(5.5)), None);
        assert_eq!(id_from_value(&json!(-1)), None);
        assert_eq!(id_from_value(&json!("x")), None);
        assert_eq!(id_from_value(&json!(null)), None);
    }

    #[test]
    fn rows_decode_with_mixed_identifier_types() {
        let row: Row = serde_json::from_value(json!({"id": "7", "parent": 3})).expect("row");
        assert_eq!(row.id, 7);
        assert_eq!(row.parent, Some(3));

        let row: Row = serde_json::from_value(json!({"id": 8, "parent": null})).expect("row");
        assert_eq!(row.parent, None);

        let row: Row = serde_json::from_value(json!({"id": 9})).expect("row");
        assert_eq!(row.parent, None);

        assert!(serde_json::from_value::<Row>(json!({"id": true})).is_err());
    }

    #[test]
    fn numbers_accept_strings_but_not_garbage() {
        assert_eq!(number_from_value(&json!(1.5)), Some(1.5));
        assert_eq!(number_from_value(&json!(" 42 ")), Some(42.0));
        assert_eq!(number_from_value(&json!("NaN")), None);
        assert_eq!(number_from_value(&json!([1])), None);
    }

    #[test]
    fn status_check_distinguishes_remote_and_malformed() {
        assert!(ensure_ok_status(&json!({"status": "OK"})).is_ok());
        assert_eq!(
            ensure_ok_status(&json!({"status": "InvalidToken"})),
            Err(PerfError::remote("InvalidToken"))
        );
        assert!(matches!(
            ensure_ok_status(&json!({"triggerables": []})),
            Err(PerfError::Transport(_))
        ));
    }
}
