use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected a JSON array, got {found}")]
    NotAnArray { found: &'static str },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Normalized<T> {
    pub items: Vec<T>,
    pub failure: Option<ShapeError>,
    /// Array elements that could not be read as `T`.
    pub dropped: usize,
}

impl<T> Normalized<T> {
    fn failed(err: ShapeError) -> Self {
        Self {
            items: Vec::new(),
            failure: Some(err),
            dropped: 0,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Accepts an array body as-is; anything else becomes an empty list plus a failure.
pub fn normalize(body: Value) -> Normalized<Value> {
    match body {
        Value::Array(items) => Normalized {
            items,
            failure: None,
            dropped: 0,
        },
        other => {
            let err = ShapeError::NotAnArray {
                found: json_kind(&other),
            };
            warn!(error = %err, "response body is not a list; using no records");
            Normalized::failed(err)
        }
    }
}

pub fn normalize_as<T: DeserializeOwned>(body: Value) -> Normalized<T> {
    let raw = normalize(body);
    if raw.failure.is_some() {
        return Normalized {
            items: Vec::new(),
            failure: raw.failure,
            dropped: 0,
        };
    }
    let total = raw.items.len();
    let items: Vec<T> = raw
        .items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    let dropped = total - items.len();
    if dropped > 0 {
        debug!(dropped, total, "skipped unreadable records");
    }
    Normalized {
        items,
        failure: None,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Student;
    use serde_json::json;

    #[test]
    fn array_passes_through_unchanged() {
        let body = json!([{"id": 1}, 2, "x"]);
        let out = normalize(body.clone());
        assert!(out.failure.is_none());
        assert_eq!(Value::Array(out.items), body);
    }

    #[test]
    fn normalizing_twice_is_identity() {
        let once = normalize(json!([{"id": 1, "fullname": "Ann"}]));
        let twice = normalize(Value::Array(once.items.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn non_array_bodies_become_empty() {
        for body in [json!(null), json!({"error": "boom"}), json!("nope"), json!(3)] {
            let out = normalize(body);
            assert!(out.items.is_empty());
            assert!(matches!(out.failure, Some(ShapeError::NotAnArray { .. })));
        }
    }

    #[test]
    fn typed_normalization_drops_unreadable_elements() {
        let out: Normalized<Student> = normalize_as(json!([
            {"id": 1, "fullname": "Ann Lee", "department": "Math", "courses": []},
            {"fullname": "missing id"},
            42
        ]));
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.dropped, 2);
        assert!(out.failure.is_none());
    }
}
