use serde_json::Value;

use crate::parser::types::CheckSpec;

/// Object the structural checks inspect: the body itself, or the first
/// element when the body is a list.
pub fn subject(body: &Value) -> Option<&Value> {
    match body {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Names of required fields absent from the value, in declaration order.
pub fn missing_fields<'a>(value: &Value, required: &'a [String]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|field| value.get(field.as_str()).is_none())
        .map(|field| field.as_str())
        .collect()
}

/// Type-tolerant equality: JSON numbers compare by value regardless of
/// integer/float encoding, everything else compares structurally.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Apply one check to a response body. `${binding}` placeholders in
/// expected values must already be resolved by the caller. The failure
/// reason names exactly what was violated.
pub fn apply(check: &CheckSpec, body: &Value) -> Result<(), String> {
    match check {
        CheckSpec::NonEmptyList => match body {
            Value::Array(items) if !items.is_empty() => Ok(()),
            Value::Array(_) => Err("empty list returned".to_string()),
            _ => Err("expected a list response".to_string()),
        },

        CheckSpec::RequiredFields(fields) => {
            let value = subject(body).ok_or("no object to inspect in response")?;
            let missing = missing_fields(value, fields);
            if missing.is_empty() {
                Ok(())
            } else {
                Err(format!("missing required fields: [{}]", missing.join(", ")))
            }
        }

        CheckSpec::ForbidField(field) => {
            let value = subject(body).ok_or("no object to inspect in response")?;
            if value.get(field.as_str()).is_some() {
                Err(format!(
                    "storage-internal field '{}' present in response",
                    field
                ))
            } else {
                Ok(())
            }
        }

        CheckSpec::Equals { field, value } => {
            let object = subject(body).ok_or("no object to inspect in response")?;
            match object.get(field.as_str()) {
                Some(actual) if loose_eq(actual, value) => Ok(()),
                Some(actual) => Err(format!(
                    "field '{}' mismatch: expected {}, got {}",
                    field, value, actual
                )),
                None => Err(format!("field '{}' absent, expected {}", field, value)),
            }
        }

        CheckSpec::ListIncludes { field, value } => match body {
            Value::Array(items) => {
                if items
                    .iter()
                    .any(|item| item.get(field.as_str()).is_some_and(|v| loose_eq(v, value)))
                {
                    Ok(())
                } else {
                    Err(format!("no list element has {} = {}", field, value))
                }
            }
            _ => Err("expected a list response".to_string()),
        },

        CheckSpec::Contains { field, needle } => {
            let object = subject(body).ok_or("no object to inspect in response")?;
            match object.get(field.as_str()).and_then(Value::as_str) {
                Some(text) if text.contains(needle.as_str()) => Ok(()),
                Some(text) => Err(format!(
                    "field '{}' does not contain '{}': got '{}'",
                    field, needle, text
                )),
                None => Err(format!("field '{}' absent or not a string", field)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_named_exactly() {
        let body = json!({"id": "p1", "name": "هاتف", "price": 1000});
        let required: Vec<String> = ["id", "name", "nameEn", "price", "stock"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let err = apply(&CheckSpec::RequiredFields(required), &body).unwrap_err();
        assert_eq!(err, "missing required fields: [nameEn, stock]");
    }

    #[test]
    fn test_required_fields_inspect_first_list_element() {
        let body = json!([{"id": "c1", "slug": "electronics"}, {"noise": true}]);
        let required: Vec<String> = vec!["id".to_string(), "slug".to_string()];
        assert!(apply(&CheckSpec::RequiredFields(required), &body).is_ok());
    }

    #[test]
    fn test_forbid_storage_internal_id() {
        let clean = json!([{"id": "p1"}]);
        let leaky = json!([{"id": "p1", "_id": "64fe0c"}]);
        let check = CheckSpec::ForbidField("_id".to_string());

        assert!(apply(&check, &clean).is_ok());
        let err = apply(&check, &leaky).unwrap_err();
        assert!(err.contains("_id"));
    }

    #[test]
    fn test_equals_is_numeric_tolerant() {
        let body = json!({"walletBalance": 2000.0});
        let check = CheckSpec::Equals {
            field: "walletBalance".to_string(),
            value: json!(2000),
        };
        assert!(apply(&check, &body).is_ok());
    }

    #[test]
    fn test_equals_reports_both_values() {
        let body = json!({"total": 900001});
        let check = CheckSpec::Equals {
            field: "total".to_string(),
            value: json!(900000),
        };
        let err = apply(&check, &body).unwrap_err();
        assert!(err.contains("900000"));
        assert!(err.contains("900001"));
    }

    #[test]
    fn test_contains_marker() {
        let body = json!({"message": "E-commerce API is running v2"});
        let check = CheckSpec::Contains {
            field: "message".to_string(),
            needle: "E-commerce API is running".to_string(),
        };
        assert!(apply(&check, &body).is_ok());
    }

    #[test]
    fn test_non_empty_list_rejects_object() {
        let err = apply(&CheckSpec::NonEmptyList, &json!({"a": 1})).unwrap_err();
        assert!(err.contains("expected a list"));
        assert!(apply(&CheckSpec::NonEmptyList, &json!([])).is_err());
        assert!(apply(&CheckSpec::NonEmptyList, &json!([1])).is_ok());
    }

    #[test]
    fn test_list_includes_scans_every_element() {
        let body = json!([
            {"slug": "electronics"},
            {"slug": "clothing"},
            {"slug": "food"}
        ]);
        let includes = |slug: &str| CheckSpec::ListIncludes {
            field: "slug".to_string(),
            value: json!(slug),
        };

        assert!(apply(&includes("electronics"), &body).is_ok());
        assert!(apply(&includes("food"), &body).is_ok());
        let err = apply(&includes("furniture"), &body).unwrap_err();
        assert!(err.contains("furniture"));
        assert!(apply(&includes("food"), &json!({"slug": "food"})).is_err());
    }

    #[test]
    fn test_loose_eq_non_numeric() {
        assert!(loose_eq(&json!("wallet"), &json!("wallet")));
        assert!(!loose_eq(&json!("wallet"), &json!("card")));
        assert!(!loose_eq(&json!(null), &json!(0)));
    }
}
