use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

/// Scenario State: values produced by one step and consumed by later steps
/// in the same scenario. Written once by the producing step, read-only
/// afterwards; discarded when the scenario ends.
#[derive(Debug, Default)]
pub struct ScenarioContext {
    bindings: HashMap<String, Value>,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Replace `${binding}` placeholders in a string. Unknown placeholders
    /// are kept as-is so the failure reason shows what was never bound.
    pub fn substitute(&self, text: &str) -> String {
        let re = Regex::new(r"\$\{([a-zA-Z0-9_.]+)\}").unwrap();
        re.replace_all(text, |caps: &regex::Captures| {
            match self.bindings.get(&caps[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => format!("${{{}}}", &caps[1]),
            }
        })
        .to_string()
    }

    /// Substitute placeholders throughout a JSON value. A string that is
    /// exactly one placeholder is replaced by the bound value itself, so
    /// numeric bindings keep their type; embedded placeholders interpolate
    /// as text.
    pub fn substitute_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => {
                if let Some(name) = exact_placeholder(s) {
                    if let Some(bound) = self.bindings.get(name) {
                        return bound.clone();
                    }
                }
                Value::String(self.substitute(s))
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.substitute_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.substitute_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Extract a value from a response body by dot path ("$" for the whole
    /// body, "items.0.price" descends through objects and arrays).
    pub fn extract(body: &Value, path: &str) -> Option<Value> {
        if path == "$" || path == "." {
            return Some(body.clone());
        }
        let pointer = format!("/{}", path.replace('.', "/"));
        body.pointer(&pointer).cloned()
    }
}

/// If the string is exactly `${name}`, return `name`.
fn exact_placeholder(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("${")?.strip_suffix('}')?;
    if !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        Some(inner)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitute_path() {
        let mut ctx = ScenarioContext::new();
        ctx.bind("userUid", json!("test_user_ab12cd34"));
        assert_eq!(
            ctx.substitute("users/${userUid}"),
            "users/test_user_ab12cd34"
        );
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let ctx = ScenarioContext::new();
        assert_eq!(ctx.substitute("users/${userUid}"), "users/${userUid}");
    }

    #[test]
    fn test_exact_placeholder_keeps_value_type() {
        let mut ctx = ScenarioContext::new();
        ctx.bind("amount", json!(500000));

        let body = json!({"amount": "${amount}", "note": "recharge of ${amount}"});
        let substituted = ctx.substitute_value(&body);

        assert_eq!(substituted["amount"], json!(500000));
        assert_eq!(substituted["note"], json!("recharge of 500000"));
    }

    #[test]
    fn test_extract_dot_path() {
        let body = json!({"items": [{"price": 850000}], "uid": "u1"});
        assert_eq!(
            ScenarioContext::extract(&body, "items.0.price"),
            Some(json!(850000))
        );
        assert_eq!(ScenarioContext::extract(&body, "uid"), Some(json!("u1")));
        assert_eq!(ScenarioContext::extract(&body, "missing"), None);
        assert_eq!(ScenarioContext::extract(&body, "$"), Some(body.clone()));
    }
}
