//! Scenario variables
//!
//! Values captured during a run live in one of three scopes. Lookups check
//! the scenario first, then the feature, then the global scope.
//! `${name}` references in strings and JSON documents are replaced with
//! the stored values; unknown names are left as written.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

/// Regex for matching variable references: ${name}
static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\s*([^}\s]+)\s*\}").unwrap());

/// Lifetime of a stored variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Cleared before every scenario
    #[default]
    Scenario,
    /// Cleared before every feature
    Feature,
    /// Kept for the whole run
    Global,
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "scenario" => Ok(Scope::Scenario),
            "feature" => Ok(Scope::Feature),
            "global" => Ok(Scope::Global),
            other => Err(Error::config(format!("Unknown variable scope: {other}"))),
        }
    }
}

/// Variables stored per scope
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    scopes: HashMap<Scope, HashMap<String, Value>>,
}

impl VariableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value
    pub fn set(&mut self, scope: Scope, name: impl Into<String>, value: Value) {
        self.scopes
            .entry(scope)
            .or_default()
            .insert(name.into(), value);
    }

    /// Look a value up, innermost scope first
    pub fn get(&self, name: &str) -> Option<&Value> {
        [Scope::Scenario, Scope::Feature, Scope::Global]
            .iter()
            .find_map(|scope| self.scopes.get(scope)?.get(name))
    }

    /// Drop every value in a scope
    pub fn clear(&mut self, scope: Scope) {
        self.scopes.remove(&scope);
    }

    /// Replace `${name}` references in a string
    pub fn interpolate_str(&self, template: &str) -> String {
        VARIABLE_REGEX
            .replace_all(template, |caps: &regex::Captures<'_>| match self.get(&caps[1]) {
                Some(value) => value_to_string(value),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Replace `${name}` references in every string and key of a JSON value
    pub fn interpolate(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.interpolate_str(s)),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (self.interpolate_str(k), self.interpolate(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.interpolate(v)).collect()),
            _ => value.clone(),
        }
    }

    /// Resolve a step value
    ///
    /// `$.path` reads the last response, `$name` reads a stored variable
    /// (kept verbatim when unknown), anything else is interpolated text.
    pub fn resolve(&self, raw: &str, response: Option<&Value>) -> Result<Value> {
        let raw = raw.trim();
        if raw.starts_with("$.") || raw == "$" {
            let response = response.ok_or_else(|| Error::variable(raw))?;
            return extract(response, raw);
        }
        if let Some(name) = raw.strip_prefix('$').filter(|n| !n.starts_with('{')) {
            return Ok(self
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::String(raw.to_string())));
        }
        Ok(Value::String(self.interpolate_str(raw)))
    }

    /// Join `base` and `+`-separated values into a path, e.g.
    /// `"users" + $user_id + 'posts'` becomes `users/42/posts`
    pub fn join_path(&self, base: &str, values: &str, response: Option<&Value>) -> Result<String> {
        let mut segments = vec![self.interpolate_str(base)];
        for part in values.split('+') {
            let part = part.trim().trim_matches(|c: char| c == '"' || c == '\'');
            if part.is_empty() {
                continue;
            }
            segments.push(value_to_string(&self.resolve(part, response)?));
        }
        Ok(segments.join("/"))
    }
}

/// Extract a value by path, e.g. `$.data.items[0].id`
pub fn extract(value: &Value, path: &str) -> Result<Value> {
    let trimmed = path.strip_prefix("$.").or_else(|| path.strip_prefix('$')).unwrap_or(path);
    let mut current = value;

    for segment in trimmed.split('.').filter(|s| !s.is_empty()) {
        let (key, indices) = split_indices(segment).ok_or_else(|| Error::variable(path))?;

        if !key.is_empty() {
            current = current.get(key).ok_or_else(|| Error::variable(path))?;
        }
        for index in indices {
            current = current.get(index).ok_or_else(|| Error::variable(path))?;
        }
    }

    Ok(current.clone())
}

/// Split `items[0][1]` into `("items", [0, 1])`
fn split_indices(segment: &str) -> Option<(&str, Vec<usize>)> {
    let Some(open) = segment.find('[') else {
        return Some((segment, Vec::new()));
    };

    let key = &segment[..open];
    let mut indices = Vec::new();
    let mut rest = &segment[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indices.push(inner[..close].trim().parse().ok()?);
        rest = &inner[close + 1..];
    }
    Some((key, indices))
}

/// Convert a JSON value to a string for substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_precedence() {
        let mut store = VariableStore::new();
        store.set(Scope::Global, "id", json!("global"));
        assert_eq!(store.get("id"), Some(&json!("global")));

        store.set(Scope::Feature, "id", json!("feature"));
        assert_eq!(store.get("id"), Some(&json!("feature")));

        store.set(Scope::Scenario, "id", json!("scenario"));
        assert_eq!(store.get("id"), Some(&json!("scenario")));

        store.clear(Scope::Scenario);
        assert_eq!(store.get("id"), Some(&json!("feature")));
        store.clear(Scope::Feature);
        assert_eq!(store.get("id"), Some(&json!("global")));
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("global".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("Feature".parse::<Scope>().unwrap(), Scope::Feature);
        assert_eq!("".parse::<Scope>().unwrap(), Scope::Scenario);
        assert!("session".parse::<Scope>().is_err());
    }

    #[test]
    fn test_interpolate_str() {
        let mut store = VariableStore::new();
        store.set(Scope::Scenario, "user_id", json!(42));
        store.set(Scope::Global, "name", json!("alice"));

        assert_eq!(
            store.interpolate_str("users/${user_id}/profile?name=${ name }"),
            "users/42/profile?name=alice"
        );
        assert_eq!(store.interpolate_str("keep ${unknown}"), "keep ${unknown}");
        assert_eq!(store.interpolate_str("no refs"), "no refs");
    }

    #[test]
    fn test_interpolate_value() {
        let mut store = VariableStore::new();
        store.set(Scope::Scenario, "token", json!("t-1"));
        store.set(Scope::Scenario, "field", json!("owner"));

        let input = json!({
            "auth": "${token}",
            "${field}": ["${token}", 1, true],
            "nested": {"value": "x-${token}"}
        });
        assert_eq!(
            store.interpolate(&input),
            json!({
                "auth": "t-1",
                "owner": ["t-1", 1, true],
                "nested": {"value": "x-t-1"}
            })
        );
    }

    #[test]
    fn test_resolve_forms() {
        let mut store = VariableStore::new();
        store.set(Scope::Global, "token", json!("abc"));
        store.set(Scope::Scenario, "id", json!(42));
        let response = json!({"data": {"name": "orders"}});

        assert_eq!(store.resolve("$.data.name", Some(&response)).unwrap(), json!("orders"));
        assert_eq!(store.resolve("$id", None).unwrap(), json!(42));
        assert_eq!(store.resolve(" $token ", None).unwrap(), json!("abc"));
        assert_eq!(store.resolve("$missing", None).unwrap(), json!("$missing"));
        assert_eq!(store.resolve("Bearer ${token}", None).unwrap(), json!("Bearer abc"));
        assert_eq!(store.resolve("plain", None).unwrap(), json!("plain"));
        assert!(matches!(
            store.resolve("$.data.name", None),
            Err(Error::Variable { .. })
        ));
    }

    #[test]
    fn test_join_path() {
        let mut store = VariableStore::new();
        store.set(Scope::Feature, "user_id", json!(42));
        let response = json!({"items": [{"slug": "first"}]});

        assert_eq!(
            store
                .join_path("users", "$user_id + 'posts' + \"drafts\"", None)
                .unwrap(),
            "users/42/posts/drafts"
        );
        assert_eq!(
            store
                .join_path("items", "$.items[0].slug", Some(&response))
                .unwrap(),
            "items/first"
        );
        assert_eq!(store.join_path("users", " + ", None).unwrap(), "users");
        assert!(store.join_path("users", "$.nope", Some(&response)).is_err());
    }

    #[test]
    fn test_extract_paths() {
        let doc = json!({
            "data": {
                "items": [{"id": 7}, {"id": 8, "tags": [["a", "b"]]}],
                "token": "abc"
            }
        });

        assert_eq!(extract(&doc, "$.data.token").unwrap(), json!("abc"));
        assert_eq!(extract(&doc, "data.items[1].id").unwrap(), json!(8));
        assert_eq!(extract(&doc, "$.data.items[1].tags[0][1]").unwrap(), json!("b"));
        assert_eq!(extract(&doc, "$").unwrap(), doc);
    }

    #[test]
    fn test_extract_missing() {
        let doc = json!({"data": {"items": []}});
        assert!(matches!(
            extract(&doc, "$.data.items[0]"),
            Err(Error::Variable { .. })
        ));
        assert!(extract(&doc, "$.nope").is_err());
        assert!(extract(&doc, "$.data.items[x]").is_err());
    }
}
