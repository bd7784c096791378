//! Expected-response matching
//!
//! Compares an actual JSON document against an expected template. Plain
//! values must be equal; string markers describe a shape instead:
//!
//! | Marker            | Accepts                                  |
//! |-------------------|------------------------------------------|
//! | `#ignore`         | anything, including a missing field      |
//! | `#present`        | any non-null value                       |
//! | `#null`           | null or a missing field                  |
//! | `#notnull`        | any non-null value                       |
//! | `#string` etc.    | a value of that JSON type                |
//! | `#[]`             | an empty array                           |
//! | `#regex <re>`     | a string whose start matches `<re>`      |
//! | `##<name>`        | a missing/null field, or `#<name>`       |
//!
//! Objects are matched on the expected keys only. A one-element expected
//! array holding an object, array or string is a template for every item.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;

const OPTIONAL_PREFIX: &str = "##";
const REGEX_PREFIX: &str = "#regex ";

/// Match `actual` against `expected`, failing with every mismatch found
pub fn assert_matches(actual: &Value, expected: &Value) -> Result<()> {
    let errors = mismatches(actual, expected);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Mismatch { errors })
    }
}

/// Collect every mismatch between `actual` and `expected`
pub fn mismatches(actual: &Value, expected: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    check(Some(actual), expected, "$", &mut errors);
    errors
}

fn check(actual: Option<&Value>, expected: &Value, path: &str, errors: &mut Vec<String>) {
    match expected {
        Value::String(marker) => check_marker(actual, marker, path, errors),
        Value::Object(fields) => {
            let Some(Value::Object(actual_fields)) = actual else {
                errors.push(format!("{path}: expected object, got {}", kind(actual)));
                return;
            };
            for (key, expected_value) in fields {
                check(
                    actual_fields.get(key),
                    expected_value,
                    &format!("{path}.{key}"),
                    errors,
                );
            }
        }
        Value::Array(items) => {
            let Some(Value::Array(actual_items)) = actual else {
                errors.push(format!("{path}: expected array, got {}", kind(actual)));
                return;
            };
            if let [template @ (Value::Object(_) | Value::Array(_) | Value::String(_))] =
                items.as_slice()
            {
                for (index, item) in actual_items.iter().enumerate() {
                    check(Some(item), template, &format!("{path}[{index}]"), errors);
                }
                return;
            }
            if actual_items.len() != items.len() {
                errors.push(format!(
                    "{path}: expected array of length {}, got {}",
                    items.len(),
                    actual_items.len()
                ));
                return;
            }
            for (index, (item, expected_item)) in actual_items.iter().zip(items).enumerate() {
                check(Some(item), expected_item, &format!("{path}[{index}]"), errors);
            }
        }
        scalar => {
            if !values_equal(actual, scalar) {
                errors.push(format!(
                    "{path}: expected {scalar}, got {}",
                    display(actual)
                ));
            }
        }
    }
}

fn check_marker(actual: Option<&Value>, marker: &str, path: &str, errors: &mut Vec<String>) {
    let is_missing = matches!(actual, None | Some(Value::Null));

    let marker = if marker.starts_with(OPTIONAL_PREFIX) {
        if is_missing {
            return;
        }
        // `##string` is the optional form of `#string`
        &marker[1..]
    } else {
        marker
    };

    let type_check = |ok: bool, wanted: &str, errors: &mut Vec<String>| {
        if !ok {
            errors.push(format!("{path}: expected {wanted}, got {}", kind(actual)));
        }
    };

    match marker {
        "#ignore" | "#" => {}
        "#present" | "#notnull" => {
            if is_missing {
                errors.push(format!("{path}: expected a value, got {}", kind(actual)));
            }
        }
        "#null" => {
            if !is_missing {
                errors.push(format!("{path}: expected null, got {}", display(actual)));
            }
        }
        "#string" => type_check(matches!(actual, Some(Value::String(_))), "string", errors),
        "#number" => type_check(matches!(actual, Some(Value::Number(_))), "number", errors),
        "#boolean" => type_check(matches!(actual, Some(Value::Bool(_))), "boolean", errors),
        "#object" => type_check(matches!(actual, Some(Value::Object(_))), "object", errors),
        "#array" => type_check(matches!(actual, Some(Value::Array(_))), "array", errors),
        "#[]" => {
            if !matches!(actual, Some(Value::Array(items)) if items.is_empty()) {
                errors.push(format!("{path}: expected empty array, got {}", display(actual)));
            }
        }
        _ if marker.starts_with(REGEX_PREFIX) => {
            let pattern = &marker[REGEX_PREFIX.len()..];
            check_regex(actual, pattern, path, errors);
        }
        literal => {
            if actual.and_then(Value::as_str) != Some(literal) {
                errors.push(format!(
                    "{path}: expected \"{literal}\", got {}",
                    display(actual)
                ));
            }
        }
    }
}

fn check_regex(actual: Option<&Value>, pattern: &str, path: &str, errors: &mut Vec<String>) {
    let regex = match Regex::new(&format!("^(?:{pattern})")) {
        Ok(regex) => regex,
        Err(e) => {
            errors.push(format!("{path}: invalid regex '{pattern}': {e}"));
            return;
        }
    };
    match actual {
        Some(Value::String(text)) if regex.is_match(text) => {}
        Some(Value::String(text)) => errors.push(format!(
            "{path}: value \"{text}\" does not match regex '{pattern}'"
        )),
        other => errors.push(format!(
            "{path}: expected string matching '{pattern}', got {}",
            kind(other)
        )),
    }
}

/// Equality with integers and floats of the same value treated as equal
fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (Some(Value::Number(a)), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        (Some(a), b) => a == b,
        (None, _) => false,
    }
}

fn kind(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing field",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn display(value: Option<&Value>) -> String {
    value.map_or_else(|| "missing field".to_string(), Value::to_string)
}
