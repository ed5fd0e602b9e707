//! Plain-text view of JSON-LD literals
//!
//! Broker descriptions carry titles, descriptions and timestamps either as
//! bare strings or as value objects such as
//! `{"@value": "Rivers", "@language": "en"}` or
//! `{"@value": "2022-01-01T00:00:00Z", "@type": "xsd:dateTimeStamp"}`.

use serde_json::Value;

/// Flatten a JSON-LD literal to a string.
///
/// - a string is returned unchanged
/// - an object carrying `@value` yields that value as plain text
/// - anything else yields its JSON text
pub fn clean_multilang(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("@value") {
            Some(inner) => plain_text(inner),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
