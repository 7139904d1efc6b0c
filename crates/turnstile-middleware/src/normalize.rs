//! Stringification of raw response data.
//!
//! Raw responses are consumed by clients that expect every scalar leaf as a
//! string, so numbers, booleans and nulls are rewritten before encoding.

use serde_json::Value;

/// Rewrites every scalar leaf in `data` as a string.
///
/// - numbers keep their JSON spelling (`1.5` becomes `"1.5"`)
/// - `true` and `false` become `"1"` and `"0"`
/// - `null` becomes `""`
///
/// Arrays and objects keep their shape; strings are untouched.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use turnstile_middleware::normalize::stringify_data;
///
/// let data = stringify_data(json!({"id": 7, "ok": true, "tags": [null, "x"]}));
/// assert_eq!(data, json!({"id": "7", "ok": "1", "tags": ["", "x"]}));
/// ```
#[must_use]
pub fn stringify_data(data: Value) -> Value {
    match data {
        Value::Null => Value::String(String::new()),
        Value::Bool(b) => Value::String(if b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::String(s) => Value::String(s),
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_data).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, stringify_data(v)))
                .collect(),
        ),
    }
}
