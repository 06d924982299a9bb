//! Permissive coercion of loosely-typed feed values.
//!
//! Feeds deliver numbers as JSON numbers, numeric strings, `"null"`, or
//! garbage. None of these functions fail: anything that cannot be read as
//! the target type becomes `None`.

use serde_json::Value;

fn scalar_text(value: &Value) -> Option<&str> {
  match value {
    Value::String(s) => {
      let s = s.trim();
      (!s.is_empty() && s != "null").then_some(s)
    }
    _ => None,
  }
}

/// A finite float, or `None`.
pub fn to_float(value: Option<&Value>) -> Option<f64> {
  let parsed = match value? {
    Value::Number(n) => n.as_f64(),
    other => scalar_text(other)?.parse::<f64>().ok(),
  };
  parsed.filter(|f| f.is_finite())
}

/// An integer, or `None`. JSON floats are truncated toward zero; strings
/// must spell an integer.
pub fn to_int(value: Option<&Value>) -> Option<i64> {
  match value? {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
    other => scalar_text(other)?.parse::<i64>().ok(),
  }
}

/// A season flag: `true`/`1`/`yes` and `false`/`0`/`no` (case-insensitive);
/// anything else is `None`.
pub fn to_flag(value: Option<&Value>) -> Option<bool> {
  let text = match value? {
    Value::Bool(b) => return Some(*b),
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.trim().to_lowercase(),
    _ => return None,
  };
  match text.as_str() {
    "true" | "1" | "yes" => Some(true),
    "false" | "0" | "no" => Some(false),
    _ => None,
  }
}

/// A non-empty string. Numbers are rendered; other shapes are `None`.
pub fn to_text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}
