//! JSON value semantics shared by the expression language, the watcher
//! pipeline and the dependency gate.
//!
//! The rule language treats payload values loosely: the strings `"true"`
//! and `"false"` act as booleans, numeric strings act as numbers, and
//! everything compares by its stringified normalized form. The helpers
//! here are the single source of truth for that behavior.

use serde_json::Value;

/// Walk a dotted path through nested JSON objects.
///
/// A missing segment yields `None`; comparisons against a missing value
/// are always false further up the stack.
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Render a value the way the rule language stringifies it: strings bare,
/// integral floats without a trailing `.0`, objects and arrays as compact
/// JSON text.
pub fn canonical_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

pub fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => format_f64(f),
        None => n.to_string(),
    }
}

/// `95.0` renders as `"95"` so that a payload carrying `95` and one
/// carrying `95.0` count as the same observation.
pub fn format_f64(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Normalize a value for comparison: `"true"`/`"false"` become booleans,
/// other numeric-castable strings become numbers, everything else is
/// unchanged. Empty and whitespace-only strings stay strings.
pub fn normalize(v: &Value) -> Value {
    if let Value::String(s) = v {
        match s.as_str() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    if let Some(n) = serde_json::Number::from_f64(f) {
                        return Value::Number(n);
                    }
                }
            }
        }
    }
    v.clone()
}

/// The equality used by the expression `==`, the dependency gate and
/// typed condition values: normalize both sides, then compare the
/// stringified normalized forms.
pub fn normalized_eq(a: &Value, b: &Value) -> bool {
    canonical_string(&normalize(a)) == canonical_string(&normalize(b))
}

/// Standard boolean cast with the rule-language twist that any non-empty
/// string is true.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric view used by the ordering operators. Finite numbers and
/// numeric strings qualify; empty strings, null and booleans do not.
pub fn ordering_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}
