//! Helper chains: `${spec:fn(args):fn2}`.
//!
//! A helper transforms the resolved placeholder value. Unknown helpers
//! are a no-op returning their input, so a typo degrades to the raw
//! value instead of breaking the rule.

use mqwatch_common::value::{canonical_string, format_f64};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Num(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HelperCall {
    pub name: String,
    pub args: Vec<Arg>,
}

/// Split a placeholder spec on `:` into the base spec and its helper
/// segments. Colons inside parenthesized argument lists and inside
/// quotes do not split.
pub(crate) fn split_chain(spec: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in spec.chars() {
        match c {
            q @ ('\'' | '"') => {
                match quote {
                    Some(open) if open == q => quote = None,
                    None => quote = Some(q),
                    Some(_) => {}
                }
                current.push(c);
            }
            '(' if quote.is_none() => {
                depth += 1;
                current.push(c);
            }
            ')' if quote.is_none() => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ':' if depth == 0 && quote.is_none() => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Parse one helper segment, `name` or `name(arg, …)`. A segment that
/// does not look like a call keeps its full text as the name, which the
/// unknown-helper rule then turns into a no-op.
pub(crate) fn parse_helper(segment: &str) -> HelperCall {
    let segment = segment.trim();
    if let Some(open) = segment.find('(') {
        if let Some(stripped) = segment.strip_suffix(')') {
            let name = segment[..open].trim().to_string();
            let args = parse_args(&stripped[open + 1..]);
            return HelperCall { name, args };
        }
    }
    HelperCall {
        name: segment.to_string(),
        args: Vec::new(),
    }
}

/// Arguments: quoted strings, `true`/`false`, decimal numbers, or bare
/// words taken as string literals.
fn parse_args(text: &str) -> Vec<Arg> {
    let mut raw = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in text.chars() {
        match c {
            q @ ('\'' | '"') => {
                match quote {
                    Some(open) if open == q => quote = None,
                    None => quote = Some(q),
                    Some(_) => {}
                }
                current.push(c);
            }
            ',' if quote.is_none() => raw.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    raw.push(current);

    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
                || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
            {
                return Arg::Str(s[1..s.len() - 1].to_string());
            }
            if s == "true" {
                return Arg::Bool(true);
            }
            if s == "false" {
                return Arg::Bool(false);
            }
            if let Ok(n) = s.parse::<f64>() {
                return Arg::Num(n);
            }
            Arg::Str(s.to_string())
        })
        .collect()
}

pub(crate) fn apply_chain(mut value: Value, helpers: &[HelperCall]) -> Value {
    for call in helpers {
        value = apply(value, call);
    }
    value
}

fn apply(value: Value, call: &HelperCall) -> Value {
    match call.name.as_str() {
        "upper" => Value::String(canonical_string(&value).to_uppercase()),
        "lower" => Value::String(canonical_string(&value).to_lowercase()),
        "trim" => Value::String(canonical_string(&value).trim().to_string()),
        "len" => {
            let n = canonical_string(&value).chars().count();
            Value::Number(n.into())
        }
        "sub" => {
            let chars: Vec<char> = canonical_string(&value).chars().collect();
            let start = arg_usize(call, 0, 0).min(chars.len());
            let len = arg_usize(call, 1, chars.len().saturating_sub(start));
            let end = start.saturating_add(len).min(chars.len());
            Value::String(chars[start..end].iter().collect())
        }
        "slice" => {
            let chars: Vec<char> = canonical_string(&value).chars().collect();
            let start = arg_i64(call, 0, 0);
            let end = match call.args.get(1) {
                Some(Arg::Num(n)) => Some(*n as i64),
                _ => None,
            };
            Value::String(slice_chars(&chars, start, end))
        }
        "cat" => {
            let mut s = canonical_string(&value);
            s.push_str(&arg_str(call, 0, ""));
            Value::String(s)
        }
        "padStart" => {
            let width = arg_usize(call, 0, 0);
            let fill = arg_str(call, 1, " ");
            Value::String(pad(&canonical_string(&value), width, &fill, true))
        }
        "padEnd" => {
            let width = arg_usize(call, 0, 0);
            let fill = arg_str(call, 1, " ");
            Value::String(pad(&canonical_string(&value), width, &fill, false))
        }
        "round" => match as_number(&value) {
            Some(n) => {
                let decimals = arg_usize(call, 0, 0).min(12);
                let factor = 10f64.powi(decimals as i32);
                let rounded = (n * factor).round() / factor;
                serde_json::Number::from_f64(rounded)
                    .map(Value::Number)
                    .unwrap_or(value)
            }
            None => value,
        },
        "toFixed" => match as_number(&value) {
            Some(n) => {
                let decimals = arg_usize(call, 0, 0).min(12);
                Value::String(format!("{n:.decimals$}"))
            }
            None => value,
        },
        "bytes" => match as_number(&value) {
            Some(n) => Value::String(human_bytes(n)),
            None => value,
        },
        "pct" => {
            // Without an argument the value keeps its current formatting.
            if call.args.is_empty() {
                return Value::String(format!("{}%", canonical_string(&value)));
            }
            match as_number(&value) {
                Some(n) => {
                    let decimals = arg_usize(call, 0, 0).min(12);
                    Value::String(format!("{n:.decimals$}%"))
                }
                None => value,
            }
        }
        _ => value,
    }
}

fn arg_str(call: &HelperCall, index: usize, default: &str) -> String {
    match call.args.get(index) {
        Some(Arg::Str(s)) => s.clone(),
        Some(Arg::Num(n)) => format_f64(*n),
        Some(Arg::Bool(b)) => b.to_string(),
        None => default.to_string(),
    }
}

fn arg_i64(call: &HelperCall, index: usize, default: i64) -> i64 {
    match call.args.get(index) {
        Some(Arg::Num(n)) => *n as i64,
        Some(Arg::Str(s)) => s.parse().unwrap_or(default),
        _ => default,
    }
}

fn arg_usize(call: &HelperCall, index: usize, default: usize) -> usize {
    arg_i64(call, index, default as i64).max(0) as usize
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Half-open slice with JS-style negative indices counting from the end.
fn slice_chars(chars: &[char], start: i64, end: Option<i64>) -> String {
    let len = chars.len() as i64;
    let clamp = |i: i64| {
        if i < 0 {
            (len + i).max(0)
        } else {
            i.min(len)
        }
    };
    let s = clamp(start);
    let e = clamp(end.unwrap_or(len));
    if s >= e {
        return String::new();
    }
    chars[s as usize..e as usize].iter().collect()
}

fn pad(s: &str, width: usize, fill: &str, at_start: bool) -> String {
    let len = s.chars().count();
    if len >= width || fill.is_empty() {
        return s.to_string();
    }
    let fill_chars: Vec<char> = fill.chars().collect();
    let padding: String = (0..width - len)
        .map(|i| fill_chars[i % fill_chars.len()])
        .collect();
    if at_start {
        format!("{padding}{s}")
    } else {
        format!("{s}{padding}")
    }
}

/// Human binary size: 1024 steps, 0 decimals when the scaled value is
/// ≥ 10 or integral, otherwise 1.
fn human_bytes(n: f64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut scaled = n;
    let mut unit = 0;
    while scaled.abs() >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let decimals = if scaled.abs() >= 10.0 || scaled.fract() == 0.0 {
        0
    } else {
        1
    };
    format!("{scaled:.decimals$} {}", UNITS[unit])
}
