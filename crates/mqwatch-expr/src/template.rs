//! `${…}` placeholder resolution and template interpolation.

use crate::helpers::{apply_chain, parse_helper, split_chain};
use crate::EvalContext;
use mqwatch_common::value::{canonical_string, lookup_path};
use serde_json::Value;

/// Resolve one placeholder spec (base plus optional helper chain).
///
/// The base is `value`, `store.<watcher>.<subject>`, or a dotted path
/// into the payload. `None` means unresolved; the caller decides whether
/// that renders as the empty string (templates) or a missing operand
/// (expressions).
pub(crate) fn resolve_spec(spec: &str, ctx: &EvalContext) -> Option<Value> {
    let segments = split_chain(spec);
    let (base, helper_segments) = segments.split_first()?;
    let base = base.trim();

    let resolved = if base == "value" {
        ctx.value.cloned()
    } else if let Some(rest) = base.strip_prefix("store.") {
        let mut parts = rest.splitn(2, '.');
        match (parts.next(), parts.next()) {
            (Some(watcher), Some(subject)) if !watcher.is_empty() && !subject.is_empty() => {
                ctx.store.get(watcher, subject)
            }
            _ => None,
        }
    } else {
        lookup_path(ctx.payload, base).cloned()
    }?;

    let helpers: Vec<_> = helper_segments.iter().map(|s| parse_helper(s)).collect();
    Some(apply_chain(resolved, &helpers))
}

/// Interpolate a template value. Non-string inputs are returned
/// unchanged.
pub fn interpolate(template: &Value, ctx: &EvalContext) -> Value {
    match template {
        Value::String(s) => Value::String(interpolate_str(s, ctx)),
        other => other.clone(),
    }
}

/// Scan for `${…}` occurrences (nested braces tracked by depth) and
/// substitute each. Unresolved and null placeholders render as the empty
/// string; objects render as their JSON text. A template without
/// placeholders comes back byte-identical.
pub fn interpolate_str(template: &str, ctx: &EvalContext) -> String {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1) == Some(&'{') {
            let mut depth = 1;
            let mut j = i + 2;
            while j < chars.len() {
                match chars[j] {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            if depth == 0 {
                let spec: String = chars[i + 2..j].iter().collect();
                match resolve_spec(&spec, ctx) {
                    Some(Value::Null) | None => {}
                    Some(v) => out.push_str(&canonical_string(&v)),
                }
                i = j + 1;
                continue;
            }
            // Unterminated placeholder: keep the tail verbatim.
            out.extend(chars[i..].iter());
            break;
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}
