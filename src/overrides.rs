//! Override Warning Service
//!
//! Reports every place where caller-supplied properties replace one of the
//! library's prescriptive defaults. Warnings are diagnostic only: the merged
//! result is never affected by whether they are emitted.

use crate::property::PropertyBag;
use serde_json::Value;

/// Marker left in unresolved late-bound values; such values are never echoed
const TOKEN_MARKER: &str = "${Token[";

/// A default value replaced by a caller override
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: Vec<String>,
    pub default: Value,
    pub provided: Value,
}

impl Override {
    /// Path in bracket notation: `a` or `a[b][c]`
    pub fn display_path(&self) -> String {
        format_override_path(&self.path)
    }

    /// Warning line for this override
    pub fn message(&self) -> String {
        let details = match (readable(&self.default), readable(&self.provided)) {
            (Some(d), Some(p)) => format!(" Default value: '{}'. You provided: '{}'.", d, p),
            _ => String::new(),
        };
        format!(
            "An override has been provided for the property: {}.{}",
            self.display_path(),
            details
        )
    }
}

/// Diff `overrides` against `defaults` and return the edited values.
///
/// Only keys present on both sides count. Objects are compared key by key,
/// arrays index by index over their common length.
pub fn find_overrides(defaults: &PropertyBag, overrides: &PropertyBag) -> Vec<Override> {
    let mut found = Vec::new();
    for (key, provided) in overrides {
        if let Some(default) = defaults.get(key) {
            diff_values(&mut vec![key.clone()], default, provided, &mut found);
        }
    }
    found
}

fn diff_values(path: &mut Vec<String>, default: &Value, provided: &Value, out: &mut Vec<Override>) {
    match (default, provided) {
        (Value::Object(d), Value::Object(p)) => {
            for (key, pv) in p {
                if let Some(dv) = d.get(key) {
                    path.push(key.clone());
                    diff_values(path, dv, pv, out);
                    path.pop();
                }
            }
        }
        (Value::Array(d), Value::Array(p)) => {
            for (i, (dv, pv)) in d.iter().zip(p.iter()).enumerate() {
                path.push(i.to_string());
                diff_values(path, dv, pv, out);
                path.pop();
            }
        }
        (d, p) if d != p => out.push(Override {
            path: path.clone(),
            default: d.clone(),
            provided: p.clone(),
        }),
        _ => {}
    }
}

/// Emit one warning per overridden default. Returns how many were emitted.
pub fn flag_overridden_defaults(defaults: &PropertyBag, overrides: &PropertyBag) -> usize {
    let found = find_overrides(defaults, overrides);
    for o in &found {
        tracing::warn!("{}", o.message());
    }
    found.len()
}

fn format_override_path(path: &[String]) -> String {
    match path.split_first() {
        None => String::new(),
        Some((head, rest)) => {
            let mut out = head.clone();
            for segment in rest {
                out.push('[');
                out.push_str(segment);
                out.push(']');
            }
            out
        }
    }
}

fn readable(value: &Value) -> Option<&str> {
    value
        .as_str()
        .filter(|s| !s.is_empty() && !s.contains(TOKEN_MARKER))
}
