//! # Binding Resolver
//!
//! Resolves `{{dotted.path}}` placeholders against a JSON data context.
//! Literal text passes through untouched, so a binding like
//! `"Invoice {{invoiceNumber}}"` mixes captions and data freely.
//!
//! Missing or null values resolve to the empty string — a business document
//! must never print the word "undefined" because one optional field was
//! absent. No escaping is applied; documents are generated server-side from
//! trusted business data and the PDF writer does its own operator escaping.

use serde_json::Value;

/// Resolve every `{{identifier(.identifier)*}}` occurrence in `template`
/// against `context`, returning the substituted string.
pub fn resolve(template: &str, context: &Value) -> String {
    if template.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                out.push_str(&rest[..open]);
                let path = after_open[..close].trim();
                out.push_str(&lookup(context, path));
                rest = &after_open[close + 2..];
            }
            None => break, // unterminated placeholder: emit the tail verbatim
        }
    }
    out.push_str(rest);
    out
}

/// Walk a dot-separated path through the context and stringify the result.
fn lookup(context: &Value, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    match traverse(context, path) {
        Some(value) => stringify(value),
        None => String::new(),
    }
}

/// Traverse a JSON value by dot-path segments. Objects are walked by key,
/// arrays by numeric index.
fn traverse<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            Value::Array(arr) => {
                let idx: usize = part.parse().ok()?;
                current = arr.get(idx)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Convert a resolved JSON value to the string drawn on the page.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Objects and arrays have no sensible inline rendering.
        Value::Object(_) | Value::Array(_) => String::new(),
    }
}
