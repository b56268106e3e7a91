//! Runtime helpers
//!
//! Reference behaviour of the host-side helpers called by compiled
//! templates: the `attrs` attribute renderer and HTML escaping.

use crate::host::Value;
use indexmap::IndexMap;

/// Escape text for HTML output.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render evaluated `attrs` keyword arguments as ` name="value"` pairs.
///
/// A key that is itself a key/value array is expanded in place; a guard
/// key contributes its key/value array value only when truthy. Repeated
/// names are merged in first-seen order.
pub fn render_attrs(pairs: &[(Value, Value)]) -> String {
    let mut merged: IndexMap<String, Vec<Value>> = IndexMap::new();
    for (key, value) in pairs {
        expand(key, value, &mut merged);
    }

    let mut out = String::new();
    for (name, values) in merged {
        if let Some(rendered) = render_attr(&name, values) {
            out.push(' ');
            out.push_str(&rendered);
        }
    }
    out
}

fn expand(key: &Value, value: &Value, merged: &mut IndexMap<String, Vec<Value>>) {
    match key {
        Value::Str(name) | Value::RawStr(name) => {
            merged.entry(name.clone()).or_default().push(value.clone());
        }
        Value::KeyValueArray(entries) => {
            if value.is_truthy() {
                for (k, v) in entries {
                    expand(k, v, merged);
                }
            }
        }
        guard => {
            if guard.is_truthy() {
                if let Value::KeyValueArray(entries) = value {
                    for (k, v) in entries {
                        expand(k, v, merged);
                    }
                }
            }
        }
    }
}

fn render_attr(name: &str, values: Vec<Value>) -> Option<String> {
    let mut parts = Vec::new();
    for value in &values {
        flatten(name, value, &mut parts);
    }

    if parts.is_empty() {
        return None;
    }
    if parts.iter().all(|p| matches!(p, Part::Flag)) {
        return Some(name.to_string());
    }

    let texts: Vec<String> = parts
        .into_iter()
        .filter_map(|p| match p {
            Part::Text(text) => Some(text),
            Part::Flag => None,
        })
        .collect();

    let value = match name {
        "id" => texts.last().cloned().unwrap_or_default(),
        "style" => texts.join("; "),
        _ => texts.join(" "),
    };
    Some(format!("{}=\"{}\"", name, value))
}

enum Part {
    Flag,
    Text(String),
}

fn flatten(name: &str, value: &Value, parts: &mut Vec<Part>) {
    if !value.is_truthy() {
        return;
    }
    match value {
        Value::Bool(_) => parts.push(Part::Flag),
        Value::Array(items) => {
            for item in items {
                flatten(name, item, parts);
            }
        }
        Value::KeyValueArray(entries) => {
            for (guard, inner) in entries {
                if guard.is_truthy() {
                    flatten(name, inner, parts);
                }
            }
        }
        Value::Dict(entries) if name == "style" => {
            for (k, v) in entries {
                if v.is_truthy() {
                    parts.push(Part::Text(format!("{}:{}", escape_html(k), text_of(v))));
                }
            }
        }
        other => parts.push(Part::Text(text_of(other))),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::RawStr(s) => s.clone(),
        other => escape_html(&other.to_string()),
    }
}
