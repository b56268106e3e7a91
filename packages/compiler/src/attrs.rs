//! Attribute Resolution
//!
//! Merges the attribute declarations of one tag (`#id`, `.class`, bracket
//! lists and guarded attributes) into a single key-value array: one entry
//! per key, keys sorted, repeated keys collected into an array value. The
//! array is emitted as the keyword arguments of the `attrs` helper.

use crate::chars;
use crate::error::{CompilerError, Result};
use crate::host::{self, eval, serialize, Expr, HostError, KeyValue, KeyValueArray, Scope, Value};
use crate::parser::{Attribute, Tag};
use indexmap::IndexMap;

/// Resolve the attributes of `tag` into the sorted, key-deduplicated
/// `(;key=value, ...)` array.
pub fn resolve_attributes(tag: &Tag) -> Result<KeyValueArray> {
    let mut merged: IndexMap<String, (Expr, Vec<Option<Expr>>)> = IndexMap::new();

    for attribute in &tag.attributes {
        for element in attribute_elements(tag, attribute)? {
            merged
                .entry(serialize(&element.key))
                .or_insert_with(|| (element.key.clone(), Vec::new()))
                .1
                .push(element.value);
        }
    }

    merged.sort_keys();

    let elements = merged
        .into_values()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                values.pop().flatten()
            } else {
                Some(Expr::Array(
                    values
                        .into_iter()
                        .map(|v| v.unwrap_or(Expr::Bool(true)))
                        .collect(),
                ))
            };
            KeyValue::new(key, value)
        })
        .collect();

    Ok(KeyValueArray {
        elements,
        paren: true,
    })
}

/// The `attrs(;...)` call for a resolved attribute array, or `None` when the
/// tag has no attributes.
pub fn attrs_call(resolved: &KeyValueArray) -> Option<String> {
    if resolved.is_empty() {
        return None;
    }
    Some(format!("attrs{}", serialize(&Expr::KeyValueArray(resolved.clone()))))
}

/// Evaluate a resolved attribute array the way the `attrs` helper receives
/// it: plain keys are names, every other key and value is evaluated.
pub fn eval_attributes(resolved: &KeyValueArray, scope: &Scope) -> std::result::Result<Vec<(Value, Value)>, HostError> {
    match eval(&Expr::KeyValueArray(resolved.clone()), scope)? {
        Value::KeyValueArray(pairs) => Ok(pairs),
        other => Err(HostError::new(
            format!("expected key/value pairs, got {}", other.type_name()),
            0,
        )),
    }
}

fn attribute_elements(tag: &Tag, attribute: &Attribute) -> Result<Vec<KeyValue>> {
    let guard = match &attribute.condition {
        Some(condition) => Some(host::parse_condition(condition).map_err(|source| {
            CompilerError::Attribute {
                tag: tag.name.clone(),
                attribute: attribute_label(attribute),
                condition: condition.clone(),
                source,
                position: attribute.position.clone(),
            }
        })?),
        None => None,
    };

    let guarded = |value: Option<Expr>| -> Option<Expr> {
        match &guard {
            Some(cond) => Some(Expr::conditional(
                (*cond.true_exp).clone(),
                value.unwrap_or(Expr::Bool(true)),
                cond.false_exp.as_deref().cloned(),
            )),
            None => value,
        }
    };

    if let Some(elements) = &attribute.elements {
        return Ok(elements
            .elements
            .iter()
            .map(|kv| KeyValue::new(kv.key.clone(), guarded(kv.value.clone())))
            .collect());
    }

    let value = if attribute.flag {
        None
    } else if attribute.raw {
        Some(Expr::string(attribute.value.as_str()))
    } else {
        Some(host::parse_expr(&attribute.value).map_err(|err| {
            CompilerError::parse(
                format!(
                    "parse tag '{}': attribute '{}': value '{}': {}",
                    tag.name, attribute.name, attribute.value, err
                ),
                attribute.position.clone(),
            )
        })?)
    };

    Ok(vec![KeyValue::new(attribute_key(&attribute.name), guarded(value))])
}

/// Name used in diagnostics. Bracket lists are named by their keys.
fn attribute_label(attribute: &Attribute) -> String {
    match &attribute.elements {
        Some(elements) if attribute.name.is_empty() => elements
            .elements
            .iter()
            .map(|kv| match &kv.key {
                Expr::Ident(name) | Expr::Str(name) => name.clone(),
                other => serialize(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => attribute.name.clone(),
    }
}

/// Attribute names the host reads as a key name stay bare; anything else
/// becomes a string key.
fn attribute_key(name: &str) -> Expr {
    let mut chars_iter = name.chars();
    let bare = match chars_iter.next() {
        Some(first) if chars::is_identifier_start(first) || first == chars::AT => chars_iter
            .all(|c| chars::is_identifier_part(c) || chars::is_attribute_name_joiner(c)),
        _ => false,
    };
    if bare {
        Expr::ident(name)
    } else {
        Expr::string(name)
    }
}
