//! Expression evaluation
//!
//! A small evaluator over host expressions. It is the reference for how
//! emitted attribute and interpolation expressions behave at run time and
//! backs the attribute rendering helpers in [`crate::runtime`].

use super::ast::*;
use super::HostError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Already-escaped text; rendered without escaping.
    RawStr(String),
    Array(Vec<Value>),
    Dict(IndexMap<String, Value>),
    /// Key/value pairs; a flag element carries `true`.
    KeyValueArray(Vec<(Value, Value)>),
}

impl Value {
    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    /// Host truthiness: nil, false, zero, and empty strings, arrays,
    /// dicts and key/value arrays are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) | Value::RawStr(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            Value::KeyValueArray(kv) => !kv.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::RawStr(_) => "rawstr",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::KeyValueArray(_) => "keyValueArray",
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) | Value::RawStr(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::KeyValueArray(entries) => {
                f.write_str("(;")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

/// Variable bindings visible to an evaluation.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: IndexMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// Evaluate `expr` against `scope`. Unknown identifiers are nil.
pub fn eval(expr: &Expr, scope: &Scope) -> Result<Value> {
    Evaluator { scope }.eval(expr)
}

struct Evaluator<'a> {
    scope: &'a Scope,
}

impl<'a> Evaluator<'a> {
    fn eval(&self, expr: &Expr) -> Result<Value> {
        Ok(match expr {
            Expr::Ident(name) => self.scope.get(name).cloned().unwrap_or(Value::Nil),
            Expr::Nil => Value::Nil,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(i) => Value::Int(*i),
            Expr::Float(f) => Value::Float(*f),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::RawStr(s) => Value::RawStr(s.clone()),
            Expr::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Expr::Dict(entries) => {
                let mut map = IndexMap::new();
                for entry in entries {
                    let key = match &entry.key {
                        Expr::Ident(name) | Expr::Str(name) => name.clone(),
                        other => self.eval(other)?.to_string(),
                    };
                    map.insert(key, self.eval(&entry.value)?);
                }
                Value::Dict(map)
            }
            Expr::KeyValueArray(kv) => self.eval_key_value_array(kv)?,
            Expr::Paren(inner) => self.eval(inner)?,
            Expr::Unary(u) => self.eval_unary(u)?,
            Expr::Binary(b) => self.eval_binary(b)?,
            Expr::Conditional(c) => {
                if self.eval(&c.condition)?.is_truthy() {
                    self.eval(&c.true_exp)?
                } else {
                    match &c.false_exp {
                        Some(e) => self.eval(e)?,
                        None => Value::Nil,
                    }
                }
            }
            Expr::Selector(s) => {
                let receiver = self.eval(&s.receiver)?;
                self.select(receiver, &s.name, s.safe)?
            }
            Expr::Index(i) => {
                let receiver = self.eval(&i.receiver)?;
                let key = self.eval(&i.key)?;
                self.index(receiver, key, i.safe)?
            }
            Expr::Call(_) => {
                return Err(HostError::new("function calls are not supported by the evaluator", 0))
            }
        })
    }

    /// Identifier keys are names; any other key is evaluated.
    fn eval_key_value_array(&self, kv: &KeyValueArray) -> Result<Value> {
        let mut out = Vec::with_capacity(kv.elements.len());
        for element in &kv.elements {
            let key = match &element.key {
                Expr::Ident(name) => Value::Str(name.clone()),
                other => self.eval(other)?,
            };
            let value = match &element.value {
                Some(v) => self.eval(v)?,
                None => Value::Bool(true),
            };
            out.push((key, value));
        }
        Ok(Value::KeyValueArray(out))
    }

    fn eval_unary(&self, u: &Unary) -> Result<Value> {
        let value = self.eval(&u.expr)?;
        match (u.operator.as_str(), value) {
            ("!", v) => Ok(Value::Bool(!v.is_truthy())),
            ("-", Value::Int(i)) => Ok(Value::Int(-i)),
            ("-", Value::Float(f)) => Ok(Value::Float(-f)),
            ("+", v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
            (op, v) => Err(HostError::new(
                format!("invalid operation: {}{}", op, v.type_name()),
                0,
            )),
        }
    }

    fn eval_binary(&self, b: &Binary) -> Result<Value> {
        let left = self.eval(&b.left)?;
        match b.operation.as_str() {
            "&&" => {
                return if left.is_truthy() {
                    self.eval(&b.right)
                } else {
                    Ok(left)
                }
            }
            "||" => {
                return if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(&b.right)
                }
            }
            "??" => {
                return if left == Value::Nil {
                    self.eval(&b.right)
                } else {
                    Ok(left)
                }
            }
            _ => {}
        }

        let right = self.eval(&b.right)?;
        let op = b.operation.as_str();
        match op {
            "==" => return Ok(Value::Bool(values_equal(&left, &right))),
            "!=" => return Ok(Value::Bool(!values_equal(&left, &right))),
            _ => {}
        }

        match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => int_op(op, *l, *r),
            (Value::Str(l), r) if op == "+" => Ok(Value::Str(format!("{}{}", l, r))),
            (Value::RawStr(l), r) if op == "+" => Ok(Value::RawStr(format!("{}{}", l, r))),
            (Value::Str(l), Value::Str(r)) => compare(op, l.cmp(r)),
            _ => match (left.as_float(), right.as_float()) {
                (Some(l), Some(r)) => float_op(op, l, r),
                _ => Err(HostError::new(
                    format!(
                        "invalid operation: {} {} {}",
                        left.type_name(),
                        op,
                        right.type_name()
                    ),
                    0,
                )),
            },
        }
    }

    fn select(&self, receiver: Value, name: &str, safe: bool) -> Result<Value> {
        match receiver {
            Value::Dict(map) => Ok(map.get(name).cloned().unwrap_or(Value::Nil)),
            Value::Nil if safe => Ok(Value::Nil),
            other => Err(HostError::new(
                format!("cannot select '{}' on {}", name, other.type_name()),
                0,
            )),
        }
    }

    fn index(&self, receiver: Value, key: Value, safe: bool) -> Result<Value> {
        match (receiver, key) {
            (Value::Dict(map), key) => Ok(map.get(&key.to_string()).cloned().unwrap_or(Value::Nil)),
            (Value::Array(items), Value::Int(i)) => Ok(usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Nil)),
            (Value::Nil, _) if safe => Ok(Value::Nil),
            (other, _) => Err(HostError::new(
                format!("cannot index {}", other.type_name()),
                0,
            )),
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_float(), right.as_float()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn compare(op: &str, ordering: std::cmp::Ordering) -> Result<Value> {
    use std::cmp::Ordering::*;
    let result = match op {
        "<" => ordering == Less,
        ">" => ordering == Greater,
        "<=" => ordering != Greater,
        ">=" => ordering != Less,
        _ => return Err(HostError::new(format!("invalid operator '{}'", op), 0)),
    };
    Ok(Value::Bool(result))
}

fn int_op(op: &str, l: i64, r: i64) -> Result<Value> {
    Ok(match op {
        "+" => Value::Int(l.wrapping_add(r)),
        "-" => Value::Int(l.wrapping_sub(r)),
        "*" => Value::Int(l.wrapping_mul(r)),
        "/" | "%" if r == 0 => return Err(HostError::new("division by zero", 0)),
        "/" => Value::Int(l / r),
        "%" => Value::Int(l % r),
        _ => return compare(op, l.cmp(&r)),
    })
}

fn float_op(op: &str, l: f64, r: f64) -> Result<Value> {
    Ok(match op {
        "+" => Value::Float(l + r),
        "-" => Value::Float(l - r),
        "*" => Value::Float(l * r),
        "/" => Value::Float(l / r),
        "%" => Value::Float(l % r),
        _ => match l.partial_cmp(&r) {
            Some(ordering) => return compare(op, ordering),
            None => Value::Bool(false),
        },
    })
}
