/**
 * Host Expression AST
 *
 * Expression nodes of the host engine that the compiler needs to inspect
 * or rewrite: attribute values and conditions, call headers, parameter
 * lists and key-value arrays. Anything the compiler only forwards stays
 * source text and never reaches this module.
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(String),
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Backtick string, content kept verbatim.
    RawStr(String),
    Array(Vec<Expr>),
    Dict(Vec<DictEntry>),
    KeyValueArray(KeyValueArray),
    Paren(Box<Expr>),
    Unary(Unary),
    Binary(Binary),
    Conditional(Conditional),
    Selector(Selector),
    Index(Index),
    Call(Call),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn paren(expr: Expr) -> Self {
        match expr {
            Expr::Paren(_) => expr,
            other => Expr::Paren(Box::new(other)),
        }
    }

    pub fn binary(operation: &str, left: Expr, right: Expr) -> Self {
        Expr::Binary(Binary {
            operation: operation.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Unary(Unary {
            operator: "!".to_string(),
            expr: Box::new(Expr::paren(expr)),
        })
    }

    /// `(cond) ? then : else`; a missing else yields nil at runtime.
    pub fn conditional(condition: Expr, true_exp: Expr, false_exp: Option<Expr>) -> Self {
        Expr::Conditional(Conditional {
            condition: Box::new(Expr::paren(condition)),
            true_exp: Box::new(true_exp),
            false_exp: false_exp.map(Box::new),
        })
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Expr::Nil)
    }

    /// Name of an identifier-like key (`class`, `data-map`).
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub key: Expr,
    pub value: Expr,
}

/// One `key=value` element of a key-value array. A missing value is a flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Expr,
    pub value: Option<Expr>,
}

impl KeyValue {
    pub fn new(key: Expr, value: Option<Expr>) -> Self {
        KeyValue { key, value }
    }
}

/// `[k=v, flag]` or the paren form `(;k=v, flag)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValueArray {
    pub elements: Vec<KeyValue>,
    pub paren: bool,
}

impl KeyValueArray {
    pub fn new(elements: Vec<KeyValue>) -> Self {
        KeyValueArray {
            elements,
            paren: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unary {
    pub operator: String,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub operation: String,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub condition: Box<Expr>,
    pub true_exp: Box<Expr>,
    pub false_exp: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub receiver: Box<Expr>,
    pub name: String,
    pub safe: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub receiver: Box<Expr>,
    pub key: Box<Expr>,
    pub safe: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Box<Expr>,
    pub args: CallArgs,
}

/// Positional argument, `*xs` when spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub value: Expr,
    pub spread: bool,
}

/// Named argument after `;`. `**kw` is a spread with no name; a name with
/// no value is a flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: Option<Expr>,
    pub value: Option<Expr>,
    pub spread: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    pub positional: Vec<Arg>,
    pub named: Vec<NamedArg>,
}

impl CallArgs {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Named parameter with its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedParam {
    pub name: String,
    pub default: Expr,
}

/// Function parameter list: `a, b, *rest; k=1, **kw`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub positional: Vec<String>,
    pub variadic: Option<String>,
    pub named: Vec<NamedParam>,
    pub named_variadic: Option<String>,
}

impl Params {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
            && self.variadic.is_none()
            && self.named.is_empty()
            && self.named_variadic.is_none()
    }

    /// `(*args, **kwargs)`: forwards everything it receives.
    pub fn proxy() -> Self {
        Params {
            variadic: Some("args".to_string()),
            named_variadic: Some("kwargs".to_string()),
            ..Params::default()
        }
    }

    pub fn push_named(&mut self, name: impl Into<String>, default: Expr) {
        self.named.push(NamedParam {
            name: name.into(),
            default,
        });
    }

    /// Arguments for calling a function with this signature from the
    /// declaring scope: positional names are forwarded, named parameters
    /// pass their default expressions.
    pub fn caller(&self) -> CallArgs {
        let mut args = CallArgs::default();
        for name in &self.positional {
            args.positional.push(Arg {
                value: Expr::ident(name.as_str()),
                spread: false,
            });
        }
        if let Some(name) = &self.variadic {
            args.positional.push(Arg {
                value: Expr::ident(name.as_str()),
                spread: true,
            });
        }
        for param in &self.named {
            args.named.push(NamedArg {
                name: Some(Expr::ident(param.name.as_str())),
                value: Some(param.default.clone()),
                spread: false,
            });
        }
        if let Some(name) = &self.named_variadic {
            args.named.push(NamedArg {
                name: None,
                value: Some(Expr::ident(name.as_str())),
                spread: true,
            });
        }
        args
    }
}
