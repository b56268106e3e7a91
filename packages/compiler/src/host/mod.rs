//! Host Expression Module
//!
//! The subset of the host engine's expression language the template front
//! end consumes: lexing, parsing, canonical serialization, and a reference
//! evaluator.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod serializer;

pub use ast::*;
pub use eval::{eval, Scope, Value};
pub use parser::Parser;
pub use serializer::{quote, serialize, serialize_call_args, serialize_params};

use thiserror::Error;

/// Failure reported by the host expression parser or evaluator. `offset`
/// is a byte offset into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (offset {offset})")]
pub struct HostError {
    pub message: String,
    pub offset: usize,
}

impl HostError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        HostError {
            message: message.into(),
            offset,
        }
    }
}

pub fn parse_expr(text: &str) -> Result<Expr, HostError> {
    Parser::new().parse_expr(text)
}

pub fn parse_key_value_array(text: &str) -> Result<(KeyValueArray, usize), HostError> {
    Parser::new().parse_key_value_array(text)
}

pub fn parse_params(text: &str) -> Result<Params, HostError> {
    Parser::new().parse_params(text)
}

pub fn parse_call(text: &str) -> Result<Call, HostError> {
    Parser::new().parse_call(text)
}

pub fn parse_call_args(text: &str) -> Result<CallArgs, HostError> {
    Parser::new().parse_call_args(text)
}

pub fn parse_condition(text: &str) -> Result<Conditional, HostError> {
    Parser::new().parse_condition(text)
}

impl CallArgs {
    /// Reinterpret call arguments as a parameter list: positional
    /// identifiers become parameters, `name=default` becomes a named one.
    pub fn to_params(&self) -> Result<Params, HostError> {
        let mut params = Params::default();

        for arg in &self.positional {
            match (&arg.value, arg.spread) {
                (Expr::Ident(name), false) => params.positional.push(name.clone()),
                (Expr::Ident(name), true) => params.variadic = Some(name.clone()),
                (other, _) => {
                    return Err(HostError::new(
                        format!(
                            "Parsing slot pass failed: unexpected parameter `{}`",
                            serialize(other)
                        ),
                        0,
                    ))
                }
            }
        }

        for arg in &self.named {
            match (&arg.name, &arg.value, arg.spread) {
                (None, Some(Expr::Ident(name)), true) => params.named_variadic = Some(name.clone()),
                (Some(Expr::Ident(name)), Some(value), false) => {
                    params.push_named(name.as_str(), value.clone())
                }
                (Some(Expr::Ident(name)), None, false) => params.push_named(name.as_str(), Expr::Nil),
                _ => {
                    return Err(HostError::new(
                        "Parsing slot pass failed: named parameters must be `name=default`",
                        0,
                    ))
                }
            }
        }

        Ok(params)
    }
}
