//! Template front end
//!
//! Scanner, AST and recursive-descent parser for giom templates.

pub mod nodes;
pub mod parser;
pub mod scanner;

pub use nodes::*;
pub use parser::Parser;
pub use scanner::{Scanner, Token, TokenKind};
