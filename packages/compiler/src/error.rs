//! Compiler errors
//!
//! Every failure of a compile unit is reported through [`CompilerError`].
//! The first error aborts the unit; there is no warnings mode.

use crate::host::HostError;
use crate::parse_util::SourcePosition;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    /// Indentation and other lexical failures.
    #[error("giom Error in <{}>: {message}", .position.location())]
    Scan {
        message: String,
        position: SourcePosition,
    },

    #[error("giom Error in <{}>: {message}", .position.location())]
    Parse {
        message: String,
        position: SourcePosition,
    },

    /// An attribute condition the host parser rejected.
    #[error(
        "giom Error in <{}>: parse tag '{tag}': attribute '{attribute}': condition '{condition}': {source}",
        .position.location()
    )]
    Attribute {
        tag: String,
        attribute: String,
        condition: String,
        source: HostError,
        position: SourcePosition,
    },

    #[error("giom Error in <{}>: {message}", .position.location())]
    Compile {
        message: String,
        position: SourcePosition,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CompilerError {
    pub fn scan(message: impl Into<String>, position: SourcePosition) -> Self {
        CompilerError::Scan {
            message: message.into(),
            position,
        }
    }

    pub fn parse(message: impl Into<String>, position: SourcePosition) -> Self {
        CompilerError::Parse {
            message: message.into(),
            position,
        }
    }

    pub fn compile(message: impl Into<String>, position: SourcePosition) -> Self {
        CompilerError::Compile {
            message: message.into(),
            position,
        }
    }

    /// Position of the failure, when it has one.
    pub fn position(&self) -> Option<&SourcePosition> {
        match self {
            CompilerError::Scan { position, .. }
            | CompilerError::Parse { position, .. }
            | CompilerError::Attribute { position, .. }
            | CompilerError::Compile { position, .. } => Some(position),
            CompilerError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompilerError>;
