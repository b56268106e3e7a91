//! Parse Utilities
//!
//! Source positions carried by tokens and AST nodes, and the source excerpt
//! used when reporting errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a token in a template source. Lines and columns are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize, length: usize) -> Self {
        SourcePosition {
            line,
            column,
            length,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    /// `FILE:LINE:COL:LEN`, or `LINE:COL:LEN` when the unit has no filename.
    pub fn location(&self) -> String {
        match &self.filename {
            Some(file) if !file.is_empty() => {
                format!("{}:{}:{}:{}", file, self.line, self.column, self.length)
            }
            _ => format!("{}:{}:{}", self.line, self.column, self.length),
        }
    }

    /// Return the offending source line followed by a caret marker under the
    /// token, or `None` when the line is outside `source`.
    pub fn excerpt(&self, source: &str) -> Option<String> {
        if self.line == 0 {
            return None;
        }
        let line = source.lines().nth(self.line - 1)?;
        let pad: String = line
            .chars()
            .take(self.column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let marker = "^".repeat(self.length.max(1));
        Some(format!("{:>5} | {}\n      | {}{}", self.line, line, pad, marker))
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = self.filename.as_deref().filter(|f| !f.is_empty()) {
            write!(f, "{} ", file)?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}
