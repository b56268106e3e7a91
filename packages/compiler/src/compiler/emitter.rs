//! Emitter Context
//!
//! Output sink of the code generator. The only retained state is the text
//! written so far; its length decides whether a pretty-printing newline is
//! needed.

const INDENT_WITH: &str = "\t";

#[derive(Debug, Default)]
pub struct EmitterContext {
    out: String,
    indent: usize,
    pretty: bool,
}

impl EmitterContext {
    pub fn new(pretty: bool) -> Self {
        EmitterContext {
            out: String::new(),
            indent: 0,
            pretty,
        }
    }

    pub fn print(&mut self, part: &str) {
        self.out.push_str(part);
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Pretty printing only: start a new line (unless nothing was written
    /// yet) and indent it to the current depth plus `offset`.
    pub fn indent(&mut self, offset: usize, newline: bool) {
        if !self.pretty {
            return;
        }
        if newline && !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..self.indent + offset {
            self.out.push_str(INDENT_WITH);
        }
    }

    pub fn inc_indent(&mut self) {
        self.indent += 1;
    }

    pub fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn into_source(self) -> String {
        self.out
    }
}
