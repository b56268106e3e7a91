//! Template Scanner
//!
//! Converts giom source into a token stream. The scanner reads one physical
//! line at a time, turns its leading whitespace into INDENT/OUTDENT tokens
//! against an indent stack, then tries an ordered list of line rules on the
//! rest of the line. The first matching rule wins; whatever a rule leaves in
//! the buffer is scanned again, so `div.a[x] text` yields four tokens.

use crate::error::{CompilerError, Result};
use crate::host::{self, KeyValueArray};
use crate::parse_util::SourcePosition;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Eof,
    Doctype,
    Comment,
    Indent,
    Outdent,
    Blank,
    Id,
    ClassName,
    Tag,
    Text,
    Attribute,
    If,
    ElseIf,
    Else,
    For,
    Assignment,
    Code,
    Init,
    ImportModule,
    Func,
    Slot,
    SlotPass,
    Wrap,
    Comp,
    CompCall,
    Switch,
    Case,
    Default,
    Export,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Doctype => "DOCTYPE",
            TokenKind::Comment => "COMMENT",
            TokenKind::Indent => "INDENT",
            TokenKind::Outdent => "OUTDENT",
            TokenKind::Blank => "BLANK",
            TokenKind::Id => "ID",
            TokenKind::ClassName => "CLASS_NAME",
            TokenKind::Tag => "TAG",
            TokenKind::Text => "TEXT",
            TokenKind::Attribute => "ATTRIBUTE",
            TokenKind::If => "IF",
            TokenKind::ElseIf => "ELSE_IF",
            TokenKind::Else => "ELSE",
            TokenKind::For => "FOR",
            TokenKind::Assignment => "ASSIGNMENT",
            TokenKind::Code => "CODE",
            TokenKind::Init => "INIT",
            TokenKind::ImportModule => "IMPORT_MODULE",
            TokenKind::Func => "FUNC",
            TokenKind::Slot => "SLOT",
            TokenKind::SlotPass => "SLOT_PASS",
            TokenKind::Wrap => "WRAP",
            TokenKind::Comp => "COMP",
            TokenKind::CompCall => "COMP_CALL",
            TokenKind::Switch => "SWITCH",
            TokenKind::Case => "CASE",
            TokenKind::Default => "DEFAULT",
            TokenKind::Export => "EXPORT",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scanned token. `data` carries rule-specific side values (`Condition`,
/// `Mode`, `Args`...), `values` the lines of code tokens and `elements`
/// the pre-parsed bracket attribute list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub data: IndexMap<&'static str, String>,
    pub values: Vec<String>,
    pub elements: Option<KeyValueArray>,
    pub position: SourcePosition,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, value: impl Into<String>, position: SourcePosition) -> Self {
        Token {
            kind,
            value: value.into(),
            data: IndexMap::new(),
            values: Vec::new(),
            elements: None,
            position,
        }
    }

    fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.data.insert(key, value.into());
        self
    }

    /// Side value for `key`, empty when absent.
    pub fn get(&self, key: &str) -> &str {
        self.data.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == "true"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    NewLine,
    Line,
    Eof,
}

/// Result of matching a line's leading whitespace against the indent stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndentChange {
    Blank,
    Same,
    Indent,
    Outdent(usize),
}

lazy_static! {
    static ref RGX_EXIT: Regex = Regex::new(r"^@return\s*?$").unwrap();
    static ref RGX_EXPORT: Regex = Regex::new(r"^@export\s+([a-zA-Z_]\w*)(\s*=\s*(.+))?$").unwrap();
    static ref RGX_FUNC: Regex =
        Regex::new(r"^@(export\s+)?func ([a-zA-Z_-]+\w*)(\((.*)\))?$").unwrap();
    static ref RGX_COMP: Regex =
        Regex::new(r"^@(export\s+)?comp (=?[a-zA-Z_-]+\w*)(\((.*)\))?$").unwrap();
    static ref RGX_MAIN_COMP: Regex = Regex::new(r"^@main\s*(\((.*)\))?$").unwrap();
    static ref RGX_COMP_CALL: Regex =
        Regex::new(r"^\+([A-Za-z_-]+[.\w]*)(\((.*)\)\s*(~?))?$").unwrap();
    static ref RGX_SWITCH: Regex = Regex::new(r"^@switch\s+(\S+)\s*$").unwrap();
    static ref RGX_CASE: Regex = Regex::new(r"^@case\s+(.+)\s*$").unwrap();
    static ref RGX_DEFAULT: Regex = Regex::new(r"^@default\s*$").unwrap();
    static ref RGX_DOCTYPE: Regex = Regex::new(r"^(!!!|@doctype)\s*(.*)").unwrap();
    static ref RGX_IF: Regex = Regex::new(r"^@if\s+(.+)$").unwrap();
    static ref RGX_ELSE: Regex = Regex::new(r"^@else(\s*|\s+if\s+(.+))$").unwrap();
    static ref RGX_FOR: Regex = Regex::new(r"^@for\s+(.+)$").unwrap();
    static ref RGX_IMPORT_MODULE: Regex = Regex::new(
        r#"^@import\s+("[0-9a-zA-Z_\-\. /][0-9a-zA-Z_\-\. /]*")(\s+as\s+([a-zA-Z$_]\w*))?$"#
    )
    .unwrap();
    static ref RGX_SLOT: Regex = Regex::new(r"^@slot\s+([a-zA-Z_-]+\w*)(\((.*)\))?$").unwrap();
    static ref RGX_SLOT_PASS: Regex = Regex::new(r"^@slot\s+#(.+)$").unwrap();
    static ref RGX_WRAP: Regex = Regex::new(r"^@wrap\s*$").unwrap();
    static ref RGX_ASSIGNMENT: Regex =
        Regex::new(r"^(\$[\w\-]*)?\s*([-+/*:]?)=\s*(.+)$").unwrap();
    static ref RGX_INIT: Regex = Regex::new(r"^~~~\s*$").unwrap();
    static ref RGX_CODE: Regex = Regex::new(r"^\s*~\s+(.+)$").unwrap();
    static ref RGX_MCODE: Regex = Regex::new(r"^\s*~~\s*$").unwrap();
    static ref RGX_TAG: Regex = Regex::new(r"^(\w[-:/\w]*)").unwrap();
    static ref RGX_ID: Regex = Regex::new(r"^#([\w-]+)(?:\s*\?\s*(.*)$)?").unwrap();
    static ref RGX_CLASS_NAME: Regex = Regex::new(r"^\.([\w-]+)(?:\s*\?\s*(.*)$)?").unwrap();
    static ref RGX_ATTRIBUTE: Regex = Regex::new(
        r#"^\[([\w\-:@\.]+)\s*(?:=\s*("([^"\\]*)"|([^\]]+)))?\](?:\s*\?\s*(.*)$)?"#
    )
    .unwrap();
    static ref RGX_TRAILING_CONDITION: Regex = Regex::new(r"^\s*\?\s*(.*)$").unwrap();
    static ref RGX_COMMENT: Regex = Regex::new(r"^//(-)?\s*(.*)$").unwrap();
    static ref RGX_TEXT: Regex = Regex::new(r"^(\|)? ?(.*)$").unwrap();
}

pub struct Scanner<'a> {
    source: &'a str,
    offset: usize,
    filename: Option<String>,
    indent_stack: SmallVec<[String; 8]>,
    stash: VecDeque<Token>,
    state: ScanState,
    buffer: String,
    line: usize,
    col: usize,
    last_token_line: usize,
    last_token_col: usize,
    last_token_size: usize,
    read_raw: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            offset: 0,
            filename: None,
            indent_stack: SmallVec::new(),
            stash: VecDeque::new(),
            state: ScanState::NewLine,
            buffer: String::new(),
            line: 0,
            col: 0,
            last_token_line: 0,
            last_token_col: 0,
            last_token_size: 0,
            read_raw: false,
        }
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    /// Position of the most recently consumed token.
    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(
            self.last_token_line,
            self.last_token_col + 1,
            self.last_token_size,
        )
        .with_filename(self.filename.clone())
    }

    /// Make the next call to [`Scanner::next`] capture the indented block
    /// that follows verbatim.
    pub fn enter_raw(&mut self) {
        self.read_raw = true;
    }

    /// Joined leading whitespace of every open indent level.
    pub fn indentation(&self) -> String {
        self.indent_stack.concat()
    }

    pub fn next(&mut self) -> Result<Token> {
        if self.read_raw {
            self.read_raw = false;
            return self.next_raw();
        }

        self.ensure_buffer();

        if let Some(token) = self.stash.pop_front() {
            return Ok(token);
        }

        loop {
            match self.state {
                ScanState::Eof => {
                    if self.indent_stack.pop().is_some() {
                        return Ok(self.token(TokenKind::Outdent, ""));
                    }
                    return Ok(self.token(TokenKind::Eof, ""));
                }
                ScanState::NewLine => {
                    self.state = ScanState::Line;
                    match self.scan_indent()? {
                        IndentChange::Blank => return Ok(self.token(TokenKind::Blank, "")),
                        IndentChange::Indent => {
                            let value = self.indent_stack.last().cloned().unwrap_or_default();
                            return Ok(self.token(TokenKind::Indent, value));
                        }
                        IndentChange::Outdent(count) => {
                            for _ in 1..count {
                                let outdent = self.token(TokenKind::Outdent, "");
                                self.stash.push_back(outdent);
                            }
                            return Ok(self.token(TokenKind::Outdent, ""));
                        }
                        IndentChange::Same => {
                            self.ensure_buffer();
                        }
                    }
                }
                ScanState::Line => {
                    if RGX_EXIT.is_match(&self.buffer) {
                        let len = self.buffer.len();
                        self.consume(len);
                        self.state = ScanState::Eof;
                        continue;
                    }
                    return Ok(self.scan_line());
                }
            }
        }
    }

    /// Scan tokens until EOF. Used by tooling and tests.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next()?;
            let eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }

    fn scan_line(&mut self) -> Token {
        let rules: [fn(&mut Self) -> Option<Token>; 24] = [
            Self::scan_export,
            Self::scan_func,
            Self::scan_comp,
            Self::scan_comp_call,
            Self::scan_switch,
            Self::scan_case,
            Self::scan_default,
            Self::scan_doctype,
            Self::scan_condition,
            Self::scan_for,
            Self::scan_import_module,
            Self::scan_slot,
            Self::scan_slot_pass,
            Self::scan_wrap,
            Self::scan_assignment,
            Self::scan_init,
            Self::scan_code,
            Self::scan_mcode,
            Self::scan_tag,
            Self::scan_id,
            Self::scan_class_name,
            Self::scan_attribute,
            Self::scan_comment,
            Self::scan_text,
        ];

        for rule in rules {
            if let Some(token) = rule(self) {
                return token;
            }
        }

        // text matches any remaining input
        let value = std::mem::take(&mut self.buffer);
        self.token(TokenKind::Text, value).with("Mode", "inline")
    }

    /// Capture an indented block verbatim, re-indenting nested lines with
    /// tabs relative to the block. The closing OUTDENT is stashed.
    fn next_raw(&mut self) -> Result<Token> {
        let mut result = String::new();
        let mut level: isize = 0;

        loop {
            self.ensure_buffer();

            match self.state {
                ScanState::Eof => {
                    return Ok(self.token(TokenKind::Text, result).with("Mode", "raw"));
                }
                ScanState::NewLine => {
                    self.state = ScanState::Line;
                    match self.scan_indent()? {
                        IndentChange::Blank => {
                            result.push('\n');
                            continue;
                        }
                        IndentChange::Same => {}
                        IndentChange::Indent => level += 1,
                        IndentChange::Outdent(count) => level -= count as isize,
                    }

                    if level < 0 {
                        for _ in 0..(-level) {
                            let outdent = self.token(TokenKind::Outdent, "");
                            self.stash.push_back(outdent);
                        }
                        if result.ends_with('\n') {
                            result.pop();
                        }
                        return Ok(self.token(TokenKind::Text, result).with("Mode", "raw"));
                    }
                }
                ScanState::Line => {
                    if !result.is_empty() {
                        result.push('\n');
                    }
                    for _ in 0..level {
                        result.push('\t');
                    }
                    let line = std::mem::take(&mut self.buffer);
                    self.mark_consumed(line.len());
                    result.push_str(&line);
                }
            }
        }
    }

    /// Read lines up to a line equal to `fence` once the current
    /// indentation is stripped. Indentation rules are not applied.
    fn next_raw_code(&mut self, fence: &str) -> Vec<String> {
        let indentation = self.indentation();
        let mut lines = Vec::new();

        loop {
            self.ensure_buffer();
            if self.state == ScanState::Eof {
                return lines;
            }

            let line = std::mem::take(&mut self.buffer);
            self.mark_consumed(line.len());

            if line == indentation {
                lines.push(String::new());
                continue;
            }

            let common = line
                .char_indices()
                .zip(indentation.chars())
                .take_while(|((_, a), b)| a == b)
                .last()
                .map_or(0, |((i, c), _)| i + c.len_utf8());
            let stripped = &line[common..];

            if stripped == fence {
                return lines;
            }
            lines.push(stripped.to_string());
        }
    }

    fn scan_indent(&mut self) -> Result<IndentChange> {
        if self.buffer.trim().is_empty() {
            let len = self.buffer.len();
            self.consume(len);
            return Ok(IndentChange::Blank);
        }

        let mut matched = 0;
        let mut skip = 0;
        for level in self.indent_stack.iter() {
            if !self.buffer[skip..].starts_with(level.as_str()) {
                break;
            }
            skip += level.len();
            matched += 1;
        }
        if skip > 0 {
            self.consume(skip);
        }

        let new_indent: String = self
            .buffer
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect();

        let complete = matched == self.indent_stack.len();

        if !new_indent.is_empty() && complete {
            trace!(line = self.line, indent = ?new_indent, "indent");
            self.consume(new_indent.len());
            self.indent_stack.push(new_indent);
            return Ok(IndentChange::Indent);
        }

        if new_indent.is_empty() && !complete {
            let count = self.indent_stack.len() - matched;
            trace!(line = self.line, count, "outdent");
            self.indent_stack.truncate(matched);
            return Ok(IndentChange::Outdent(count));
        }

        if !new_indent.is_empty() {
            self.last_token_line = self.line;
            self.last_token_size = new_indent.len();
            return Err(CompilerError::scan(
                "Mismatching indentation. Please use a coherent indent schema.",
                self.position(),
            ));
        }

        Ok(IndentChange::Same)
    }

    fn scan_doctype(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_DOCTYPE)?;
        self.consume(sm[0].len());
        let value = if sm[2].is_empty() { "html" } else { &sm[2] };
        Some(self.token(TokenKind::Doctype, value))
    }

    fn scan_condition(&mut self) -> Option<Token> {
        if let Some(sm) = self.matched(&RGX_IF) {
            self.consume(sm[0].len());
            return Some(self.token(TokenKind::If, &sm[1]));
        }

        let sm = self.matched(&RGX_ELSE)?;
        self.consume(sm[0].len());
        if sm[2].is_empty() {
            Some(self.token(TokenKind::Else, ""))
        } else {
            Some(self.token(TokenKind::ElseIf, &sm[2]))
        }
    }

    fn scan_for(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_FOR)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::For, &sm[0][1..]))
    }

    fn scan_assignment(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_ASSIGNMENT)?;
        self.consume(sm[0].len());
        Some(
            self.token(TokenKind::Assignment, &sm[3])
                .with("X", &sm[1])
                .with("Op", &sm[2]),
        )
    }

    fn scan_init(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_INIT)?;
        self.consume(sm[0].len());
        let mut token = self.token(TokenKind::Init, "");
        token.values = self.next_raw_code("~~~");
        Some(token)
    }

    fn scan_code(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_CODE)?;
        self.consume(sm[0].len());
        let mut token = self.token(TokenKind::Code, "");
        token.values = vec![sm[1].clone()];
        Some(token)
    }

    fn scan_mcode(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_MCODE)?;
        self.consume(sm[0].len());
        let mut token = self.token(TokenKind::Code, "");
        token.values = self.next_raw_code("~~");
        Some(token)
    }

    fn scan_comment(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_COMMENT)?;
        self.consume(sm[0].len());
        let mode = if sm[1].is_empty() { "embed" } else { "silent" };
        Some(self.token(TokenKind::Comment, &sm[2]).with("Mode", mode))
    }

    fn scan_id(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_ID)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::Id, &sm[1]).with("Condition", &sm[2]))
    }

    fn scan_class_name(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_CLASS_NAME)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::ClassName, &sm[1]).with("Condition", &sm[2]))
    }

    /// Bracket attributes go through the host key/value parser first; the
    /// single-attribute pattern catches values the host cannot parse.
    fn scan_attribute(&mut self) -> Option<Token> {
        if self.buffer.starts_with('[') {
            if let Ok((elements, consumed)) = host::parse_key_value_array(&self.buffer) {
                self.consume(consumed);
                let mut token = self.token(TokenKind::Attribute, "");
                token.elements = Some(elements);
                if let Some(sm) = self.matched(&RGX_TRAILING_CONDITION) {
                    self.consume(sm[0].len());
                    token.data.insert("Condition", sm[1].clone());
                }
                return Some(token);
            }
        }

        let sm = self.matched(&RGX_ATTRIBUTE)?;
        self.consume(sm[0].len());

        if !sm[3].is_empty() || sm[2].is_empty() || sm[2] == "\"\"" {
            let flag = if sm[2].is_empty() { "true" } else { "" };
            return Some(
                self.token(TokenKind::Attribute, &sm[1])
                    .with("Content", &sm[3])
                    .with("Mode", "raw")
                    .with("Condition", &sm[5])
                    .with("Flag", flag),
            );
        }

        Some(
            self.token(TokenKind::Attribute, &sm[1])
                .with("Content", sm[4].trim_end())
                .with("Mode", "expression")
                .with("Condition", &sm[5]),
        )
    }

    fn scan_import_module(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_IMPORT_MODULE)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::ImportModule, &sm[1]).with("ident", &sm[3]))
    }

    fn scan_slot(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_SLOT)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::Slot, &sm[1]).with("Args", &sm[3]))
    }

    fn scan_slot_pass(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_SLOT_PASS)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::SlotPass, &sm[1]).with("Header", &sm[1]))
    }

    fn scan_wrap(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_WRAP)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::Wrap, ""))
    }

    fn scan_tag(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_TAG)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::Tag, &sm[1]))
    }

    fn scan_export(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_EXPORT)?;
        self.consume(sm[0].len());
        Some(
            self.token(TokenKind::Export, &sm[1])
                .with("Name", &sm[1])
                .with("Value", &sm[3]),
        )
    }

    fn scan_func(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_FUNC)?;
        self.consume(sm[0].len());
        Some(
            self.token(TokenKind::Func, &sm[2])
                .with("Args", &sm[4])
                .with("Exported", (!sm[1].is_empty()).to_string()),
        )
    }

    fn scan_comp(&mut self) -> Option<Token> {
        if let Some(sm) = self.matched(&RGX_COMP) {
            self.consume(sm[0].len());
            return Some(
                self.token(TokenKind::Comp, &sm[2])
                    .with("Args", &sm[4])
                    .with("Exported", (!sm[1].is_empty()).to_string()),
            );
        }

        let sm = self.matched(&RGX_MAIN_COMP)?;
        self.consume(sm[0].len());
        Some(
            self.token(TokenKind::Comp, "main")
                .with("Args", &sm[2])
                .with("Exported", "true"),
        )
    }

    fn scan_switch(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_SWITCH)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::Switch, &sm[1]))
    }

    fn scan_case(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_CASE)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::Case, sm[1].trim_end()))
    }

    fn scan_default(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_DEFAULT)?;
        self.consume(sm[0].len());
        Some(self.token(TokenKind::Default, ""))
    }

    fn scan_comp_call(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_COMP_CALL)?;
        self.consume(sm[0].len());
        Some(
            self.token(TokenKind::CompCall, &sm[1])
                .with("Args", &sm[3])
                .with("WithCode", (sm[4] == "~").to_string()),
        )
    }

    fn scan_text(&mut self) -> Option<Token> {
        let sm = self.matched(&RGX_TEXT)?;
        self.consume(sm[0].len());
        let mode = if sm[1] == "|" { "piped" } else { "inline" };
        Some(self.token(TokenKind::Text, &sm[2]).with("Mode", mode))
    }

    /// Capture groups of `re` against the buffer; missing groups are empty.
    fn matched(&self, re: &Regex) -> Option<Vec<String>> {
        re.captures(&self.buffer).map(|caps| {
            (0..caps.len())
                .map(|i| caps.get(i).map_or(String::new(), |m| m.as_str().to_string()))
                .collect()
        })
    }

    fn token(&self, kind: TokenKind, value: impl Into<String>) -> Token {
        Token::new(kind, value, self.position())
    }

    /// Drop `len` bytes from the front of the buffer, recording them as
    /// the current token.
    fn consume(&mut self, len: usize) {
        let len = len.min(self.buffer.len());
        self.buffer.drain(..len);
        self.mark_consumed(len);
    }

    fn mark_consumed(&mut self, len: usize) {
        self.last_token_line = self.line;
        self.last_token_col = self.col;
        self.last_token_size = len;
        self.col += len;
    }

    /// Load the next logical line once the buffer is exhausted. A trailing
    /// backslash joins the following physical line.
    fn ensure_buffer(&mut self) {
        if !self.buffer.is_empty() || self.state == ScanState::Eof {
            return;
        }

        let mut line = match self.read_line() {
            Some(line) => line,
            None => {
                self.state = ScanState::Eof;
                return;
            }
        };
        self.line += 1;

        while line.ends_with('\\') {
            line.pop();
            match self.read_line() {
                Some(next) => {
                    self.line += 1;
                    line.push_str(next.trim_start());
                }
                None => break,
            }
        }

        self.state = ScanState::NewLine;
        self.buffer = line;
        self.col = 0;
    }

    fn read_line(&mut self) -> Option<String> {
        if self.offset >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.offset..];
        let (line, advance) = match rest.find('\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        self.offset += advance;
        Some(line.strip_suffix('\r').unwrap_or(line).to_string())
    }
}
