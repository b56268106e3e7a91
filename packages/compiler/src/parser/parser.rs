//! Template Parser
//!
//! Recursive descent over the scanner's token stream, producing a [`Root`].
//! Comps never become block children: they are attached to the root, or to
//! the comp that encloses them. Slots register on the innermost open comp.

use super::nodes::*;
use super::scanner::{Scanner, Token, TokenKind};
use crate::error::{CompilerError, Result};
use crate::host::{self, quote, CallArgs, Expr, HostError, Params};
use crate::parse_util::SourcePosition;
use std::path::Path;
use tracing::debug;

const DEFAULT_MODULE_EXTENSION: &str = ".giom";

/// Where attribute lines found in a block end up.
enum AttributeSink<'s> {
    /// Attribute lines are an error here.
    None,
    /// Block of a tag: attributes go to the tag.
    Tag(&'s mut Vec<Attribute>),
    /// Branch of a conditional directly inside a tag: attributes go to the
    /// tag, guarded by the branch condition.
    Guarded {
        attributes: &'s mut Vec<Attribute>,
        guard: String,
    },
}

impl<'s> AttributeSink<'s> {
    /// Sink handed to a conditional child of this block.
    fn for_conditional(&mut self) -> Option<&mut Vec<Attribute>> {
        match self {
            AttributeSink::Tag(attributes) => Some(&mut **attributes),
            _ => None,
        }
    }
}

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    module_extension: String,
    comps: Vec<Comp>,
    open_comps: Vec<Comp>,
    inits: Vec<Code>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            scanner: Scanner::new(source),
            current: Token::new(TokenKind::Eof, "", SourcePosition::default()),
            module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
            comps: Vec::new(),
            open_comps: Vec::new(),
            inits: Vec::new(),
        }
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.scanner = self.scanner.with_filename(filename);
        self
    }

    /// Extension appended to `@import` paths.
    pub fn with_module_extension(mut self, extension: impl Into<String>) -> Self {
        self.module_extension = extension.into();
        self
    }

    pub fn parse(mut self) -> Result<Root> {
        let mut root = Root::default();
        self.advance()?;

        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Blank => self.advance()?,
                _ => {
                    if let Some(node) = self.parse_node(None)? {
                        root.block.push(node);
                    }
                }
            }
        }

        root.comps = self.comps;
        root.inits = self.inits;

        debug!(
            comps = root.comps.len(),
            nodes = root.block.children.len(),
            "parsed template"
        );
        Ok(root)
    }

    /// Parse the construct starting at the current token. `tag_attributes`
    /// is set when the construct sits directly in a tag block.
    fn parse_node(&mut self, tag_attributes: Option<&mut Vec<Attribute>>) -> Result<Option<Node>> {
        let node = match self.current.kind {
            TokenKind::Doctype => Node::Doctype(self.parse_doctype()?),
            TokenKind::Comment => Node::Comment(self.parse_comment()?),
            TokenKind::Text => Node::Text(self.parse_text()?),
            TokenKind::If => {
                let node = self.parse_if(tag_attributes)?;
                if node.skips {
                    return Ok(None);
                }
                Node::If(node)
            }
            TokenKind::For => Node::For(self.parse_for()?),
            TokenKind::ImportModule => Node::Code(self.parse_import_module()?),
            TokenKind::Tag => Node::Tag(self.parse_tag()?),
            TokenKind::Assignment => Node::Assignment(self.parse_assignment()?),
            TokenKind::Code => Node::Code(self.parse_code()?),
            TokenKind::Init => {
                let token = self.expect(&[TokenKind::Init])?;
                self.inits.push(Code::new(token.values, token.position));
                return Ok(None);
            }
            TokenKind::Slot => Node::Slot(self.parse_slot()?),
            TokenKind::SlotPass => Node::SlotPass(self.parse_slot_pass()?),
            TokenKind::Wrap => Node::Wrap(self.parse_wrap()?),
            TokenKind::Indent => Node::Block(self.parse_block(AttributeSink::None)?),
            TokenKind::Func => Node::Func(self.parse_func()?),
            TokenKind::Comp => {
                let comp = self.parse_comp()?;
                self.add_comp(comp);
                return Ok(None);
            }
            TokenKind::CompCall => Node::CompCall(self.parse_comp_call()?),
            TokenKind::Switch => Node::Switch(self.parse_switch()?),
            TokenKind::Export => Node::Export(self.parse_export()?),
            _ => return Err(self.unexpected()),
        };
        Ok(Some(node))
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.scanner.next()?;
        Ok(())
    }

    /// Consume the current token when it is one of `kinds`.
    fn expect(&mut self, kinds: &[TokenKind]) -> Result<Token> {
        if !kinds.contains(&self.current.kind) {
            return Err(self.unexpected());
        }
        let next = self.scanner.next()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn unexpected(&self) -> CompilerError {
        CompilerError::parse(
            format!("Unexpected token `{}`!", self.current.kind),
            self.current.position.clone(),
        )
    }

    fn error(&self, message: impl Into<String>, position: &SourcePosition) -> CompilerError {
        CompilerError::parse(message, position.clone())
    }

    fn host_error(&self, context: &str, err: HostError, position: &SourcePosition) -> CompilerError {
        self.error(format!("{}: {}", context, err), position)
    }

    fn add_comp(&mut self, comp: Comp) {
        match self.open_comps.last_mut() {
            Some(parent) => parent.comps.push(comp),
            None => self.comps.push(comp),
        }
    }

    fn parse_block(&mut self, mut sink: AttributeSink<'_>) -> Result<Block> {
        let indent = self.expect(&[TokenKind::Indent])?;
        let mut block = Block::new(indent.position);

        loop {
            match self.current.kind {
                TokenKind::Eof | TokenKind::Outdent => break,
                TokenKind::Blank => self.advance()?,
                TokenKind::Id | TokenKind::ClassName | TokenKind::Attribute => {
                    let token = self.expect(&[self.current.kind])?;
                    match &mut sink {
                        AttributeSink::Tag(attributes) => {
                            let condition = token_condition(&token);
                            attributes.push(attribute_from_token(token, condition));
                        }
                        AttributeSink::Guarded { attributes, guard } => {
                            let condition = Some(match token_condition(&token) {
                                Some(own) => format!("{} && {}", guard, own),
                                None => guard.clone(),
                            });
                            attributes.push(attribute_from_token(token, condition));
                        }
                        AttributeSink::None => {
                            return Err(self.error(
                                "Conditional attributes must be placed immediately within a parent tag.",
                                &token.position,
                            ))
                        }
                    }
                }
                _ => {
                    if let Some(node) = self.parse_node(sink.for_conditional())? {
                        block.push(node);
                    }
                }
            }
        }

        self.expect(&[TokenKind::Outdent])?;
        Ok(block)
    }

    /// Branch blocks of a conditional. Inside a tag, attribute lines of
    /// each branch are moved to the tag under the branch guard: the branch
    /// condition and the negations of all earlier branches.
    fn parse_if(&mut self, mut tag_attributes: Option<&mut Vec<Attribute>>) -> Result<If> {
        let token = self.expect(&[TokenKind::If])?;
        let mut node = If {
            positives: Vec::new(),
            negative: None,
            skips: false,
            position: token.position.clone(),
        };

        let mut negations: Vec<String> = Vec::new();
        let mut sunk = 0;
        let mut branch = Some(token);

        while let Some(token) = branch.take() {
            let expression = token.value.trim().to_string();
            let mut guard = negations.clone();
            guard.push(format!("({})", expression));

            let block = if self.at(TokenKind::Indent) {
                Some(self.parse_guarded_block(&mut tag_attributes, guard.join(" && "), &mut sunk)?)
            } else {
                None
            };

            negations.push(format!("!({})", expression));
            node.positives.push(Condition {
                expression,
                block,
                position: token.position,
            });

            if self.at(TokenKind::ElseIf) {
                branch = Some(self.expect(&[TokenKind::ElseIf])?);
            }
        }

        if self.at(TokenKind::Else) {
            self.expect(&[TokenKind::Else])?;
            if self.at(TokenKind::Indent) {
                node.negative = Some(self.parse_guarded_block(
                    &mut tag_attributes,
                    negations.join(" && "),
                    &mut sunk,
                )?);
            }
        }

        if sunk > 0 {
            node.skips = true;
            for condition in &node.positives {
                if condition.block.as_ref().map_or(false, |b| !b.is_empty()) {
                    return Err(self.error(
                        "Conditional for tag attributes does not accepts children on Positive Block.",
                        &condition.position,
                    ));
                }
            }
            if node.negative.as_ref().map_or(false, |b| !b.is_empty()) {
                return Err(self.error(
                    "Conditional for tag attributes does not accepts children on Negative Block.",
                    &node.position,
                ));
            }
        }

        Ok(node)
    }

    fn parse_guarded_block(
        &mut self,
        tag_attributes: &mut Option<&mut Vec<Attribute>>,
        guard: String,
        sunk: &mut usize,
    ) -> Result<Block> {
        match tag_attributes.as_deref_mut() {
            Some(attributes) => {
                let before = attributes.len();
                let block = self.parse_block(AttributeSink::Guarded {
                    attributes: &mut *attributes,
                    guard,
                })?;
                *sunk += attributes.len() - before;
                Ok(block)
            }
            None => self.parse_block(AttributeSink::None),
        }
    }

    fn parse_for(&mut self) -> Result<For> {
        let token = self.expect(&[TokenKind::For])?;
        let mut node = For {
            expression: token.value,
            block: None,
            else_block: None,
            position: token.position,
        };

        if self.at(TokenKind::Indent) {
            node.block = Some(self.parse_block(AttributeSink::None)?);
        }

        if self.at(TokenKind::Else) {
            self.expect(&[TokenKind::Else])?;
            if !self.at(TokenKind::Indent) {
                return Err(self.unexpected());
            }
            node.else_block = Some(self.parse_block(AttributeSink::None)?);
        }

        Ok(node)
    }

    fn parse_import_module(&mut self) -> Result<Code> {
        let token = self.expect(&[TokenKind::ImportModule])?;
        let path = token.value.trim_matches('"');
        let ident = match token.get("ident") {
            "" => Path::new(path)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(path)
                .to_string(),
            ident => ident.to_string(),
        };
        let module = format!("{}{}", path, self.module_extension);
        Ok(Code::new(
            vec![format!("const {} = import({})", ident, quote(&module))],
            token.position,
        ))
    }

    fn parse_slot(&mut self) -> Result<SlotUse> {
        let token = self.expect(&[TokenKind::Slot])?;
        if self.open_comps.is_empty() {
            return Err(self.error(
                format!("Slot `{}` must be declared within a comp.", token.value),
                &token.position,
            ));
        }

        let scope = self.parse_params(token.get("Args"), &token.position)?;
        let index = self.open_comps.last().map_or(0, |comp| comp.slots.len());

        let mut slot = Slot {
            name: token.value.clone(),
            id: safe_id(&token.value),
            scope: scope.clone(),
            block: None,
            wrap: None,
            position: token.position.clone(),
        };

        if self.at(TokenKind::Indent) {
            let mut block = self.parse_block(AttributeSink::None)?;
            if let Some(Node::Wrap(_)) = block.children.first() {
                if let Node::Wrap(wrap) = block.children.remove(0) {
                    slot.wrap = Some(wrap);
                }
            }
            slot.block = Some(block);
        }

        if let Some(comp) = self.open_comps.last_mut() {
            let index = index.min(comp.slots.len());
            comp.slots.insert(index, slot);
        }

        Ok(SlotUse {
            id: safe_id(&token.value),
            name: token.value,
            scope,
            position: token.position,
        })
    }

    fn parse_wrap(&mut self) -> Result<Wrap> {
        let token = self.expect(&[TokenKind::Wrap])?;
        let block = self.parse_block(AttributeSink::None)?;
        Ok(Wrap {
            block,
            position: token.position,
        })
    }

    fn parse_slot_pass(&mut self) -> Result<SlotPass> {
        let token = self.expect(&[TokenKind::SlotPass])?;
        let call = host::parse_call(token.get("Header"))
            .map_err(|err| self.host_error("Parsing slot pass failed", err, &token.position))?;
        let params = call
            .args
            .to_params()
            .map_err(|err| self.error(err.message, &token.position))?;

        let mut node = SlotPass {
            name: *call.callee,
            params,
            block: None,
            position: token.position,
        };

        if self.at(TokenKind::Indent) {
            node.block = Some(self.parse_block(AttributeSink::None)?);
        }
        Ok(node)
    }

    fn parse_doctype(&mut self) -> Result<Doctype> {
        let token = self.expect(&[TokenKind::Doctype])?;
        Ok(Doctype {
            value: token.value,
            position: token.position,
        })
    }

    fn parse_comment(&mut self) -> Result<Comment> {
        let token = self.expect(&[TokenKind::Comment])?;
        let mut node = Comment {
            silent: token.get("Mode") == "silent",
            value: token.value,
            block: None,
            position: token.position,
        };

        if self.at(TokenKind::Indent) {
            node.block = Some(self.parse_block(AttributeSink::None)?);
        }
        Ok(node)
    }

    fn parse_text(&mut self) -> Result<Text> {
        let token = self.expect(&[TokenKind::Text])?;

        if token.get("Mode") == "raw" {
            return Ok(Text {
                segments: vec![TextSegment::Literal(token.value)],
                raw: true,
                position: token.position,
            });
        }

        let segments = split_interpolations(&token.value)
            .map_err(|message| self.error(message, &token.position))?;
        Ok(Text {
            segments,
            raw: false,
            position: token.position,
        })
    }

    fn parse_assignment(&mut self) -> Result<Assignment> {
        let token = self.expect(&[TokenKind::Assignment])?;
        Ok(Assignment {
            x: token.get("X").to_string(),
            op: token.get("Op").to_string(),
            expression: token.value,
            position: token.position,
        })
    }

    fn parse_code(&mut self) -> Result<Code> {
        let token = self.expect(&[TokenKind::Code])?;
        Ok(Code::new(token.values, token.position))
    }

    fn parse_tag(&mut self) -> Result<Tag> {
        let token = self.expect(&[TokenKind::Tag])?;
        let mut tag = Tag::new(token.value, token.position);

        loop {
            match self.current.kind {
                TokenKind::Indent => {
                    if tag.is_raw_text() {
                        self.scanner.enter_raw();
                    }
                    let block = self.parse_block(AttributeSink::Tag(&mut tag.attributes))?;
                    match tag.block.as_mut() {
                        Some(existing) => existing.children.extend(block.children),
                        None => tag.block = Some(block),
                    }
                    break;
                }
                TokenKind::Id | TokenKind::ClassName | TokenKind::Attribute => {
                    let token = self.expect(&[self.current.kind])?;
                    if token_condition(&token).is_some() {
                        return Err(self.error(
                            "Conditional attributes must be placed in a block within a tag.",
                            &token.position,
                        ));
                    }
                    tag.attributes.push(attribute_from_token(token, None));
                }
                TokenKind::Text if self.current.get("Mode") != "piped" => {
                    let text = self.parse_text()?;
                    let position = text.position.clone();
                    tag.block
                        .get_or_insert_with(|| Block::new(position))
                        .push_front(Node::Text(text));
                }
                _ => break,
            }
        }

        Ok(tag)
    }

    fn parse_func(&mut self) -> Result<Func> {
        let token = self.expect(&[TokenKind::Func])?;
        let params = self.parse_params(token.get("Args"), &token.position)?;
        let mut node = Func {
            exported: token.flag("Exported"),
            name: token.value,
            params,
            block: None,
            position: token.position,
        };

        if self.at(TokenKind::Indent) {
            node.block = Some(self.parse_block(AttributeSink::None)?);
        }
        Ok(node)
    }

    fn parse_comp(&mut self) -> Result<Comp> {
        let token = self.expect(&[TokenKind::Comp])?;
        let params = self.parse_params(token.get("Args"), &token.position)?;
        let comp = Comp::new(&token.value, params, token.flag("Exported"), token.position);

        if !self.at(TokenKind::Indent) {
            return Ok(comp);
        }

        self.open_comps.push(comp);
        let block = self.parse_block(AttributeSink::None);
        let mut comp = match self.open_comps.pop() {
            Some(comp) => comp,
            None => return Err(self.unexpected()),
        };
        comp.block = Some(block?);
        Ok(comp)
    }

    fn parse_comp_call(&mut self) -> Result<CompCall> {
        let token = self.expect(&[TokenKind::CompCall])?;
        let args = match token.get("Args") {
            "" => CallArgs::default(),
            header => host::parse_call_args(header).map_err(|err| {
                self.host_error(&format!("Parsing call of `{}` failed", token.value), err, &token.position)
            })?,
        };

        let mut call = CompCall {
            name: token.value.clone(),
            args,
            slot_passes: Vec::new(),
            init_code: None,
            position: token.position.clone(),
        };

        if !self.at(TokenKind::Indent) {
            return Ok(call);
        }

        let mut block = self.parse_block(AttributeSink::None)?;
        let mut rest = Vec::new();
        for child in block.children.drain(..) {
            match child {
                Node::SlotPass(pass) => call.slot_passes.push(pass),
                other => rest.push(other),
            }
        }

        if token.flag("WithCode") && matches!(rest.first(), Some(Node::Code(_))) {
            if let Node::Code(code) = rest.remove(0) {
                call.init_code = Some(code);
            }
        }

        if let Some(first) = rest.first() {
            let position = first.position().clone();
            block.children = rest;
            call.slot_passes.push(SlotPass {
                name: Expr::ident("main"),
                params: Params::proxy(),
                block: Some(block),
                position,
            });
        }

        Ok(call)
    }

    /// Cases are kept in source order; duplicates are not detected.
    fn parse_switch(&mut self) -> Result<Switch> {
        let token = self.expect(&[TokenKind::Switch])?;
        let mut node = Switch {
            expression: token.value,
            cases: Vec::new(),
            default: None,
            position: token.position,
        };

        if !self.at(TokenKind::Indent) {
            return Err(self.switch_without_cases(&node));
        }
        self.advance()?;

        loop {
            match self.current.kind {
                TokenKind::Blank => self.advance()?,
                TokenKind::Case => {
                    let token = self.expect(&[TokenKind::Case])?;
                    let content = if self.at(TokenKind::Indent) {
                        Some(self.parse_block(AttributeSink::None)?)
                    } else {
                        None
                    };
                    node.cases.push(Case {
                        expression: token.value,
                        content,
                        position: token.position,
                    });
                }
                TokenKind::Default => {
                    let token = self.expect(&[TokenKind::Default])?;
                    let content = if self.at(TokenKind::Indent) {
                        Some(self.parse_block(AttributeSink::None)?)
                    } else {
                        None
                    };
                    node.default = Some(DefaultCase {
                        content,
                        position: token.position,
                    });
                    while self.at(TokenKind::Blank) {
                        self.advance()?;
                    }
                    self.expect(&[TokenKind::Outdent])?;
                    break;
                }
                _ => {
                    self.expect(&[TokenKind::Case, TokenKind::Default, TokenKind::Outdent])?;
                    break;
                }
            }
        }

        if node.cases.is_empty() && node.default.is_none() {
            return Err(self.switch_without_cases(&node));
        }
        Ok(node)
    }

    fn switch_without_cases(&self, node: &Switch) -> CompilerError {
        self.error(
            format!("Switch `{}` requires at least one case or default.", node.expression),
            &node.position,
        )
    }

    fn parse_export(&mut self) -> Result<Export> {
        let token = self.expect(&[TokenKind::Export])?;
        let value = match token.get("Value").trim() {
            "" => None,
            value => Some(value.to_string()),
        };
        Ok(Export {
            name: token.get("Name").to_string(),
            value,
            position: token.position,
        })
    }

    fn parse_params(&self, args: &str, position: &SourcePosition) -> Result<Params> {
        if args.trim().is_empty() {
            return Ok(Params::default());
        }
        host::parse_params(args).map_err(|err| self.host_error("Parsing parameters failed", err, position))
    }
}

fn token_condition(token: &Token) -> Option<String> {
    match token.get("Condition").trim() {
        "" => None,
        condition => Some(condition.to_string()),
    }
}

fn attribute_from_token(token: Token, condition: Option<String>) -> Attribute {
    match token.kind {
        TokenKind::Id | TokenKind::ClassName => Attribute {
            name: if token.kind == TokenKind::Id { "id" } else { "class" }.to_string(),
            value: token.value,
            raw: true,
            flag: false,
            condition,
            elements: None,
            position: token.position,
        },
        _ => Attribute {
            raw: token.get("Mode") == "raw",
            flag: token.flag("Flag"),
            value: token.get("Content").to_string(),
            name: token.value,
            condition,
            elements: token.elements,
            position: token.position,
        },
    }
}

/// Split text on `#{expr}` and `${expr}` interpolations. A leading `=`
/// inside the braces is accepted and dropped.
fn split_interpolations(text: &str) -> std::result::Result<Vec<TextSegment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let bytes = text.as_bytes();
    let mut index = 0;

    while index < text.len() {
        let opens = (bytes[index] == b'#' || bytes[index] == b'$')
            && bytes.get(index + 1) == Some(&b'{');
        if !opens {
            let ch = text[index..].chars().next().unwrap_or_default();
            literal.push(ch);
            index += ch.len_utf8().max(1);
            continue;
        }

        let start = index + 2;
        let end = match closing_brace(&text[start..]) {
            Some(offset) => start + offset,
            None => return Err(format!("Unterminated interpolation in `{}`", text)),
        };

        let inner = text[start..end].trim();
        let inner = inner.strip_prefix('=').unwrap_or(inner).trim();
        if !literal.is_empty() {
            segments.push(TextSegment::Literal(std::mem::take(&mut literal)));
        }
        if !inner.is_empty() {
            segments.push(TextSegment::Expression(inner.to_string()));
        }
        index = end + 1;
    }

    if !literal.is_empty() {
        segments.push(TextSegment::Literal(literal));
    }
    Ok(segments)
}

/// Offset of the `}` closing an interpolation, skipping nested braces and
/// string literals.
fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && q != '`' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}
