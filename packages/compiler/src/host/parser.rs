/**
 * Host Expression Parser
 *
 * Recursive-descent parser over the host lexer's tokens. Besides full
 * expressions it exposes the narrower entry points the template front end
 * needs: key/value attribute lists, parameter lists, call headers and
 * `true ? cond` conditions.
 */
use super::ast::*;
use super::lexer::{Lexer, Token, TokenType};
use super::HostError;
use crate::chars;

pub type Result<T> = std::result::Result<T, HostError>;

const CONDITION_PREFIX: &str = "true ? ";

pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            lexer: Lexer::new(),
        }
    }

    /// Parse one complete expression.
    pub fn parse_expr(&self, input: &str) -> Result<Expr> {
        let mut ast = self.start(input)?;
        let expr = ast.parse_expression()?;
        ast.expect_end()?;
        Ok(expr)
    }

    /// Parse the `[...]` list at the start of `input`, returning it with the
    /// number of bytes consumed. Text after the closing bracket is ignored.
    pub fn parse_key_value_array(&self, input: &str) -> Result<(KeyValueArray, usize)> {
        let mut ast = self.start(input)?;
        ast.expect_character(chars::LBRACKET)?;
        let elements = ast.parse_key_value_elements(chars::RBRACKET)?;
        let consumed = ast.last_end;
        Ok((KeyValueArray::new(elements), consumed))
    }

    /// Parse a parameter list without its parentheses.
    pub fn parse_params(&self, input: &str) -> Result<Params> {
        let mut ast = self.start(input)?;
        let params = ast.parse_params()?;
        ast.expect_end()?;
        Ok(params)
    }

    /// Parse `callee(args)` or a bare callee. The callee is an identifier
    /// (dashes allowed), a parenthesized expression or a string.
    pub fn parse_call(&self, input: &str) -> Result<Call> {
        let mut ast = self.start(input)?;
        let callee = ast.parse_callee()?;
        let args = if ast.consume_optional_character(chars::LPAREN) {
            ast.parse_call_arguments(chars::RPAREN)?
        } else {
            CallArgs::default()
        };
        ast.expect_end()?;
        Ok(Call {
            callee: Box::new(callee),
            args,
        })
    }

    /// Parse call arguments without their parentheses.
    pub fn parse_call_args(&self, input: &str) -> Result<CallArgs> {
        let mut ast = self.start(input)?;
        let args = ast.parse_arguments_until(None)?;
        ast.expect_end()?;
        Ok(args)
    }

    /// Parse `COND` or `COND : ELSE` as the branches of `true ? ...`.
    pub fn parse_condition(&self, input: &str) -> Result<Conditional> {
        let source = format!("{}{}", CONDITION_PREFIX, input);
        let expr = self.parse_expr(&source).map_err(|err| {
            HostError::new(
                err.message,
                err.offset.saturating_sub(CONDITION_PREFIX.len()),
            )
        })?;
        match expr {
            Expr::Conditional(cond) => Ok(cond),
            _ => Err(HostError::new("expected a conditional expression", 0)),
        }
    }

    fn start<'a>(&self, input: &'a str) -> Result<ParseAST<'a>> {
        let tokens = self.lexer.tokenize(input);
        Ok(ParseAST::new(input, tokens))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

struct ParseAST<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    index: usize,
    /// End offset of the last consumed token.
    last_end: usize,
}

impl<'a> ParseAST<'a> {
    fn new(input: &'a str, tokens: Vec<Token>) -> Self {
        ParseAST {
            input,
            tokens,
            index: 0,
            last_end: 0,
        }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    fn advance(&mut self) {
        if let Some(token) = self.tokens.get(self.index) {
            self.last_end = token.end;
        }
        self.index += 1;
    }

    fn input_index(&self) -> usize {
        self.current().map_or(self.input.len(), |t| t.index)
    }

    fn error(&self, message: impl Into<String>) -> HostError {
        if let Some(token) = self.current().filter(|t| t.is_error()) {
            return HostError::new(token.str_value.clone(), token.index);
        }
        HostError::new(message, self.input_index())
    }

    fn unexpected(&self) -> HostError {
        match self.current() {
            Some(token) => self.error(format!("unexpected token '{}'", self.token_text(token))),
            None => self.error("unexpected end of expression"),
        }
    }

    fn token_text(&self, token: &Token) -> &str {
        &self.input[token.index..token.end]
    }

    fn at_character(&self, code: char) -> bool {
        self.current().map_or(false, |t| t.is_character(code))
    }

    fn at_operator(&self, op: &str) -> bool {
        self.current().map_or(false, |t| t.is_operator(op))
    }

    fn consume_optional_character(&mut self, code: char) -> bool {
        if self.at_character(code) {
            self.advance();
            return true;
        }
        false
    }

    fn consume_optional_operator(&mut self, op: &str) -> bool {
        if self.at_operator(op) {
            self.advance();
            return true;
        }
        false
    }

    fn expect_character(&mut self, code: char) -> Result<()> {
        if self.consume_optional_character(code) {
            Ok(())
        } else if self.current().is_none() {
            Err(self.error(format!("expected '{}', found end of expression", code)))
        } else {
            Err(self.error(format!("expected '{}'", code)))
        }
    }

    fn expect_end(&self) -> Result<()> {
        if self.current().is_some() {
            return Err(self.unexpected());
        }
        Ok(())
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current() {
            Some(token) if token.is_identifier() => {
                let name = token.str_value.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_conditional()
    }

    /// Parse ternary conditional; the else branch is optional.
    fn parse_conditional(&mut self) -> Result<Expr> {
        let condition = self.parse_logical_or()?;

        if !self.consume_optional_operator("?") {
            return Ok(condition);
        }

        let true_exp = self.parse_conditional()?;
        let false_exp = if self.consume_optional_character(chars::COLON) {
            Some(Box::new(self.parse_conditional()?))
        } else {
            None
        };

        Ok(Expr::Conditional(Conditional {
            condition: Box::new(condition),
            true_exp: Box::new(true_exp),
            false_exp,
        }))
    }

    fn parse_binary_level(
        &mut self,
        operators: &[&str],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut result = next(self)?;

        while let Some(op) = self
            .current()
            .filter(|t| t.token_type == TokenType::Operator)
            .and_then(|t| operators.iter().find(|op| **op == t.str_value))
        {
            let operation = op.to_string();
            self.advance();
            let right = next(self)?;
            result = Expr::binary(&operation, result, right);
        }

        Ok(result)
    }

    fn parse_logical_or(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["||"], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["&&"], Self::parse_nullish_coalescing)
    }

    fn parse_nullish_coalescing(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["??"], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["==", "!="], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["<", ">", "<=", ">="], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_prefix)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        for op in ["!", "-", "+"] {
            if self.consume_optional_operator(op) {
                let expr = self.parse_prefix()?;
                return Ok(Expr::Unary(Unary {
                    operator: op.to_string(),
                    expr: Box::new(expr),
                }));
            }
        }
        self.parse_call_chain()
    }

    fn parse_call_chain(&mut self) -> Result<Expr> {
        let mut result = self.parse_primary()?;

        loop {
            if self.consume_optional_character(chars::PERIOD) {
                let name = self.expect_identifier()?;
                result = Expr::Selector(Selector {
                    receiver: Box::new(result),
                    name,
                    safe: false,
                });
            } else if self.consume_optional_operator("?.") {
                if self.consume_optional_character(chars::LBRACKET) {
                    let key = self.parse_expression()?;
                    self.expect_character(chars::RBRACKET)?;
                    result = Expr::Index(Index {
                        receiver: Box::new(result),
                        key: Box::new(key),
                        safe: true,
                    });
                } else {
                    let name = self.expect_identifier()?;
                    result = Expr::Selector(Selector {
                        receiver: Box::new(result),
                        name,
                        safe: true,
                    });
                }
            } else if self.consume_optional_character(chars::LBRACKET) {
                let key = self.parse_expression()?;
                self.expect_character(chars::RBRACKET)?;
                result = Expr::Index(Index {
                    receiver: Box::new(result),
                    key: Box::new(key),
                    safe: false,
                });
            } else if self.consume_optional_character(chars::LPAREN) {
                let args = self.parse_call_arguments(chars::RPAREN)?;
                result = Expr::Call(Call {
                    callee: Box::new(result),
                    args,
                });
            } else {
                break;
            }
        }

        Ok(result)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = match self.current() {
            Some(token) => token.clone(),
            None => return Err(self.error("unexpected end of expression")),
        };

        match token.token_type {
            TokenType::Keyword => {
                self.advance();
                Ok(match token.str_value.as_str() {
                    "true" => Expr::Bool(true),
                    "false" => Expr::Bool(false),
                    _ => Expr::Nil,
                })
            }
            TokenType::Identifier => {
                self.advance();
                Ok(Expr::Ident(token.str_value))
            }
            TokenType::Number => {
                self.advance();
                Ok(number_literal(&token))
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Str(token.str_value))
            }
            TokenType::RawString => {
                self.advance();
                Ok(Expr::RawStr(token.str_value))
            }
            TokenType::Character if token.is_character(chars::LPAREN) => {
                self.advance();
                if self.consume_optional_character(chars::SEMICOLON) {
                    let elements = self.parse_key_value_elements(chars::RPAREN)?;
                    return Ok(Expr::KeyValueArray(KeyValueArray {
                        elements,
                        paren: true,
                    }));
                }
                let expr = self.parse_expression()?;
                self.expect_character(chars::RPAREN)?;
                Ok(Expr::Paren(Box::new(expr)))
            }
            TokenType::Character if token.is_character(chars::LBRACKET) => {
                self.advance();
                if self.is_key_value_start() {
                    let elements = self.parse_key_value_elements(chars::RBRACKET)?;
                    return Ok(Expr::KeyValueArray(KeyValueArray::new(elements)));
                }
                self.parse_literal_array()
            }
            TokenType::Character if token.is_character(chars::LBRACE) => {
                self.advance();
                self.parse_literal_map()
            }
            _ => Err(self.unexpected()),
        }
    }

    /// After `[`: a list is a key/value array when its first element is
    /// followed by `=`.
    fn is_key_value_start(&mut self) -> bool {
        let saved = (self.index, self.last_end);
        let result = self.parse_key_value_key().is_ok() && self.at_operator("=");
        self.index = saved.0;
        self.last_end = saved.1;
        result
    }

    fn parse_literal_array(&mut self) -> Result<Expr> {
        let mut elements = Vec::new();
        while !self.consume_optional_character(chars::RBRACKET) {
            elements.push(self.parse_expression()?);
            if !self.consume_optional_character(chars::COMMA) {
                self.expect_character(chars::RBRACKET)?;
                break;
            }
        }
        Ok(Expr::Array(elements))
    }

    fn parse_literal_map(&mut self) -> Result<Expr> {
        let mut entries = Vec::new();
        while !self.consume_optional_character(chars::RBRACE) {
            let key = match self.current() {
                Some(t) if t.is_identifier() || t.token_type == TokenType::Keyword => {
                    let key = Expr::Ident(t.str_value.clone());
                    self.advance();
                    key
                }
                Some(t) if t.is_string() => {
                    let key = Expr::Str(t.str_value.clone());
                    self.advance();
                    key
                }
                _ => return Err(self.error("expected dictionary key")),
            };
            self.expect_character(chars::COLON)?;
            let value = self.parse_expression()?;
            entries.push(DictEntry { key, value });
            if !self.consume_optional_character(chars::COMMA) {
                self.expect_character(chars::RBRACE)?;
                break;
            }
        }
        Ok(Expr::Dict(entries))
    }

    /// Parse `k=v, flag, ...` up to and including `close`.
    fn parse_key_value_elements(&mut self, close: char) -> Result<Vec<KeyValue>> {
        let mut elements = Vec::new();
        while !self.consume_optional_character(close) {
            let key = self.parse_key_value_key()?;
            let value = if self.consume_optional_operator("=") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            elements.push(KeyValue::new(key, value));
            if !self.consume_optional_character(chars::COMMA) {
                self.expect_character(close)?;
                break;
            }
        }
        Ok(elements)
    }

    /// A key is an attribute name (identifier runs glued by `- : . @`),
    /// a keyword literal, or any postfix expression (`(cond)`, `"str"`,
    /// a nested list).
    fn parse_key_value_key(&mut self) -> Result<Expr> {
        let starts_name = self.current().map_or(false, |t| {
            t.is_identifier() || t.is_character(chars::AT) || t.token_type == TokenType::Keyword
        });
        if !starts_name {
            return self.parse_call_chain();
        }

        let name = self.parse_joined_name(|t| {
            t.is_identifier()
                || t.is_number()
                || t.token_type == TokenType::Keyword
                || t.is_operator("-")
                || t.is_character(chars::COLON)
                || t.is_character(chars::PERIOD)
                || t.is_character(chars::AT)
        });
        Ok(match name.as_str() {
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "nil" => Expr::Nil,
            _ => Expr::Ident(name),
        })
    }

    /// Join adjacent tokens accepted by `accept` into one name.
    fn parse_joined_name(&mut self, accept: fn(&Token) -> bool) -> String {
        let mut name = String::new();
        let mut end: Option<usize> = None;
        while let Some(token) = self.current() {
            if end.map_or(false, |e| e != token.index) || !accept(token) {
                break;
            }
            name.push_str(&self.input[token.index..token.end]);
            end = Some(token.end);
            self.advance();
        }
        name
    }

    fn parse_callee(&mut self) -> Result<Expr> {
        match self.current() {
            Some(t) if t.is_identifier() => {
                let name = self.parse_joined_name(|t| {
                    t.is_identifier() || t.is_number() || t.is_operator("-")
                });
                Ok(Expr::Ident(name))
            }
            Some(t) if t.is_string() => {
                let value = t.str_value.clone();
                self.advance();
                Ok(Expr::Str(value))
            }
            Some(t) if t.is_character(chars::LPAREN) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_character(chars::RPAREN)?;
                Ok(Expr::Paren(Box::new(expr)))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_call_arguments(&mut self, close: char) -> Result<CallArgs> {
        let args = self.parse_arguments_until(Some(close))?;
        self.expect_character(close)?;
        Ok(args)
    }

    /// Positional arguments, then named ones. Named arguments follow a `;`
    /// or are recognised by `name=`.
    fn parse_arguments_until(&mut self, close: Option<char>) -> Result<CallArgs> {
        let mut args = CallArgs::default();
        let mut named_section = false;

        loop {
            let at_close = match close {
                Some(c) => self.at_character(c),
                None => self.current().is_none(),
            };
            if at_close {
                break;
            }

            if self.consume_optional_character(chars::SEMICOLON) {
                named_section = true;
                continue;
            }

            if self.consume_optional_operator("**") {
                let value = self.parse_expression()?;
                args.named.push(NamedArg {
                    name: None,
                    value: Some(value),
                    spread: true,
                });
            } else if !named_section && self.consume_optional_operator("*") {
                let value = self.parse_expression()?;
                args.positional.push(Arg {
                    value,
                    spread: true,
                });
            } else if named_section || self.is_named_argument() {
                named_section = true;
                let name = self.parse_key_value_key()?;
                let value = if self.consume_optional_operator("=") {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                args.named.push(NamedArg {
                    name: Some(name),
                    value,
                    spread: false,
                });
            } else {
                let value = self.parse_expression()?;
                args.positional.push(Arg {
                    value,
                    spread: false,
                });
            }

            if !self.consume_optional_character(chars::COMMA) {
                if self.at_character(chars::SEMICOLON) {
                    continue;
                }
                break;
            }
        }

        Ok(args)
    }

    fn is_named_argument(&self) -> bool {
        let name = self
            .current()
            .map_or(false, |t| t.is_identifier() || t.is_string());
        name && self.peek(1).map_or(false, |t| t.is_operator("="))
    }

    fn parse_params(&mut self) -> Result<Params> {
        let mut params = Params::default();

        while self.current().is_some() {
            if self.consume_optional_operator("**") {
                params.named_variadic = Some(self.expect_identifier()?);
            } else if self.consume_optional_operator("*") {
                params.variadic = Some(self.expect_identifier()?);
            } else {
                let name = self.expect_identifier()?;
                if self.consume_optional_operator("=") {
                    let default = self.parse_expression()?;
                    params.push_named(name, default);
                } else if !params.named.is_empty() || params.named_variadic.is_some() {
                    return Err(self.error(format!(
                        "positional parameter '{}' after named parameters",
                        name
                    )));
                } else {
                    params.positional.push(name);
                }
            }

            if !self.consume_optional_character(chars::COMMA)
                && !self.consume_optional_character(chars::SEMICOLON)
            {
                break;
            }
        }

        Ok(params)
    }
}

fn number_literal(token: &Token) -> Expr {
    if token.is_integer() {
        let digits: String = token.str_value.chars().filter(|c| *c != '_').collect();
        if let Ok(value) = digits.parse::<i64>() {
            return Expr::Int(value);
        }
    }
    Expr::Float(token.num_value)
}
