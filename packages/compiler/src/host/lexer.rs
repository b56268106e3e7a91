/**
 * Host Expression Lexer
 *
 * Tokenizes the host engine's expression syntax: identifiers (which may
 * contain `$`), numbers, quoted and raw strings, and operators.
 */
use crate::chars;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TokenType {
    Character = 0,
    Identifier = 1,
    Keyword = 2,
    String = 3,
    RawString = 4,
    Operator = 5,
    Number = 6,
    Error = 7,
}

/// Token representation. `index` and `end` are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub index: usize,
    pub end: usize,
    pub token_type: TokenType,
    pub num_value: f64,
    pub str_value: String,
}

impl Token {
    pub fn new(
        index: usize,
        end: usize,
        token_type: TokenType,
        num_value: f64,
        str_value: String,
    ) -> Self {
        Token {
            index,
            end,
            token_type,
            num_value,
            str_value,
        }
    }

    pub fn operator(index: usize, end: usize, str_value: &str) -> Self {
        Token::new(index, end, TokenType::Operator, 0.0, str_value.to_string())
    }

    pub fn is_character(&self, code: char) -> bool {
        self.token_type == TokenType::Character && self.str_value.chars().next() == Some(code)
    }

    pub fn is_number(&self) -> bool {
        self.token_type == TokenType::Number
    }

    pub fn is_string(&self) -> bool {
        self.token_type == TokenType::String
    }

    pub fn is_raw_string(&self) -> bool {
        self.token_type == TokenType::RawString
    }

    pub fn is_identifier(&self) -> bool {
        self.token_type == TokenType::Identifier
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.token_type == TokenType::Keyword && self.str_value == keyword
    }

    pub fn is_operator(&self, operator: &str) -> bool {
        self.token_type == TokenType::Operator && self.str_value == operator
    }

    pub fn is_error(&self) -> bool {
        self.token_type == TokenType::Error
    }

    /// True when the number was written without a fraction or exponent.
    pub fn is_integer(&self) -> bool {
        self.is_number() && self.str_value.chars().all(|c| chars::is_digit(c) || c == '_')
    }
}

const KEYWORDS: &[&str] = &["nil", "true", "false"];

pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Lexer
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        Scanner::new(text).scan()
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Lexer::new()
    }
}

struct Scanner<'a> {
    input: &'a str,
    length: usize,
    index: usize,
    peek: char,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        let peek = input.chars().next().unwrap_or(chars::EOF);
        Scanner {
            input,
            length: input.len(),
            index: 0,
            peek,
        }
    }

    fn scan(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.scan_token() {
            let stop = token.is_error();
            tokens.push(token);
            if stop {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) {
        self.index += self.peek.len_utf8();
        self.peek = if self.index < self.length {
            self.input[self.index..].chars().next().unwrap_or(chars::EOF)
        } else {
            chars::EOF
        };
    }

    fn peek_next(&self) -> Option<char> {
        let mut it = self.input[self.index..].chars();
        it.next();
        it.next()
    }

    fn scan_token(&mut self) -> Option<Token> {
        while self.index < self.length && chars::is_whitespace(self.peek) {
            self.advance();
        }

        if self.index >= self.length {
            return None;
        }

        let start = self.index;
        let ch = self.peek;

        if chars::is_identifier_start(ch) {
            return Some(self.scan_identifier());
        }

        if chars::is_digit(ch) {
            return Some(self.scan_number(start));
        }

        let token = match ch {
            chars::PERIOD => {
                self.advance();
                if chars::is_digit(self.peek) {
                    return Some(self.scan_number(start));
                }
                if self.peek == chars::PERIOD && self.peek_next() == Some(chars::PERIOD) {
                    self.advance();
                    self.advance();
                    return Some(Token::operator(start, self.index, "..."));
                }
                Token::new(start, self.index, TokenType::Character, 0.0, ".".to_string())
            }
            chars::LPAREN
            | chars::RPAREN
            | chars::LBRACKET
            | chars::RBRACKET
            | chars::LBRACE
            | chars::RBRACE
            | chars::COMMA
            | chars::SEMICOLON
            | chars::AT => self.scan_character(start, ch),
            chars::COLON => {
                self.advance();
                if self.peek == chars::EQ {
                    self.advance();
                    return Some(Token::operator(start, self.index, ":="));
                }
                Token::new(start, self.index, TokenType::Character, 0.0, ":".to_string())
            }
            chars::SQ | chars::DQ => self.scan_string(ch),
            chars::BT => self.scan_raw_string(),
            chars::PLUS => self.scan_operator(start, "+"),
            chars::MINUS => self.scan_operator(start, "-"),
            chars::SLASH => self.scan_operator(start, "/"),
            chars::PERCENT => self.scan_operator(start, "%"),
            chars::STAR => {
                self.advance();
                if self.peek == chars::STAR {
                    self.advance();
                    return Some(Token::operator(start, self.index, "**"));
                }
                Token::operator(start, self.index, "*")
            }
            chars::AMPERSAND => {
                self.advance();
                if self.peek == chars::AMPERSAND {
                    self.advance();
                    return Some(Token::operator(start, self.index, "&&"));
                }
                Token::operator(start, self.index, "&")
            }
            chars::BAR => {
                self.advance();
                if self.peek == chars::BAR {
                    self.advance();
                    return Some(Token::operator(start, self.index, "||"));
                }
                Token::operator(start, self.index, "|")
            }
            chars::LT => self.scan_complex_operator(start, "<", chars::EQ, "<="),
            chars::GT => self.scan_complex_operator(start, ">", chars::EQ, ">="),
            chars::BANG => self.scan_complex_operator(start, "!", chars::EQ, "!="),
            chars::EQ => {
                self.advance();
                if self.peek == chars::EQ {
                    self.advance();
                    return Some(Token::operator(start, self.index, "=="));
                }
                if self.peek == chars::GT {
                    self.advance();
                    return Some(Token::operator(start, self.index, "=>"));
                }
                Token::operator(start, self.index, "=")
            }
            chars::QUESTION => {
                self.advance();
                if self.peek == chars::PERIOD && !self.peek_next().map_or(false, chars::is_digit) {
                    self.advance();
                    return Some(Token::operator(start, self.index, "?."));
                }
                if self.peek == chars::QUESTION {
                    self.advance();
                    return Some(Token::operator(start, self.index, "??"));
                }
                Token::operator(start, self.index, "?")
            }
            _ => {
                self.advance();
                Token::new(
                    start,
                    self.index,
                    TokenType::Error,
                    0.0,
                    format!("unexpected character '{}' at column {}", ch, start),
                )
            }
        };
        Some(token)
    }

    fn scan_character(&mut self, start: usize, ch: char) -> Token {
        self.advance();
        Token::new(start, self.index, TokenType::Character, 0.0, ch.to_string())
    }

    fn scan_operator(&mut self, start: usize, op: &str) -> Token {
        self.advance();
        Token::operator(start, self.index, op)
    }

    fn scan_complex_operator(&mut self, start: usize, op1: &str, two: char, op2: &str) -> Token {
        self.advance();
        if self.peek == two {
            self.advance();
            Token::operator(start, self.index, op2)
        } else {
            Token::operator(start, self.index, op1)
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.index;
        self.advance();

        while self.index < self.length && chars::is_identifier_part(self.peek) {
            self.advance();
        }

        let str_value = self.input[start..self.index].to_string();
        let token_type = if KEYWORDS.contains(&str_value.as_str()) {
            TokenType::Keyword
        } else {
            TokenType::Identifier
        };

        Token::new(start, self.index, token_type, 0.0, str_value)
    }

    fn scan_number(&mut self, start: usize) -> Token {
        while self.index < self.length {
            if chars::is_digit(self.peek) || self.peek == chars::UNDERSCORE {
                self.advance();
            } else if self.peek == chars::PERIOD {
                if !self.peek_next().map_or(false, chars::is_digit) {
                    break;
                }
                self.advance();
            } else if self.peek == 'e' || self.peek == 'E' {
                self.advance();
                if self.peek == chars::PLUS || self.peek == chars::MINUS {
                    self.advance();
                }
            } else {
                break;
            }
        }

        let str_value = self.input[start..self.index].to_string();
        let value_str: String = str_value.chars().filter(|&c| c != chars::UNDERSCORE).collect();
        match value_str.parse::<f64>() {
            Ok(num_value) => Token::new(start, self.index, TokenType::Number, num_value, str_value),
            Err(_) => Token::new(
                start,
                self.index,
                TokenType::Error,
                0.0,
                format!("invalid number '{}' at column {}", str_value, start),
            ),
        }
    }

    fn scan_string(&mut self, quote: char) -> Token {
        let start = self.index;
        self.advance();

        let mut buffer = String::new();
        let mut escaped = false;

        while self.index < self.length {
            let ch = self.peek;

            if escaped {
                buffer.push(match ch {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '0' => '\0',
                    _ => ch,
                });
                escaped = false;
                self.advance();
            } else if ch == chars::BACKSLASH {
                escaped = true;
                self.advance();
            } else if ch == quote {
                self.advance();
                return Token::new(start, self.index, TokenType::String, 0.0, buffer);
            } else {
                buffer.push(ch);
                self.advance();
            }
        }

        Token::new(
            start,
            self.index,
            TokenType::Error,
            0.0,
            format!("unterminated quote at column {}", start),
        )
    }

    /// Backtick strings carry their content verbatim.
    fn scan_raw_string(&mut self) -> Token {
        let start = self.index;
        self.advance();
        let content_start = self.index;

        while self.index < self.length {
            if self.peek == chars::BT {
                let value = self.input[content_start..self.index].to_string();
                self.advance();
                return Token::new(start, self.index, TokenType::RawString, 0.0, value);
            }
            self.advance();
        }

        Token::new(
            start,
            self.index,
            TokenType::Error,
            0.0,
            format!("unterminated raw string at column {}", start),
        )
    }
}
