//! Lexer (tokenizer) for C source code
//!
//! Produces one [`Token`] per call to [`Lexer::next_token`]. The parser picks
//! the [`LexMode`] for each call: `#include` file names and `#define` bodies
//! are lexed as single opaque tokens instead of being split up.
//!
//! Lexical problems never abort tokenization. Unterminated comments and
//! literals, malformed numbers and stray characters come back as
//! [`TokenKind::Invalid`] tokens and the caller decides what to do with them.

use super::tree::SourceLocation;
use std::fmt;

/// Longest accepted identifier
pub const MAX_IDENTIFIER_LENGTH: usize = 1023;

/// Longest accepted comment, delimiters included
pub const MAX_COMMENT_LENGTH: usize = 65534;

/// Longest accepted lexeme of any other kind
pub const MAX_SENTENCE_LENGTH: usize = 65534;

/// Characters lexed as [`TokenKind::SingleChar`]
const STRUCTURAL_CHARS: &[char] = &['{', '}', '(', ')', '[', ']', ';', ',', '#', '*', '='];

/// Single-character operators
const OPERATOR_CHARS: &[char] = &['+', '-', '/', '%', '<', '>', '!', '&', '|', '^', '~', '?', ':', '.'];

/// Multi-character operators, longest first
const MULTI_CHAR_OPERATORS: &[&str] = &[
    "...", "<<=", ">>=", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "*=",
    "/=", "%=", "+=", "-=", "&=", "^=", "|=", "##",
];

/// Lexical classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// One of `{ } ( ) [ ] ; , # * =`
    SingleChar,
    Identifier,
    NumberLiteral,
    StringLiteral,
    CharLiteral,
    /// `<...>` or `"..."` lexed in [`LexMode::IncludeFilename`]
    IncludeLiteral,
    /// Rest of a logical line lexed in [`LexMode::DefineLiteral`]
    DefineLiteral,
    Operator,
    BlockComment,
    LineComment,
    Invalid,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::BlockComment | TokenKind::LineComment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::SingleChar => "single-char",
            TokenKind::Identifier => "identifier",
            TokenKind::NumberLiteral => "number literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::CharLiteral => "char literal",
            TokenKind::IncludeLiteral => "include literal",
            TokenKind::DefineLiteral => "define literal",
            TokenKind::Operator => "operator",
            TokenKind::BlockComment => "block comment",
            TokenKind::LineComment => "line comment",
            TokenKind::Invalid => "invalid token",
        };
        f.write_str(name)
    }
}

/// How the next token is lexed. Only ever applies to a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexMode {
    #[default]
    Normal,
    IncludeFilename,
    DefineLiteral,
}

/// A classified lexeme with the position of its first character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation, text: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            text: text.into(),
        }
    }

    /// True for a structural single-char token equal to `c`.
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::SingleChar && self.text.len() == 1 && self.text.starts_with(c)
    }

    /// True for an identifier spelled `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' at {}", self.kind, self.text, self.location)
    }
}

/// Lexer for C source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Create a lexer over raw file bytes. Invalid UTF-8 is replaced.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(&String::from_utf8_lossy(bytes))
    }

    /// Lex the next token in the requested mode; `None` at end of input.
    pub fn next_token(&mut self, mode: LexMode) -> Option<Token> {
        match mode {
            LexMode::Normal => self.normal_token(),
            LexMode::IncludeFilename => self.include_literal(),
            LexMode::DefineLiteral => Some(self.define_literal()),
        }
    }

    fn normal_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let loc = self.current_location();
        let ch = self.peek()?;

        let token = match ch {
            '/' if self.peek_ahead(1) == Some('*') => self.block_comment(loc),
            '/' if self.peek_ahead(1) == Some('/') => self.line_comment(loc),
            '"' => self.quoted_literal(loc, '"', TokenKind::StringLiteral),
            '\'' => self.quoted_literal(loc, '\'', TokenKind::CharLiteral),
            '0'..='9' => self.number_literal(loc),
            '.' if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => self.number_literal(loc),
            c if is_identifier_start(c) => self.identifier(loc),
            _ => self.punctuator(loc),
        };

        Some(token)
    }

    /// `/* ... */`, delimiters kept
    fn block_comment(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();
        text.push(self.advance().unwrap_or('/'));
        text.push(self.advance().unwrap_or('*'));

        loop {
            match self.peek() {
                None => return Token::new(TokenKind::Invalid, loc, text),
                Some('*') if self.peek_ahead(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    text.push_str("*/");
                    break;
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        bounded(TokenKind::BlockComment, loc, text, MAX_COMMENT_LENGTH)
    }

    /// `// ...` up to, not including, the newline
    fn line_comment(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        let text = text.trim_end_matches('\r').to_string();
        bounded(TokenKind::LineComment, loc, text, MAX_COMMENT_LENGTH)
    }

    /// String or char literal, quotes kept verbatim
    fn quoted_literal(&mut self, loc: SourceLocation, quote: char, kind: TokenKind) -> Token {
        let mut text = String::new();
        if let Some(c) = self.advance() {
            text.push(c);
        }

        loop {
            match self.peek() {
                None | Some('\n') => return Token::new(TokenKind::Invalid, loc, text),
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    match self.advance() {
                        Some(escaped) => text.push(escaped),
                        None => return Token::new(TokenKind::Invalid, loc, text),
                    }
                }
                Some(c) if c == quote => {
                    text.push(c);
                    self.advance();
                    break;
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        if kind == TokenKind::CharLiteral && text.chars().count() == 2 {
            return Token::new(TokenKind::Invalid, loc, text);
        }

        bounded(kind, loc, text, MAX_SENTENCE_LENGTH)
    }

    /// pp-number run, validated afterwards
    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();

        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-') && {
                let hex = is_hex_prefixed(&text);
                (!hex && text.ends_with(['e', 'E'])) || (hex && text.ends_with(['p', 'P']))
            };
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if is_valid_number(&text) {
            bounded(TokenKind::NumberLiteral, loc, text, MAX_SENTENCE_LENGTH)
        } else {
            Token::new(TokenKind::Invalid, loc, text)
        }
    }

    fn identifier(&mut self, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if is_identifier_continue(c) {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        bounded(TokenKind::Identifier, loc, ident, MAX_IDENTIFIER_LENGTH)
    }

    fn punctuator(&mut self, loc: SourceLocation) -> Token {
        for op in MULTI_CHAR_OPERATORS {
            if self.lookahead_is(op) {
                for _ in 0..op.len() {
                    self.advance();
                }
                return Token::new(TokenKind::Operator, loc, *op);
            }
        }

        let ch = self.advance().unwrap_or_default();
        let kind = if STRUCTURAL_CHARS.contains(&ch) {
            TokenKind::SingleChar
        } else if OPERATOR_CHARS.contains(&ch) {
            TokenKind::Operator
        } else {
            TokenKind::Invalid
        };
        Token::new(kind, loc, ch.to_string())
    }

    /// `<file>` or `"file"` on the current line
    fn include_literal(&mut self) -> Option<Token> {
        self.skip_blanks();
        let loc = self.current_location();

        let close = match self.peek()? {
            '<' => '>',
            '"' => '"',
            _ => {
                let rest = self.rest_of_line();
                return Some(Token::new(TokenKind::Invalid, loc, rest.trim_end()));
            }
        };

        let mut text = String::new();
        if let Some(c) = self.advance() {
            text.push(c);
        }
        loop {
            match self.peek() {
                None | Some('\n') => return Some(Token::new(TokenKind::Invalid, loc, text)),
                Some(c) => {
                    text.push(c);
                    self.advance();
                    if c == close {
                        break;
                    }
                }
            }
        }

        Some(bounded(TokenKind::IncludeLiteral, loc, text, MAX_SENTENCE_LENGTH))
    }

    /// Remainder of the logical line. Backslash-newline pairs are spliced
    /// out and a `//` comment outside quotes ends the body.
    fn define_literal(&mut self) -> Token {
        self.skip_blanks();
        let loc = self.current_location();
        let mut text = String::new();
        let mut quote: Option<char> = None;

        while let Some(c) = self.peek() {
            match c {
                '\n' => break,
                '\\' if self.peek_ahead(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                    continue;
                }
                '\\' if self.peek_ahead(1) == Some('\r') && self.peek_ahead(2) == Some('\n') => {
                    self.advance();
                    self.advance();
                    self.advance();
                    continue;
                }
                '\\' if quote.is_some() => {
                    text.push(c);
                    self.advance();
                    if let Some(escaped) = self.peek().filter(|&e| e != '\n') {
                        text.push(escaped);
                        self.advance();
                    }
                    continue;
                }
                '/' if quote.is_none() && self.peek_ahead(1) == Some('/') => break,
                '"' | '\'' => match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                },
                _ => {}
            }
            text.push(c);
            self.advance();
        }

        let text = text.trim_end().to_string();
        bounded(TokenKind::DefineLiteral, loc, text, MAX_SENTENCE_LENGTH)
    }

    fn rest_of_line(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    /// Skip whitespace, including backslash-newline splices
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n' | '\x0b' | '\x0c') => {
                    self.advance();
                }
                Some('\\') if self.peek_ahead(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Skip spaces and tabs without leaving the current line
    fn skip_blanks(&mut self) {
        while let Some(' ' | '\t' | '\x0b' | '\x0c') = self.peek() {
            self.advance();
        }
    }

    fn lookahead_is(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_ahead(i) == Some(c))
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Position of the next unread character.
    pub fn location(&self) -> SourceLocation {
        self.current_location()
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token(LexMode::Normal)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_hex_prefixed(text: &str) -> bool {
    text.starts_with("0x") || text.starts_with("0X")
}

/// Over-long lexemes turn into invalid tokens
fn bounded(kind: TokenKind, loc: SourceLocation, text: String, limit: usize) -> Token {
    if text.chars().count() > limit {
        Token::new(TokenKind::Invalid, loc, text)
    } else {
        Token::new(kind, loc, text)
    }
}

fn strip_suffix<'a>(body: &'a str, allowed: &[char]) -> (&'a str, &'a str) {
    let split = body.trim_end_matches(allowed).len();
    body.split_at(split)
}

/// Checks a pp-number run against the C integer and floating forms.
fn is_valid_number(text: &str) -> bool {
    if let Some(body) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return is_valid_hex(body);
    }
    if let Some(body) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        let (digits, suffix) = strip_suffix(body, &['u', 'U', 'l', 'L']);
        return !digits.is_empty() && digits.chars().all(|c| c == '0' || c == '1') && suffix.len() <= 3;
    }

    let is_float = text.contains(['.', 'e', 'E']);
    let allowed: &[char] = if is_float {
        &['f', 'F', 'l', 'L']
    } else {
        &['u', 'U', 'l', 'L']
    };
    let (body, suffix) = strip_suffix(text, allowed);
    if suffix.len() > 3 || body.is_empty() {
        return false;
    }

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();

    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if let Some(fraction) = fraction {
        if !fraction.chars().all(|c| c.is_ascii_digit()) || (whole.is_empty() && fraction.is_empty()) {
            return false;
        }
    }
    if let Some(exponent) = exponent {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }
    if !is_float && whole.len() > 1 && whole.starts_with('0') {
        return whole.chars().all(|c| ('0'..='7').contains(&c));
    }
    true
}

fn is_valid_hex(body: &str) -> bool {
    let is_float = body.contains(['.', 'p', 'P']);
    let allowed: &[char] = if is_float {
        &['f', 'F', 'l', 'L']
    } else {
        &['u', 'U', 'l', 'L']
    };

    let (mantissa, exponent) = match body.find(['p', 'P']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    match exponent {
        Some(exponent) => {
            let (exponent, suffix) = strip_suffix(exponent, allowed);
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            let mantissa_digits: String = mantissa.chars().filter(|&c| c != '.').collect();
            suffix.len() <= 2
                && mantissa.matches('.').count() <= 1
                && !mantissa_digits.is_empty()
                && mantissa_digits.chars().all(|c| c.is_ascii_hexdigit())
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit())
        }
        None if is_float => false,
        None => {
            let (digits, suffix) = strip_suffix(mantissa, allowed);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) && suffix.len() <= 3
        }
    }
}
