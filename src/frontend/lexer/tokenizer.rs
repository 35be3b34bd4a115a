//! Character-level scanner with significant indentation.
//!
//! Logical lines are delimited by `Newline` tokens; changes in leading
//! whitespace emit synthetic `Indent`/`Dedent` tokens against an
//! indent-level stack. A dedent that matches no level on the stack is a
//! fatal lexical error.

use super::tokens::{LexError, Token, TokenKind};
use crate::util::span::{Position, Span};
use once_cell::sync::Lazy;
use std::collections::{HashMap, VecDeque};
use std::iter::Peekable;
use std::str::Chars;

/// Tab stops for indent measurement
const TAB_WIDTH: usize = 4;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("class", TokenKind::KwClass),
        ("model", TokenKind::KwModel),
        ("process", TokenKind::KwProcess),
        ("data", TokenKind::KwData),
        ("func", TokenKind::KwFunc),
        ("block", TokenKind::KwBlock),
        ("if", TokenKind::KwIf),
        ("elif", TokenKind::KwElif),
        ("else", TokenKind::KwElse),
        ("pass", TokenKind::KwPass),
        ("compile", TokenKind::KwCompile),
        ("pragma", TokenKind::KwPragma),
        ("param", TokenKind::KwParam),
        ("const", TokenKind::KwConst),
        ("and", TokenKind::KwAnd),
        ("or", TokenKind::KwOr),
        ("not", TokenKind::KwNot),
    ])
});

/// Main lexer structure
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    start_offset: usize,
    start_line: usize,
    start_column: usize,
    indent_stack: Vec<usize>,
    pending: VecDeque<Token>,
    at_line_start: bool,
    paren_depth: usize,
    line_had_tokens: bool,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            start_offset: 0,
            start_line: 1,
            start_column: 1,
            indent_stack: vec![0],
            pending: VecDeque::new(),
            at_line_start: true,
            paren_depth: 0,
            line_had_tokens: false,
            finished: false,
        }
    }

    /// Get current position
    pub fn position(&self) -> Position {
        Position::with_offset(self.line, self.column, self.offset)
    }

    fn start_position(&self) -> Position {
        Position::with_offset(self.start_line, self.start_column, self.start_offset)
    }

    fn span(&self) -> Span {
        Span::new(self.start_position(), self.position())
    }

    fn advance(&mut self) -> Option<char> {
        match self.chars.next() {
            Some('\n') => {
                self.offset += 1;
                self.line += 1;
                self.column = 1;
                Some('\n')
            }
            Some(c) => {
                self.offset += c.len_utf8();
                self.column += 1;
                Some(c)
            }
            None => None,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.span())
    }

    /// Zero-width token at the current position (synthetic tokens)
    fn make_marker(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.position(), self.position()))
    }

    /// Generate the next token
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            if self.at_line_start && self.paren_depth == 0 {
                self.measure_indent()?;
                continue;
            }

            self.skip_inline_space();

            self.start_offset = self.offset;
            self.start_line = self.line;
            self.start_column = self.column;

            let c = match self.advance() {
                Some(c) => c,
                None => return Ok(self.finish()),
            };

            match c {
                '\n' => {
                    // Inside parentheses a line break is plain whitespace
                    if self.paren_depth > 0 {
                        continue;
                    }
                    self.at_line_start = true;
                    self.line_had_tokens = false;
                    return Ok(self.make_token(TokenKind::Newline));
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                c if c == '_' || unicode_ident::is_xid_start(c) => {
                    self.line_had_tokens = true;
                    return Ok(self.scan_identifier(c));
                }
                c if c.is_ascii_digit() => {
                    self.line_had_tokens = true;
                    return self.scan_number(c);
                }
                '\'' => {
                    self.line_had_tokens = true;
                    return self.scan_string();
                }
                _ => {
                    self.line_had_tokens = true;
                    return self.scan_operator(c);
                }
            }
        }
    }

    /// End-of-file: close the last logical line, then unwind the indent stack
    fn finish(&mut self) -> Token {
        if !self.finished {
            self.finished = true;
            if self.line_had_tokens {
                self.pending.push_back(self.make_marker(TokenKind::Newline));
            }
            while self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                self.pending.push_back(self.make_marker(TokenKind::Dedent));
            }
            self.pending.push_back(self.make_marker(TokenKind::Eof));
        }
        self.pending
            .pop_front()
            .unwrap_or_else(|| self.make_marker(TokenKind::Eof))
    }

    fn skip_inline_space(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Measure the leading whitespace of the next logical line and queue
    /// Indent/Dedent tokens. Blank and comment-only lines are skipped.
    fn measure_indent(&mut self) -> Result<(), LexError> {
        loop {
            let mut width = 0usize;
            while let Some(c) = self.peek() {
                match c {
                    ' ' => width += 1,
                    '\t' => width = width / TAB_WIDTH * TAB_WIDTH + TAB_WIDTH,
                    '\r' => {}
                    _ => break,
                }
                self.advance();
            }
            match self.peek() {
                // Blank line: not a statement, try the next one
                Some('\n') => {
                    self.advance();
                    continue;
                }
                // Comment-only line
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                // Trailing whitespace before EOF; finish() unwinds the stack
                None => {
                    self.at_line_start = false;
                    return Ok(());
                }
                Some(_) => {
                    let top = *self.indent_stack.last().unwrap_or(&0);
                    if width > top {
                        self.indent_stack.push(width);
                        self.pending.push_back(self.make_marker(TokenKind::Indent));
                    } else if width < top {
                        while self
                            .indent_stack
                            .last()
                            .is_some_and(|&level| level > width)
                        {
                            self.indent_stack.pop();
                            self.pending.push_back(self.make_marker(TokenKind::Dedent));
                        }
                        if *self.indent_stack.last().unwrap_or(&0) != width {
                            return Err(LexError::InconsistentIndent {
                                position: self.position(),
                            });
                        }
                    }
                    self.at_line_start = false;
                    return Ok(());
                }
            }
        }
    }

    fn scan_identifier(&mut self, first_char: char) -> Token {
        let mut value = String::new();
        value.push(first_char);
        while let Some(c) = self.peek() {
            if c == '_' || unicode_ident::is_xid_continue(c) {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match KEYWORDS.get(value.as_str()) {
            Some(kind) => self.make_token(kind.clone()),
            None => self.make_token(TokenKind::Identifier(value)),
        }
    }

    /// Unsigned number: digits, optional fraction, optional exponent.
    /// Signs are separate tokens handled by the expression parser.
    fn scan_number(&mut self, first_char: char) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first_char);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            // A dot only belongs to the number when not starting an
            // attribute access like `1.connect` (no such syntax, but the
            // next char must be a digit for a fraction)
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                text.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let sign = lookahead.peek().copied();
            let exponent_follows = match sign {
                Some('+') | Some('-') => {
                    lookahead.next();
                    lookahead.peek().is_some_and(|c| c.is_ascii_digit())
                }
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                text.push(self.advance().unwrap_or('e'));
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.advance().unwrap_or('+'));
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }
        match text.parse::<f64>() {
            Ok(value) => Ok(self.make_token(TokenKind::Number(value))),
            Err(_) => Err(LexError::InvalidNumber {
                text,
                position: self.start_position(),
            }),
        }
    }

    fn scan_string(&mut self) -> Result<Token, LexError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\'') => return Ok(self.make_token(TokenKind::Str(value))),
                Some('\n') | None => {
                    return Err(LexError::UnterminatedString {
                        position: self.start_position(),
                    })
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// Multi-character operators are matched greedily before their
    /// single-character prefixes.
    fn scan_operator(&mut self, c: char) -> Result<Token, LexError> {
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '$' => TokenKind::Dollar,
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::ColonAssign
                } else {
                    TokenKind::Colon
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Neq
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch: '!',
                        position: self.start_position(),
                    });
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RParen
            }
            ch => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    position: self.start_position(),
                })
            }
        };
        Ok(self.make_token(kind))
    }
}
